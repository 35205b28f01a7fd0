use serde::{Deserialize, Serialize};

/// Directional reading of a single indicator or of the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl Signal {
    /// Numeric value used by category scoring.
    pub fn score(self) -> f64 {
        match self {
            Signal::StrongBuy => 100.0,
            Signal::Buy => 75.0,
            Signal::Hold => 50.0,
            Signal::Sell => 25.0,
            Signal::StrongSell => 0.0,
        }
    }

    /// Inverse of `score` over the 0-100 band, bucketed at 80/60/40/20.
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Signal::StrongBuy
        } else if score >= 60.0 {
            Signal::Buy
        } else if score >= 40.0 {
            Signal::Hold
        } else if score >= 20.0 {
            Signal::Sell
        } else {
            Signal::StrongSell
        }
    }

    pub fn is_bullish(self) -> bool {
        matches!(self, Signal::Buy | Signal::StrongBuy)
    }

    pub fn is_bearish(self) -> bool {
        matches!(self, Signal::Sell | Signal::StrongSell)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Signal::StrongBuy => "strong_buy",
            Signal::Buy => "buy",
            Signal::Hold => "hold",
            Signal::Sell => "sell",
            Signal::StrongSell => "strong_sell",
        }
    }
}

/// One indicator's reading at a point in time. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TechnicalSignal {
    pub indicator: String,
    pub value: f64,
    pub signal: Signal,
    /// Weight in [0, 1] used by category scoring.
    pub strength: f64,
    pub description: String,
}

impl TechnicalSignal {
    pub fn new(
        indicator: &str,
        value: f64,
        signal: Signal,
        strength: f64,
        description: String,
    ) -> Self {
        Self {
            indicator: indicator.to_string(),
            value,
            signal,
            strength,
            description,
        }
    }
}
