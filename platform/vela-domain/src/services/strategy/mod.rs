//! Entry/exit strategies for the backtest simulator. Each strategy reads
//! only bars and indicator values at or before the decision index.

use crate::services::indicators::IndicatorSet;
use crate::value_objects::action::{ActionType, StrategyDecision};
use crate::value_objects::bar::Bar;

pub trait Strategy {
    fn name(&self) -> &'static str;

    /// Decide on the bar at `index` using the data available up to and
    /// including it.
    fn decide(&self, bars: &[Bar], indicators: &IndicatorSet, index: usize) -> StrategyDecision;
}

/// Majority vote across RSI, MACD-vs-signal and SMA alignment; ties hold.
#[derive(Debug, Default, Clone, Copy)]
pub struct TechnicalStrategy;

impl Strategy for TechnicalStrategy {
    fn name(&self) -> &'static str {
        "technical"
    }

    fn decide(&self, bars: &[Bar], indicators: &IndicatorSet, index: usize) -> StrategyDecision {
        let mut votes: Vec<(ActionType, f64)> = Vec::new();

        if let Some(rsi) = indicators.rsi_14[index] {
            if rsi < 30.0 {
                votes.push((ActionType::Buy, 0.8));
            } else if rsi > 70.0 {
                votes.push((ActionType::Sell, 0.8));
            } else {
                votes.push((ActionType::Hold, 0.5));
            }
        }

        if let (Some(macd), Some(signal)) =
            (indicators.macd.macd[index], indicators.macd.signal[index])
        {
            if macd > signal {
                votes.push((ActionType::Buy, 0.7));
            } else {
                votes.push((ActionType::Sell, 0.7));
            }
        }

        if let (Some(sma_20), Some(sma_50)) =
            (indicators.sma_20[index], indicators.sma_50[index])
        {
            let price = bars[index].close;
            if price > sma_20 && sma_20 > sma_50 {
                votes.push((ActionType::Buy, 0.75));
            } else if price < sma_20 && sma_20 < sma_50 {
                votes.push((ActionType::Sell, 0.75));
            }
        }

        majority(&votes)
    }
}

fn majority(votes: &[(ActionType, f64)]) -> StrategyDecision {
    let buys: Vec<f64> = votes
        .iter()
        .filter(|(action, _)| *action == ActionType::Buy)
        .map(|(_, confidence)| *confidence)
        .collect();
    let sells: Vec<f64> = votes
        .iter()
        .filter(|(action, _)| *action == ActionType::Sell)
        .map(|(_, confidence)| *confidence)
        .collect();

    if buys.len() > sells.len() {
        StrategyDecision::new(ActionType::Buy, mean(&buys))
    } else if sells.len() > buys.len() {
        StrategyDecision::new(ActionType::Sell, mean(&sells))
    } else {
        StrategyDecision::hold()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Rate-of-change thresholds over trailing 10- and 20-bar spans.
#[derive(Debug, Default, Clone, Copy)]
pub struct MomentumStrategy;

impl Strategy for MomentumStrategy {
    fn name(&self) -> &'static str {
        "momentum"
    }

    fn decide(&self, bars: &[Bar], _indicators: &IndicatorSet, index: usize) -> StrategyDecision {
        if index + 1 < 20 {
            return StrategyDecision::hold();
        }
        let close = bars[index].close;
        let base_10 = bars[index - 9].close;
        let base_20 = bars[index - 19].close;
        if base_10 <= 0.0 || base_20 <= 0.0 {
            return StrategyDecision::hold();
        }
        let roc_10 = (close / base_10 - 1.0) * 100.0;
        let roc_20 = (close / base_20 - 1.0) * 100.0;

        if roc_10 > 5.0 && roc_20 > 10.0 {
            StrategyDecision::new(ActionType::Buy, 0.8)
        } else if roc_10 < -5.0 && roc_20 < -10.0 {
            StrategyDecision::new(ActionType::Sell, 0.8)
        } else if roc_10 > 2.0 {
            StrategyDecision::new(ActionType::Buy, 0.6)
        } else if roc_10 < -2.0 {
            StrategyDecision::new(ActionType::Sell, 0.6)
        } else {
            StrategyDecision::hold()
        }
    }
}

/// Bollinger-band position, betting on reversion to the middle band.
#[derive(Debug, Default, Clone, Copy)]
pub struct MeanReversionStrategy;

impl Strategy for MeanReversionStrategy {
    fn name(&self) -> &'static str {
        "mean_reversion"
    }

    fn decide(&self, bars: &[Bar], indicators: &IndicatorSet, index: usize) -> StrategyDecision {
        let (Some(upper), Some(middle), Some(lower)) = (
            indicators.bollinger.upper[index],
            indicators.bollinger.middle[index],
            indicators.bollinger.lower[index],
        ) else {
            return StrategyDecision::hold();
        };
        let price = bars[index].close;

        if price <= lower {
            StrategyDecision::new(ActionType::Buy, 0.85)
        } else if price >= upper {
            StrategyDecision::new(ActionType::Sell, 0.85)
        } else if price < middle {
            StrategyDecision::new(ActionType::Buy, 0.55)
        } else {
            StrategyDecision::hold()
        }
    }
}

/// Never trades. The fallback for unrecognized strategy names.
#[derive(Debug, Default, Clone, Copy)]
pub struct HoldStrategy;

impl Strategy for HoldStrategy {
    fn name(&self) -> &'static str {
        "hold"
    }

    fn decide(&self, _bars: &[Bar], _indicators: &IndicatorSet, _index: usize) -> StrategyDecision {
        StrategyDecision::hold()
    }
}

pub enum StrategyKind {
    Technical(TechnicalStrategy),
    Momentum(MomentumStrategy),
    MeanReversion(MeanReversionStrategy),
    Hold(HoldStrategy),
}

impl StrategyKind {
    /// Resolve a configured strategy name. Unknown names return `None`;
    /// the caller decides whether to fall back to `hold`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "technical" => Some(StrategyKind::Technical(TechnicalStrategy)),
            "momentum" => Some(StrategyKind::Momentum(MomentumStrategy)),
            "mean_reversion" => Some(StrategyKind::MeanReversion(MeanReversionStrategy)),
            "hold" => Some(StrategyKind::Hold(HoldStrategy)),
            _ => None,
        }
    }
}

impl Strategy for StrategyKind {
    fn name(&self) -> &'static str {
        match self {
            StrategyKind::Technical(strategy) => strategy.name(),
            StrategyKind::Momentum(strategy) => strategy.name(),
            StrategyKind::MeanReversion(strategy) => strategy.name(),
            StrategyKind::Hold(strategy) => strategy.name(),
        }
    }

    fn decide(&self, bars: &[Bar], indicators: &IndicatorSet, index: usize) -> StrategyDecision {
        match self {
            StrategyKind::Technical(strategy) => strategy.decide(bars, indicators, index),
            StrategyKind::Momentum(strategy) => strategy.decide(bars, indicators, index),
            StrategyKind::MeanReversion(strategy) => strategy.decide(bars, indicators, index),
            StrategyKind::Hold(strategy) => strategy.decide(bars, indicators, index),
        }
    }
}
