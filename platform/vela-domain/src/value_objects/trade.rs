use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

/// One simulated position. Exit fields stay `None` while the position is
/// open; once closed the trade is appended to the result and never mutated
/// again.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestTrade {
    pub symbol: String,
    pub entry_timestamp: i64,
    pub entry_price: f64,
    pub exit_timestamp: Option<i64>,
    pub exit_price: Option<f64>,
    pub direction: Direction,
    pub target_price: f64,
    pub stop_loss: f64,
    /// Strategy confidence at entry.
    pub confidence: f64,
    pub technical_score: f64,
    pub return_percent: f64,
    pub profit_loss: f64,
    pub hit_target: bool,
    pub hit_stop_loss: bool,
}

impl BacktestTrade {
    pub fn is_profitable(&self) -> bool {
        self.return_percent > 0.0
    }

    pub fn holding_days(&self) -> i64 {
        match self.exit_timestamp {
            Some(exit) => (exit - self.entry_timestamp) / 86_400,
            None => 0,
        }
    }
}
