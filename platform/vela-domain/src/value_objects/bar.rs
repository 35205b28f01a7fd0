use serde::{Deserialize, Serialize};

/// One OHLCV observation. Bars for a symbol form an ordered sequence
/// (ascending timestamp, gaps allowed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}
