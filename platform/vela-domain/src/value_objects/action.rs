use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Buy,
    Sell,
    Hold,
}

/// What a strategy wants to do on a given bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyDecision {
    pub action: ActionType,
    pub confidence: f64,
}

impl StrategyDecision {
    pub fn new(action: ActionType, confidence: f64) -> Self {
        Self { action, confidence }
    }

    pub fn hold() -> Self {
        Self {
            action: ActionType::Hold,
            confidence: 0.5,
        }
    }
}
