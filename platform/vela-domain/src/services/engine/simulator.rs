//! Per-symbol trade simulation: a FLAT -> IN_POSITION -> FLAT state
//! machine driven by a strategy decision per bar. Deterministic: no
//! clock, randomness or I/O in the loop.

use crate::services::indicators::IndicatorSet;
use crate::services::strategy::{Strategy, StrategyKind};
use crate::value_objects::action::ActionType;
use crate::value_objects::bar::Bar;
use crate::value_objects::trade::{BacktestTrade, Direction};

/// Bars consumed before the first strategy evaluation; covers the warm-up
/// of the slowest indicator the strategies read (SMA 50).
pub const WARMUP_BARS: usize = 50;

#[derive(Debug, Clone)]
pub struct SimulatorParams {
    /// Currency committed per trade; P&L scales from it.
    pub position_size: f64,
    /// Entries require strictly greater strategy confidence.
    pub confidence_threshold: f64,
    /// Forced-exit horizon, counted in bars held.
    pub max_holding_bars: usize,
}

impl Default for SimulatorParams {
    fn default() -> Self {
        Self {
            position_size: 10_000.0,
            confidence_threshold: 0.6,
            max_holding_bars: 30,
        }
    }
}

struct OpenPosition {
    trade: BacktestTrade,
    entry_index: usize,
}

/// Simulate one symbol over its bar series. Series shorter than the
/// warm-up produce no trades. A position still open when the series ends
/// is discarded rather than force-closed.
pub fn simulate_symbol(
    bars: &[Bar],
    strategy: &StrategyKind,
    params: &SimulatorParams,
) -> Vec<BacktestTrade> {
    let mut trades = Vec::new();
    if bars.len() < WARMUP_BARS {
        return trades;
    }
    let indicators = IndicatorSet::compute(bars);
    let mut open: Option<OpenPosition> = None;

    for index in WARMUP_BARS..bars.len() {
        let bar = &bars[index];
        let price = bar.close;

        match open.take() {
            None => {
                let decision = strategy.decide(bars, &indicators, index);
                if decision.action == ActionType::Buy
                    && decision.confidence > params.confidence_threshold
                {
                    // ATR undefined at entry: 2% of price stands in.
                    let atr = indicators.atr_14[index].unwrap_or(price * 0.02);
                    open = Some(OpenPosition {
                        trade: BacktestTrade {
                            symbol: bar.symbol.clone(),
                            entry_timestamp: bar.timestamp,
                            entry_price: price,
                            exit_timestamp: None,
                            exit_price: None,
                            direction: Direction::Long,
                            target_price: price + 2.0 * atr,
                            stop_loss: price - 1.5 * atr,
                            confidence: decision.confidence,
                            technical_score: decision.confidence,
                            return_percent: 0.0,
                            profit_loss: 0.0,
                            hit_target: false,
                            hit_stop_loss: false,
                        },
                        entry_index: index,
                    });
                }
            }
            Some(mut position) => {
                // Exit conditions in fixed priority; only the first match
                // applies on a given bar.
                let exit = if price >= position.trade.target_price {
                    position.trade.hit_target = true;
                    true
                } else if price <= position.trade.stop_loss {
                    position.trade.hit_stop_loss = true;
                    true
                } else if strategy.decide(bars, &indicators, index).action == ActionType::Sell {
                    true
                } else {
                    index - position.entry_index > params.max_holding_bars
                };

                if exit {
                    position.trade.exit_timestamp = Some(bar.timestamp);
                    position.trade.exit_price = Some(price);
                    position.trade.return_percent =
                        (price - position.trade.entry_price) / position.trade.entry_price * 100.0;
                    position.trade.profit_loss =
                        params.position_size * position.trade.return_percent / 100.0;
                    trades.push(position.trade);
                } else {
                    open = Some(position);
                }
            }
        }
    }

    trades
}
