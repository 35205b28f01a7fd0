//! Aggregate performance metrics over the closed trades of a run.

use crate::value_objects::trade::BacktestTrade;
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::collections::BTreeMap;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolPerformance {
    pub trades: usize,
    pub average_return: f64,
    /// Percent of trades with positive return.
    pub win_rate: f64,
    pub total_return: f64,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub start_timestamp: i64,
    pub end_timestamp: i64,
    pub symbols_tested: Vec<String>,
    pub initial_capital: f64,
    pub trades: Vec<BacktestTrade>,

    pub total_return_percent: f64,
    pub annualized_return_percent: f64,
    /// Percent of closed trades with positive return.
    pub win_rate: f64,
    pub average_return: f64,
    pub average_win: f64,
    pub average_loss: f64,

    pub max_drawdown_percent: f64,
    pub sharpe_ratio: f64,
    /// Gross profit over gross loss; infinite when trades exist but
    /// nothing lost, neutral 0 when there are no trades at all.
    pub profit_factor: f64,

    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,

    pub best_trade: Option<BacktestTrade>,
    pub worst_trade: Option<BacktestTrade>,
    pub performance_by_symbol: BTreeMap<String, SymbolPerformance>,
}

impl BacktestResult {
    /// A result with no trades and every metric at its neutral default.
    pub fn empty(
        start_timestamp: i64,
        end_timestamp: i64,
        symbols_tested: Vec<String>,
        initial_capital: f64,
    ) -> Self {
        Self {
            start_timestamp,
            end_timestamp,
            symbols_tested,
            initial_capital,
            trades: Vec::new(),
            total_return_percent: 0.0,
            annualized_return_percent: 0.0,
            win_rate: 0.0,
            average_return: 0.0,
            average_win: 0.0,
            average_loss: 0.0,
            max_drawdown_percent: 0.0,
            sharpe_ratio: 0.0,
            profit_factor: 0.0,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            best_trade: None,
            worst_trade: None,
            performance_by_symbol: BTreeMap::new(),
        }
    }

    pub fn from_trades(
        start_timestamp: i64,
        end_timestamp: i64,
        symbols_tested: Vec<String>,
        initial_capital: f64,
        trades: Vec<BacktestTrade>,
    ) -> Self {
        let mut result = Self::empty(
            start_timestamp,
            end_timestamp,
            symbols_tested,
            initial_capital,
        );
        if trades.is_empty() {
            return result;
        }
        result.trades = trades;
        result.compute_metrics();
        result
    }

    fn compute_metrics(&mut self) {
        self.total_trades = self.trades.len();
        self.winning_trades = self
            .trades
            .iter()
            .filter(|trade| trade.is_profitable())
            .count();
        self.losing_trades = self.total_trades - self.winning_trades;
        self.win_rate = self.winning_trades as f64 / self.total_trades as f64 * 100.0;

        let returns: Vec<f64> = self
            .trades
            .iter()
            .map(|trade| trade.return_percent)
            .collect();
        self.average_return = mean(&returns);
        self.total_return_percent = returns.iter().sum();

        let wins: Vec<f64> = self
            .trades
            .iter()
            .filter(|trade| trade.is_profitable())
            .map(|trade| trade.return_percent)
            .collect();
        let losses: Vec<f64> = self
            .trades
            .iter()
            .filter(|trade| !trade.is_profitable())
            .map(|trade| trade.return_percent)
            .collect();
        self.average_win = mean(&wins);
        self.average_loss = mean(&losses);

        let days = (self.end_timestamp - self.start_timestamp) as f64 / 86_400.0;
        let years = days / 365.0;
        if years > 0.0 {
            self.annualized_return_percent =
                ((1.0 + self.total_return_percent / 100.0).powf(1.0 / years) - 1.0) * 100.0;
        }

        let gross_profit: f64 = self
            .trades
            .iter()
            .filter(|trade| trade.is_profitable())
            .map(|trade| trade.profit_loss)
            .sum();
        let gross_loss: f64 = self
            .trades
            .iter()
            .filter(|trade| !trade.is_profitable())
            .map(|trade| trade.profit_loss)
            .sum::<f64>()
            .abs();
        self.profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else {
            f64::INFINITY
        };

        if returns.len() > 1 {
            let deviation = sample_stdev(&returns);
            if deviation > 0.0 {
                self.sharpe_ratio =
                    self.average_return / deviation * TRADING_DAYS_PER_YEAR.sqrt();
            }
        }

        self.max_drawdown_percent = max_drawdown(&self.trades);

        self.best_trade = self
            .trades
            .iter()
            .max_by(|a, b| a.return_percent.total_cmp(&b.return_percent))
            .cloned();
        self.worst_trade = self
            .trades
            .iter()
            .min_by(|a, b| a.return_percent.total_cmp(&b.return_percent))
            .cloned();

        let mut by_symbol: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for trade in &self.trades {
            by_symbol
                .entry(trade.symbol.clone())
                .or_default()
                .push(trade.return_percent);
        }
        self.performance_by_symbol = by_symbol
            .into_iter()
            .map(|(symbol, returns)| {
                let wins = returns.iter().filter(|r| **r > 0.0).count();
                let performance = SymbolPerformance {
                    trades: returns.len(),
                    average_return: mean(&returns),
                    win_rate: wins as f64 / returns.len() as f64 * 100.0,
                    total_return: returns.iter().sum(),
                };
                (symbol, performance)
            })
            .collect();
    }

    /// Flat key/value mapping for downstream reporting.
    pub fn to_flat_json(&self) -> serde_json::Value {
        json!({
            "start_date": format_date(self.start_timestamp),
            "end_date": format_date(self.end_timestamp),
            "symbols_tested": self.symbols_tested,
            "initial_capital": self.initial_capital,
            "total_return_percent": self.total_return_percent,
            "annualized_return_percent": self.annualized_return_percent,
            "win_rate": self.win_rate,
            "average_return": self.average_return,
            "max_drawdown_percent": self.max_drawdown_percent,
            "sharpe_ratio": self.sharpe_ratio,
            "total_trades": self.total_trades,
            "winning_trades": self.winning_trades,
            "losing_trades": self.losing_trades,
            "profit_factor": finite_or_null(self.profit_factor),
        })
    }

    /// Fixed-format human-readable summary. Label order is part of the
    /// output contract.
    pub fn summary_text(&self) -> String {
        let lines = [
            "=".repeat(50),
            "BACKTEST RESULTS".to_string(),
            "=".repeat(50),
            format!(
                "Period: {} to {}",
                format_date(self.start_timestamp),
                format_date(self.end_timestamp)
            ),
            format!("Symbols: {}", self.symbols_tested.len()),
            format!("Initial Capital: ${:.2}", self.initial_capital),
            String::new(),
            "PERFORMANCE".to_string(),
            "-".repeat(30),
            format!("Total Return: {:+.2}%", self.total_return_percent),
            format!("Annualized Return: {:+.2}%", self.annualized_return_percent),
            format!("Win Rate: {:.1}%", self.win_rate),
            format!("Average Return per Trade: {:+.2}%", self.average_return),
            String::new(),
            "RISK METRICS".to_string(),
            "-".repeat(30),
            format!("Max Drawdown: {:.2}%", self.max_drawdown_percent),
            format!("Sharpe Ratio: {:.2}", self.sharpe_ratio),
            format!("Profit Factor: {:.2}", self.profit_factor),
            String::new(),
            "TRADES".to_string(),
            "-".repeat(30),
            format!("Total Trades: {}", self.total_trades),
            format!(
                "Winning: {} | Losing: {}",
                self.winning_trades, self.losing_trades
            ),
            format!(
                "Avg Win: {:+.2}% | Avg Loss: {:.2}%",
                self.average_win, self.average_loss
            ),
            "=".repeat(50),
        ];
        lines.join("\n")
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values
        .iter()
        .map(|value| {
            let diff = value - avg;
            diff * diff
        })
        .sum::<f64>()
        / (values.len() as f64 - 1.0);
    variance.sqrt()
}

/// Largest peak-to-trough drop of the cumulative per-trade return curve,
/// taken in exit-chronological order.
fn max_drawdown(trades: &[BacktestTrade]) -> f64 {
    let mut ordered: Vec<(i64, f64)> = trades
        .iter()
        .map(|trade| {
            (
                trade.exit_timestamp.unwrap_or(trade.entry_timestamp),
                trade.return_percent,
            )
        })
        .collect();
    ordered.sort_by_key(|(timestamp, _)| *timestamp);

    let mut running = 0.0;
    let mut peak = f64::NEG_INFINITY;
    let mut max_drop = 0.0;
    for (_, return_percent) in ordered {
        running += return_percent;
        if running > peak {
            peak = running;
        }
        let drop = peak - running;
        if drop > max_drop {
            max_drop = drop;
        }
    }
    max_drop
}

fn format_date(timestamp: i64) -> String {
    match Utc.timestamp_opt(timestamp, 0) {
        chrono::LocalResult::Single(datetime) => datetime.format("%Y-%m-%d").to_string(),
        _ => timestamp.to_string(),
    }
}

fn finite_or_null(value: f64) -> serde_json::Value {
    if value.is_finite() {
        json!(value)
    } else {
        serde_json::Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::BacktestResult;
    use crate::value_objects::trade::{BacktestTrade, Direction};

    fn trade(symbol: &str, exit_day: i64, return_percent: f64) -> BacktestTrade {
        BacktestTrade {
            symbol: symbol.to_string(),
            entry_timestamp: (exit_day - 1) * 86_400,
            entry_price: 100.0,
            exit_timestamp: Some(exit_day * 86_400),
            exit_price: Some(100.0 * (1.0 + return_percent / 100.0)),
            direction: Direction::Long,
            target_price: 104.0,
            stop_loss: 97.0,
            confidence: 0.7,
            technical_score: 0.7,
            return_percent,
            profit_loss: 10_000.0 * return_percent / 100.0,
            hit_target: return_percent > 0.0,
            hit_stop_loss: false,
        }
    }

    const YEAR: i64 = 365 * 86_400;

    #[test]
    fn zero_trades_is_all_neutral() {
        let result =
            BacktestResult::from_trades(0, YEAR, vec!["AAPL".to_string()], 100_000.0, vec![]);
        assert_eq!(result.total_trades, 0);
        assert_eq!(result.win_rate, 0.0);
        assert_eq!(result.sharpe_ratio, 0.0);
        assert_eq!(result.profit_factor, 0.0);
        assert_eq!(result.max_drawdown_percent, 0.0);
        assert!(result.best_trade.is_none());
        assert!(result.performance_by_symbol.is_empty());
    }

    #[test]
    fn win_rate_and_averages() {
        let trades = vec![
            trade("AAPL", 1, 4.0),
            trade("AAPL", 2, -2.0),
            trade("MSFT", 3, 6.0),
            trade("MSFT", 4, -1.0),
        ];
        let result = BacktestResult::from_trades(
            0,
            YEAR,
            vec!["AAPL".to_string(), "MSFT".to_string()],
            100_000.0,
            trades,
        );
        assert_eq!(result.total_trades, 4);
        assert_eq!(result.winning_trades, 2);
        assert_eq!(result.losing_trades, 2);
        assert!((result.win_rate - 50.0).abs() < 1e-9);
        assert!((result.average_return - 1.75).abs() < 1e-9);
        assert!((result.average_win - 5.0).abs() < 1e-9);
        assert!((result.average_loss - (-1.5)).abs() < 1e-9);
        assert!((result.total_return_percent - 7.0).abs() < 1e-9);
        // One year span: annualized equals total.
        assert!((result.annualized_return_percent - 7.0).abs() < 1e-6);
    }

    #[test]
    fn profit_factor_ratio_and_unbounded_case() {
        let trades = vec![trade("AAPL", 1, 4.0), trade("AAPL", 2, -2.0)];
        let result =
            BacktestResult::from_trades(0, YEAR, vec!["AAPL".to_string()], 100_000.0, trades);
        assert!((result.profit_factor - 2.0).abs() < 1e-9);

        let winners_only = vec![trade("AAPL", 1, 4.0), trade("AAPL", 2, 1.0)];
        let result = BacktestResult::from_trades(
            0,
            YEAR,
            vec!["AAPL".to_string()],
            100_000.0,
            winners_only,
        );
        assert!(result.profit_factor.is_infinite());
    }

    #[test]
    fn sharpe_is_zero_for_a_single_trade_or_flat_returns() {
        let result = BacktestResult::from_trades(
            0,
            YEAR,
            vec!["AAPL".to_string()],
            100_000.0,
            vec![trade("AAPL", 1, 4.0)],
        );
        assert_eq!(result.sharpe_ratio, 0.0);

        let flat = vec![trade("AAPL", 1, 2.0), trade("AAPL", 2, 2.0)];
        let result =
            BacktestResult::from_trades(0, YEAR, vec!["AAPL".to_string()], 100_000.0, flat);
        assert_eq!(result.sharpe_ratio, 0.0);
    }

    #[test]
    fn sharpe_annualizes_with_sqrt_252() {
        let trades = vec![trade("AAPL", 1, 1.0), trade("AAPL", 2, 3.0)];
        let result =
            BacktestResult::from_trades(0, YEAR, vec!["AAPL".to_string()], 100_000.0, trades);
        // mean 2.0, sample stdev sqrt(2).
        let expected = 2.0 / 2.0f64.sqrt() * 252.0f64.sqrt();
        assert!((result.sharpe_ratio - expected).abs() < 1e-9);
    }

    #[test]
    fn drawdown_follows_exit_order_not_insertion_order() {
        // Inserted out of order on purpose; chronologically the curve is
        // +5, -3, -4, +10 -> peak 5, trough -2, drawdown 7.
        let trades = vec![
            trade("MSFT", 4, 10.0),
            trade("AAPL", 2, -3.0),
            trade("AAPL", 1, 5.0),
            trade("MSFT", 3, -4.0),
        ];
        let result = BacktestResult::from_trades(
            0,
            YEAR,
            vec!["AAPL".to_string(), "MSFT".to_string()],
            100_000.0,
            trades,
        );
        assert!((result.max_drawdown_percent - 7.0).abs() < 1e-9);
    }

    #[test]
    fn best_and_worst_trades() {
        let trades = vec![
            trade("AAPL", 1, 4.0),
            trade("AAPL", 2, -2.0),
            trade("MSFT", 3, 6.0),
        ];
        let result = BacktestResult::from_trades(
            0,
            YEAR,
            vec!["AAPL".to_string(), "MSFT".to_string()],
            100_000.0,
            trades,
        );
        assert_eq!(result.best_trade.as_ref().map(|t| t.return_percent), Some(6.0));
        assert_eq!(
            result.worst_trade.as_ref().map(|t| t.return_percent),
            Some(-2.0)
        );
    }

    #[test]
    fn per_symbol_breakdown() {
        let trades = vec![
            trade("AAPL", 1, 4.0),
            trade("AAPL", 2, -2.0),
            trade("MSFT", 3, 6.0),
        ];
        let result = BacktestResult::from_trades(
            0,
            YEAR,
            vec!["AAPL".to_string(), "MSFT".to_string()],
            100_000.0,
            trades,
        );
        let aapl = &result.performance_by_symbol["AAPL"];
        assert_eq!(aapl.trades, 2);
        assert!((aapl.average_return - 1.0).abs() < 1e-9);
        assert!((aapl.win_rate - 50.0).abs() < 1e-9);
        assert!((aapl.total_return - 2.0).abs() < 1e-9);
        let msft = &result.performance_by_symbol["MSFT"];
        assert_eq!(msft.trades, 1);
        assert!((msft.win_rate - 100.0).abs() < 1e-9);
    }

    #[test]
    fn flat_json_keeps_the_contract_fields() {
        let result =
            BacktestResult::from_trades(0, YEAR, vec!["AAPL".to_string()], 100_000.0, vec![]);
        let flat = result.to_flat_json();
        for key in [
            "start_date",
            "end_date",
            "symbols_tested",
            "initial_capital",
            "total_return_percent",
            "annualized_return_percent",
            "win_rate",
            "average_return",
            "max_drawdown_percent",
            "sharpe_ratio",
            "total_trades",
            "winning_trades",
            "losing_trades",
            "profit_factor",
        ] {
            assert!(flat.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(flat["start_date"], "1970-01-01");
    }

    #[test]
    fn unbounded_profit_factor_serializes_as_null() {
        let winners_only = vec![trade("AAPL", 1, 4.0)];
        let result = BacktestResult::from_trades(
            0,
            YEAR,
            vec!["AAPL".to_string()],
            100_000.0,
            winners_only,
        );
        assert!(result.to_flat_json()["profit_factor"].is_null());
    }

    #[test]
    fn summary_text_label_order() {
        let result =
            BacktestResult::from_trades(0, YEAR, vec!["AAPL".to_string()], 100_000.0, vec![]);
        let text = result.summary_text();
        let labels = [
            "BACKTEST RESULTS",
            "Period:",
            "Symbols:",
            "Initial Capital:",
            "PERFORMANCE",
            "Total Return:",
            "Annualized Return:",
            "Win Rate:",
            "Average Return per Trade:",
            "RISK METRICS",
            "Max Drawdown:",
            "Sharpe Ratio:",
            "Profit Factor:",
            "TRADES",
            "Total Trades:",
            "Winning:",
            "Avg Win:",
        ];
        let mut cursor = 0;
        for label in labels {
            let position = text[cursor..]
                .find(label)
                .unwrap_or_else(|| panic!("label {label} out of order"));
            cursor += position + label.len();
        }
    }
}
