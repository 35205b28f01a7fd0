use crate::config::Config;
use crate::shared::{parse_date, today_epoch};
use std::thread;
use std::time::Instant;
use tracing::{info_span, warn};
use vela_domain::entities::metrics::BacktestResult;
use vela_domain::repositories::market_data::{HistoryProvider, HistoryQuery};
use vela_domain::services::engine::{simulate_symbol, SimulatorParams};
use vela_domain::services::strategy::{HoldStrategy, Strategy, StrategyKind};
use vela_domain::value_objects::trade::BacktestTrade;

/// Resolve the configured date window; an omitted end date means today.
pub fn resolve_period(config: &Config) -> Result<(i64, i64), String> {
    let start = parse_date(&config.run.start)?;
    let end = match &config.run.end {
        Some(raw) => parse_date(raw)?,
        None => today_epoch(),
    };
    if end < start {
        return Err(format!("run.end ({end}) precedes run.start ({start})"));
    }
    Ok((start, end))
}

/// Run the configured backtest: fetch history and simulate each symbol on
/// its own task, then reduce into one result. A failing symbol is logged
/// and excluded; it never aborts the run.
pub fn run_backtest(
    config: &Config,
    provider: &dyn HistoryProvider,
) -> Result<BacktestResult, String> {
    let (start, end) = resolve_period(config)?;

    let strategy = resolve_strategy(&config.run.strategy);
    let _span = info_span!(
        "run_backtest",
        strategy = strategy.name(),
        symbols = config.run.symbols.len()
    )
    .entered();

    let params = SimulatorParams {
        position_size: config.run.initial_capital * config.run.position_size_percent / 100.0,
        confidence_threshold: config.run.confidence_threshold.unwrap_or(0.6),
        max_holding_bars: config.run.max_holding_bars.unwrap_or(30),
    };

    let stage_start = Instant::now();
    let per_symbol: Vec<Vec<BacktestTrade>> = thread::scope(|scope| {
        let handles: Vec<_> = config
            .run
            .symbols
            .iter()
            .map(|symbol| {
                let strategy = &strategy;
                let params = &params;
                scope.spawn(move || backtest_symbol(symbol, start, end, provider, strategy, params))
            })
            .collect();

        handles
            .into_iter()
            .zip(&config.run.symbols)
            .map(|(handle, symbol)| match handle.join() {
                Ok(Ok(trades)) => trades,
                Ok(Err(err)) => {
                    warn!(symbol = %symbol, error = %err, "symbol excluded from backtest");
                    Vec::new()
                }
                Err(_) => {
                    warn!(symbol = %symbol, "symbol simulation panicked; excluded");
                    Vec::new()
                }
            })
            .collect()
    });
    metrics::histogram!("vela.backtest.simulate_ms")
        .record(stage_start.elapsed().as_millis() as f64);

    // Reduce in configured symbol order so output is deterministic.
    let trades: Vec<BacktestTrade> = per_symbol.into_iter().flatten().collect();
    metrics::gauge!("vela.backtest.trades").set(trades.len() as f64);
    metrics::gauge!("vela.backtest.symbols").set(config.run.symbols.len() as f64);

    Ok(BacktestResult::from_trades(
        start,
        end,
        config.run.symbols.clone(),
        config.run.initial_capital,
        trades,
    ))
}

fn resolve_strategy(name: &str) -> StrategyKind {
    StrategyKind::parse(name).unwrap_or_else(|| {
        warn!(strategy = %name, "unknown strategy, falling back to hold");
        StrategyKind::Hold(HoldStrategy)
    })
}

fn backtest_symbol(
    symbol: &str,
    start: i64,
    end: i64,
    provider: &dyn HistoryProvider,
    strategy: &StrategyKind,
    params: &SimulatorParams,
) -> Result<Vec<BacktestTrade>, String> {
    let stage_start = Instant::now();
    let bars = provider.get_history(&HistoryQuery {
        symbol: symbol.to_string(),
        start,
        end,
    })?;
    metrics::histogram!("vela.backtest.load_history_ms")
        .record(stage_start.elapsed().as_millis() as f64);

    let Some(bars) = bars else {
        warn!(symbol = %symbol, "no history for symbol");
        return Ok(Vec::new());
    };
    if bars.is_empty() {
        warn!(symbol = %symbol, "empty history for symbol");
        return Ok(Vec::new());
    }

    let stage_start = Instant::now();
    let trades = simulate_symbol(&bars, strategy, params);
    metrics::histogram!("vela.backtest.simulate_symbol_ms")
        .record(stage_start.elapsed().as_millis() as f64);
    Ok(trades)
}
