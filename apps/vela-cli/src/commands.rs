use std::path::PathBuf;
use tracing::info;
use vela_application::backtesting::{resolve_period, run_backtest};
use vela_application::config::load_config;
use vela_application::reporting::{summary_json, write_outputs};
use vela_domain::repositories::market_data::{HistoryProvider, HistoryQuery};
use vela_domain::services::analysis::TechnicalAnalyzer;
use vela_infrastructure::artifacts::FilesystemArtifactWriter;
use vela_infrastructure::market_data::CsvHistoryProvider;

pub fn backtest(config_path: PathBuf, out: Option<PathBuf>, json: bool) -> Result<(), String> {
    let (config, config_toml) = load_config(&config_path)?;
    let provider = CsvHistoryProvider::new(&config.data.history_dir);
    let result = run_backtest(&config, &provider)?;

    let artifacts = FilesystemArtifactWriter::new();
    let out_dir = write_outputs(&config, &config_toml, out, &result, &artifacts)?;
    info!(out_dir = %out_dir.display(), trades = result.total_trades, "backtest complete");

    if json {
        let summary = summary_json(&config, &config_toml, &result);
        let rendered = serde_json::to_string_pretty(&summary)
            .map_err(|err| format!("failed to serialize summary: {err}"))?;
        println!("{rendered}");
    } else {
        println!("{}", result.summary_text());
    }
    Ok(())
}

pub fn analyze(config_path: PathBuf, symbol: String, json: bool) -> Result<(), String> {
    let (config, _) = load_config(&config_path)?;
    let (start, end) = resolve_period(&config)?;
    let provider = CsvHistoryProvider::new(&config.data.history_dir);

    let bars = provider
        .get_history(&HistoryQuery {
            symbol: symbol.clone(),
            start,
            end,
        })?
        .ok_or_else(|| format!("no history for {symbol}"))?;

    let analyzer = TechnicalAnalyzer::new();
    let result = analyzer.analyze(&bars, &symbol);

    if json {
        let rendered = serde_json::to_string_pretty(&result.to_flat_json())
            .map_err(|err| format!("failed to serialize analysis: {err}"))?;
        println!("{rendered}");
        return Ok(());
    }

    println!(
        "{} @ {:.2}  score {:.1} ({})  confidence {:.2}",
        result.symbol,
        result.current_price,
        result.overall_score,
        result.overall_signal.as_str(),
        result.confidence
    );
    println!(
        "trend {:.1} | momentum {:.1} | volatility {:.1} | volume {:.1}",
        result.trend_score, result.momentum_score, result.volatility_score, result.volume_score
    );
    for signal in &result.signals {
        println!(
            "  {:<16} {:<12} {:.2}  {}",
            signal.indicator,
            signal.signal.as_str(),
            signal.strength,
            signal.description
        );
    }
    if !result.support_levels.is_empty() || !result.resistance_levels.is_empty() {
        println!(
            "support: {:?}  resistance: {:?}  pivot: {:.2}",
            result.support_levels, result.resistance_levels, result.pivot_point
        );
    }
    if !result.patterns_detected.is_empty() {
        println!("patterns: {}", result.patterns_detected.join(", "));
    }
    Ok(())
}
