use crate::config::Config;
use crate::shared::config_sha256;
use serde_json::json;
use std::path::PathBuf;
use tracing::info_span;
use vela_domain::entities::metrics::BacktestResult;
use vela_domain::repositories::artifacts::ArtifactWriter;

/// Write the run artifacts: trades table, summary mapping and (unless
/// disabled) the fixed-format text summary. Returns the output directory.
pub fn write_outputs(
    config: &Config,
    config_toml: &str,
    out: Option<PathBuf>,
    result: &BacktestResult,
    artifacts: &dyn ArtifactWriter,
) -> Result<PathBuf, String> {
    let _span = info_span!("write_outputs").entered();

    let base_dir = out.unwrap_or_else(|| PathBuf::from(&config.paths.out_dir));
    artifacts.ensure_dir(&base_dir)?;

    artifacts.write_trades_csv(base_dir.join("trades.csv").as_path(), &result.trades)?;

    let summary = summary_json(config, config_toml, result);
    artifacts.write_summary_json(base_dir.join("summary.json").as_path(), &summary)?;

    let text_enabled = config
        .report
        .as_ref()
        .and_then(|report| report.text)
        .unwrap_or(true);
    if text_enabled {
        artifacts.write_summary_text(
            base_dir.join("summary.txt").as_path(),
            &result.summary_text(),
        )?;
    }

    Ok(base_dir)
}

/// The flat result mapping plus run meta (strategy and an exact config
/// snapshot hash).
pub fn summary_json(
    config: &Config,
    config_toml: &str,
    result: &BacktestResult,
) -> serde_json::Value {
    let mut value = result.to_flat_json();
    if let serde_json::Value::Object(map) = &mut value {
        map.insert(
            "meta".to_string(),
            json!({
                "strategy": config.run.strategy,
                "position_size_percent": config.run.position_size_percent,
                "config_sha256": config_sha256(config_toml),
            }),
        );
    }
    value
}
