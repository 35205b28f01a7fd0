use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub run: RunConfig,
    pub data: DataConfig,
    pub paths: PathsConfig,
    pub report: Option<ReportConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub symbols: Vec<String>,
    /// Inclusive start date, YYYY-MM-DD.
    pub start: String,
    /// Inclusive end date, YYYY-MM-DD; today when omitted.
    pub end: Option<String>,
    /// One of: technical, momentum, mean_reversion, hold. Unknown names
    /// fall back to hold at run time.
    pub strategy: String,
    pub initial_capital: f64,
    /// Fraction of capital committed per trade, in percent.
    pub position_size_percent: f64,
    pub max_holding_bars: Option<usize>,
    pub confidence_threshold: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    /// Directory of per-symbol OHLCV CSV files.
    pub history_dir: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    pub out_dir: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    pub text: Option<bool>,
}

/// Load a config file, returning the parsed config together with the raw
/// TOML (kept verbatim for the snapshot hash in the report meta).
pub fn load_config(path: &Path) -> Result<(Config, String), String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    let config = parse_config(&raw)
        .map_err(|err| format!("failed to parse config {}: {}", path.display(), err))?;
    Ok((config, raw))
}

pub fn parse_config(raw: &str) -> Result<Config, String> {
    toml::from_str(raw).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::parse_config;

    const SAMPLE: &str = r#"
[run]
symbols = ["AAPL", "MSFT"]
start = "2024-01-01"
end = "2025-01-01"
strategy = "technical"
initial_capital = 100000.0
position_size_percent = 10.0

[data]
history_dir = "data"

[paths]
out_dir = "runs"
"#;

    #[test]
    fn parses_a_minimal_config() {
        let config = parse_config(SAMPLE).expect("valid config");
        assert_eq!(config.run.symbols.len(), 2);
        assert_eq!(config.run.strategy, "technical");
        assert!(config.run.max_holding_bars.is_none());
        assert!(config.report.is_none());
    }

    #[test]
    fn rejects_unknown_fields() {
        let raw = format!("{SAMPLE}\n[surprise]\nvalue = 1\n");
        assert!(parse_config(&raw).is_err());
    }

    #[test]
    fn optional_overrides_are_read() {
        let raw = SAMPLE.replace(
            "position_size_percent = 10.0",
            "position_size_percent = 5.0\nmax_holding_bars = 10\nconfidence_threshold = 0.7",
        );
        let config = parse_config(&raw).expect("valid config");
        assert_eq!(config.run.max_holding_bars, Some(10));
        assert_eq!(config.run.confidence_threshold, Some(0.7));
    }
}
