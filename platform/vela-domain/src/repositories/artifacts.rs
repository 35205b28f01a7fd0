use crate::value_objects::trade::BacktestTrade;
use std::path::Path;

/// Port for run artifacts (trades table, summary mapping, text summary).
pub trait ArtifactWriter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String>;
    fn write_trades_csv(&self, path: &Path, trades: &[BacktestTrade]) -> Result<(), String>;
    fn write_summary_json(&self, path: &Path, summary: &serde_json::Value) -> Result<(), String>;
    fn write_summary_text(&self, path: &Path, text: &str) -> Result<(), String>;
}
