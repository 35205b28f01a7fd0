use crate::reporting;
use std::fs;
use std::path::Path;
use vela_domain::repositories::artifacts::ArtifactWriter;
use vela_domain::value_objects::trade::BacktestTrade;

#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemArtifactWriter;

impl FilesystemArtifactWriter {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactWriter for FilesystemArtifactWriter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String> {
        fs::create_dir_all(path)
            .map_err(|err| format!("failed to create dir {}: {}", path.display(), err))
    }

    fn write_trades_csv(&self, path: &Path, trades: &[BacktestTrade]) -> Result<(), String> {
        reporting::write_trades_csv(path, trades)
    }

    fn write_summary_json(&self, path: &Path, summary: &serde_json::Value) -> Result<(), String> {
        reporting::write_summary_json(path, summary)
    }

    fn write_summary_text(&self, path: &Path, text: &str) -> Result<(), String> {
        reporting::write_summary_text(path, text)
    }
}
