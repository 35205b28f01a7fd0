//! File-backed history provider: one `<SYMBOL>.csv` per symbol in a data
//! directory, header `timestamp,open,high,low,close,volume`. Timestamps
//! are epoch seconds or YYYY-MM-DD dates.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;
use vela_domain::repositories::market_data::{HistoryProvider, HistoryQuery};
use vela_domain::value_objects::bar::Bar;

pub struct CsvHistoryProvider {
    history_dir: PathBuf,
}

impl CsvHistoryProvider {
    pub fn new(history_dir: impl Into<PathBuf>) -> Self {
        Self {
            history_dir: history_dir.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CsvBar {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

fn parse_timestamp(raw: &str) -> Result<i64, String> {
    let raw = raw.trim();
    if let Ok(epoch) = raw.parse::<i64>() {
        return Ok(epoch);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|err| format!("invalid timestamp {raw:?}: {err}"))?;
    date.and_hms_opt(0, 0, 0)
        .map(|datetime| datetime.and_utc().timestamp())
        .ok_or_else(|| format!("invalid timestamp {raw:?}"))
}

impl HistoryProvider for CsvHistoryProvider {
    fn get_history(&self, query: &HistoryQuery) -> Result<Option<Vec<Bar>>, String> {
        let path = self.history_dir.join(format!("{}.csv", query.symbol));
        if !path.exists() {
            debug!(symbol = %query.symbol, path = %path.display(), "no history file");
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(&path)
            .map_err(|err| format!("failed to open history {}: {}", path.display(), err))?;
        let mut bars = Vec::new();
        for record in reader.deserialize::<CsvBar>() {
            let record = record
                .map_err(|err| format!("bad history row in {}: {}", path.display(), err))?;
            let timestamp = parse_timestamp(&record.timestamp)?;
            if timestamp < query.start || timestamp > query.end {
                continue;
            }
            bars.push(Bar {
                symbol: query.symbol.clone(),
                timestamp,
                open: record.open,
                high: record.high,
                low: record.low,
                close: record.close,
                volume: record.volume,
            });
        }
        bars.sort_by_key(|bar| bar.timestamp);

        if bars.is_empty() {
            return Ok(None);
        }
        Ok(Some(bars))
    }
}
