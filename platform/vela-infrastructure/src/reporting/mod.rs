use chrono::{TimeZone, Utc};
use std::fs;
use std::io::Write;
use std::path::Path;
use vela_domain::value_objects::trade::{BacktestTrade, Direction};

pub fn write_trades_csv(path: &Path, trades: &[BacktestTrade]) -> Result<(), String> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create trades csv {}: {}", path.display(), err))?;
    wtr.write_record([
        "symbol",
        "entry_date",
        "entry_price",
        "exit_date",
        "exit_price",
        "direction",
        "target_price",
        "stop_loss",
        "confidence",
        "return_percent",
        "profit_loss",
        "hit_target",
        "hit_stop_loss",
        "holding_days",
    ])
    .map_err(|err| format!("failed to write trades csv header: {}", err))?;

    for trade in trades {
        let direction = match trade.direction {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        };
        wtr.write_record([
            trade.symbol.clone(),
            format_date(trade.entry_timestamp),
            trade.entry_price.to_string(),
            trade
                .exit_timestamp
                .map(format_date)
                .unwrap_or_default(),
            trade
                .exit_price
                .map(|price| price.to_string())
                .unwrap_or_default(),
            direction.to_string(),
            trade.target_price.to_string(),
            trade.stop_loss.to_string(),
            trade.confidence.to_string(),
            trade.return_percent.to_string(),
            trade.profit_loss.to_string(),
            trade.hit_target.to_string(),
            trade.hit_stop_loss.to_string(),
            trade.holding_days().to_string(),
        ])
        .map_err(|err| format!("failed to write trades row: {}", err))?;
    }

    wtr.flush()
        .map_err(|err| format!("failed to flush trades csv: {}", err))
}

pub fn write_summary_json(path: &Path, summary: &serde_json::Value) -> Result<(), String> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|err| format!("failed to serialize summary: {}", err))?;
    let mut file =
        fs::File::create(path).map_err(|err| format!("failed to create summary: {}", err))?;
    file.write_all(json.as_bytes())
        .map_err(|err| format!("failed to write summary: {}", err))
}

pub fn write_summary_text(path: &Path, text: &str) -> Result<(), String> {
    fs::write(path, text)
        .map_err(|err| format!("failed to write summary text {}: {}", path.display(), err))
}

fn format_date(timestamp: i64) -> String {
    match Utc.timestamp_opt(timestamp, 0) {
        chrono::LocalResult::Single(datetime) => datetime.format("%Y-%m-%d").to_string(),
        _ => timestamp.to_string(),
    }
}
