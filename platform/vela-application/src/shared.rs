use chrono::{NaiveDate, Utc};
use sha2::{Digest, Sha256};

/// Parse a YYYY-MM-DD date into epoch seconds at midnight UTC.
pub fn parse_date(raw: &str) -> Result<i64, String> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("invalid date {raw:?} (expected YYYY-MM-DD): {err}"))?;
    let datetime = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("invalid date {raw:?}"))?;
    Ok(datetime.and_utc().timestamp())
}

/// Midnight UTC of the current day. Used only to default an omitted end
/// date before the simulation starts; the engine itself never reads the
/// clock.
pub fn today_epoch() -> i64 {
    let today = Utc::now().date_naive();
    today
        .and_hms_opt(0, 0, 0)
        .map(|datetime| datetime.and_utc().timestamp())
        .unwrap_or_default()
}

/// Hex SHA-256 of the raw config snapshot, recorded in the report meta so
/// runs can be traced back to their exact inputs.
pub fn config_sha256(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
