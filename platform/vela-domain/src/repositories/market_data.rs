use crate::value_objects::bar::Bar;

#[derive(Debug, Clone)]
pub struct HistoryQuery {
    pub symbol: String,
    /// Inclusive range bounds, epoch seconds UTC.
    pub start: i64,
    pub end: i64,
}

/// Port for historical OHLCV retrieval. `Ok(None)` (or an empty series)
/// means "no data for this symbol", which callers treat as insufficient
/// data rather than an error. Implementations must be `Sync`: one provider
/// is shared across per-symbol simulation tasks.
pub trait HistoryProvider: Sync {
    fn get_history(&self, query: &HistoryQuery) -> Result<Option<Vec<Bar>>, String>;
}
