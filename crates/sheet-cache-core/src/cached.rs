//! Cached range metadata

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::range::CellRange;
use crate::store::CachedRangeRecord;

/// A [`CellRange`] known to be persisted in a store, with its provenance.
///
/// Never mutated in place; a changed range is a new `CachedRange`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CachedRange {
    /// The cells this entry covers
    pub range: CellRange,
    /// Spreadsheet the range belongs to
    pub spreadsheet_id: String,
    /// Sheet (tab) the range belongs to
    pub sheet_name: String,
    /// When the range was fetched and persisted
    pub cached_at: DateTime<Utc>,
    /// Store-assigned key, absent until persisted
    pub range_id: Option<i64>,
}

impl CachedRange {
    /// Create a new cached range entry
    pub fn new<S: Into<String>, N: Into<String>>(
        range: CellRange,
        spreadsheet_id: S,
        sheet_name: N,
        cached_at: DateTime<Utc>,
        range_id: Option<i64>,
    ) -> Self {
        Self {
            range,
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
            cached_at,
            range_id,
        }
    }

    /// Rebuild an entry from a store record.
    ///
    /// Fails with [`Error::InvalidRange`](crate::Error::InvalidRange) if the
    /// persisted bounds are not a valid range.
    pub fn from_record(
        spreadsheet_id: &str,
        sheet_name: &str,
        record: &CachedRangeRecord,
    ) -> Result<Self> {
        let range = CellRange::new(
            record.start_row,
            record.start_col,
            record.end_row,
            record.end_col,
        )?;
        Ok(Self::new(
            range,
            spreadsheet_id,
            sheet_name,
            record.cached_at,
            Some(record.range_id),
        ))
    }
}
