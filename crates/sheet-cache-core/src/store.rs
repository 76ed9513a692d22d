//! Persistent storage contract for cached ranges and their cells
//!
//! A [`Store`] owns all durable cache state. The cache orchestrator only
//! talks to it through the operations below, so any backend with the same
//! semantics can be substituted.

use chrono::{DateTime, Utc};

use crate::cell::SheetData;
use crate::error::Result;
use crate::range::CellRange;

/// A cached range as persisted by a store
///
/// Bounds are raw integers; they are validated when rebuilt into a
/// [`CachedRange`](crate::CachedRange).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CachedRangeRecord {
    /// Store-assigned surrogate key
    pub range_id: i64,
    /// First row (1-based)
    pub start_row: u32,
    /// First column (1-based)
    pub start_col: u32,
    /// Last row, inclusive
    pub end_row: u32,
    /// Last column, inclusive
    pub end_col: u32,
    /// When the range was stored
    pub cached_at: DateTime<Utc>,
}

/// Persistent CRUD for cached ranges and their cell contents
pub trait Store {
    /// All ranges cached for one sheet
    fn get_cached_ranges(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Result<Vec<CachedRangeRecord>>;

    /// Read a rectangle of cells.
    ///
    /// Returns `Ok(None)` when the rectangle is not fully covered by cached
    /// ranges. The matrix is shaped exactly like `range`.
    fn get_sheet_data_from_cache(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        range: &CellRange,
    ) -> Result<Option<SheetData>>;

    /// Persist the cells fetched for `range` and return the new range id.
    ///
    /// `data[0][0]` is the cell at `range`'s top-left corner. A range with the
    /// same coordinates on the same sheet is replaced.
    fn store_sheet_data_range(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        range: &CellRange,
        data: &SheetData,
    ) -> Result<i64>;

    /// Drop cached ranges for one sheet, or every sheet when `sheet_name` is `None`
    fn invalidate_sheet_data_cache(
        &self,
        spreadsheet_id: &str,
        sheet_name: Option<&str>,
    ) -> Result<bool>;

    /// Ranges that declare bounds but have no stored cells
    fn detect_incomplete_ranges(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<Vec<i64>>;

    /// Delete one range and its cells
    fn delete_range_data(&self, range_id: i64) -> Result<()>;

    /// Delete ranges whose spreadsheet is no longer known; returns how many were removed
    fn clean_orphaned_ranges(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<usize>;
}

impl<S: Store + ?Sized> Store for &S {
    fn get_cached_ranges(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Result<Vec<CachedRangeRecord>> {
        (**self).get_cached_ranges(spreadsheet_id, sheet_name)
    }

    fn get_sheet_data_from_cache(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        range: &CellRange,
    ) -> Result<Option<SheetData>> {
        (**self).get_sheet_data_from_cache(spreadsheet_id, sheet_name, range)
    }

    fn store_sheet_data_range(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        range: &CellRange,
        data: &SheetData,
    ) -> Result<i64> {
        (**self).store_sheet_data_range(spreadsheet_id, sheet_name, range, data)
    }

    fn invalidate_sheet_data_cache(
        &self,
        spreadsheet_id: &str,
        sheet_name: Option<&str>,
    ) -> Result<bool> {
        (**self).invalidate_sheet_data_cache(spreadsheet_id, sheet_name)
    }

    fn detect_incomplete_ranges(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<Vec<i64>> {
        (**self).detect_incomplete_ranges(spreadsheet_id, sheet_name)
    }

    fn delete_range_data(&self, range_id: i64) -> Result<()> {
        (**self).delete_range_data(range_id)
    }

    fn clean_orphaned_ranges(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<usize> {
        (**self).clean_orphaned_ranges(spreadsheet_id, sheet_name)
    }
}
