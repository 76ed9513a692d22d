//! In-process store
//!
//! Same semantics as the SQLite store, kept in a mutex-guarded map. Useful
//! for tests and for callers that only want a per-process cache.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use sheet_cache_core::{
    CachedRange, CachedRangeRecord, CellRange, CellValue, RangeOptimizer, Result, SheetData,
    Store,
};

#[derive(Debug)]
struct StoredRange {
    id: i64,
    spreadsheet_id: String,
    sheet_name: String,
    range: CellRange,
    cached_at: DateTime<Utc>,
    cells: BTreeMap<(u32, u32), CellValue>,
}

impl StoredRange {
    fn is_on(&self, spreadsheet_id: &str, sheet_name: &str) -> bool {
        self.spreadsheet_id == spreadsheet_id && self.sheet_name == sheet_name
    }

    fn record(&self) -> CachedRangeRecord {
        CachedRangeRecord {
            range_id: self.id,
            start_row: self.range.start_row(),
            start_col: self.range.start_col(),
            end_row: self.range.end_row(),
            end_col: self.range.end_col(),
            cached_at: self.cached_at,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    spreadsheets: BTreeSet<String>,
    // insertion order is cache order, oldest first
    ranges: Vec<StoredRange>,
}

/// A [`Store`] that keeps everything in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a spreadsheet so its ranges are not considered orphaned
    pub fn register_spreadsheet(&self, spreadsheet_id: &str) {
        self.lock().spreadsheets.insert(spreadsheet_id.to_string());
    }

    /// Delete a spreadsheet together with all of its ranges
    pub fn delete_spreadsheet(&self, spreadsheet_id: &str) -> bool {
        let mut inner = self.lock();
        inner.ranges.retain(|r| r.spreadsheet_id != spreadsheet_id);
        inner.spreadsheets.remove(spreadsheet_id)
    }

    /// Forget a spreadsheet but keep its ranges, leaving them orphaned
    pub fn forget_spreadsheet(&self, spreadsheet_id: &str) -> bool {
        self.lock().spreadsheets.remove(spreadsheet_id)
    }

    /// Total number of cached ranges across all sheets
    pub fn range_count(&self) -> usize {
        self.lock().ranges.len()
    }
}

impl Store for MemoryStore {
    fn get_cached_ranges(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Result<Vec<CachedRangeRecord>> {
        Ok(self
            .lock()
            .ranges
            .iter()
            .filter(|r| r.is_on(spreadsheet_id, sheet_name))
            .map(StoredRange::record)
            .collect())
    }

    fn get_sheet_data_from_cache(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        range: &CellRange,
    ) -> Result<Option<SheetData>> {
        let inner = self.lock();
        let on_sheet: Vec<&StoredRange> = inner
            .ranges
            .iter()
            .filter(|r| r.is_on(spreadsheet_id, sheet_name))
            .collect();

        let cached: Vec<CachedRange> = on_sheet
            .iter()
            .map(|r| CachedRange::new(r.range, spreadsheet_id, sheet_name, r.cached_at, Some(r.id)))
            .collect();
        if !RangeOptimizer::can_satisfy_from_cache(range, &cached) {
            return Ok(None);
        }

        let mut result = range.empty_matrix()?;

        for stored in on_sheet {
            let Some(overlap) = range.intersection(&stored.range) else {
                continue;
            };
            for row in overlap.start_row()..=overlap.end_row() {
                for col in overlap.start_col()..=overlap.end_col() {
                    if let Some((r, c)) = range.offset_of(row, col) {
                        result[r][c] = stored.cells.get(&(row, col)).cloned().unwrap_or_default();
                    }
                }
            }
        }

        Ok(Some(result))
    }

    fn store_sheet_data_range(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        range: &CellRange,
        data: &SheetData,
    ) -> Result<i64> {
        let mut inner = self.lock();
        inner.spreadsheets.insert(spreadsheet_id.to_string());
        inner
            .ranges
            .retain(|r| !(r.is_on(spreadsheet_id, sheet_name) && r.range == *range));

        let mut cells = BTreeMap::new();
        for (r, row) in data.iter().take(range.row_count() as usize).enumerate() {
            for (c, value) in row.iter().take(range.col_count() as usize).enumerate() {
                cells.insert(
                    (range.start_row() + r as u32, range.start_col() + c as u32),
                    value.clone(),
                );
            }
        }

        inner.next_id += 1;
        let id = inner.next_id;
        inner.ranges.push(StoredRange {
            id,
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_name: sheet_name.to_string(),
            range: *range,
            cached_at: Utc::now(),
            cells,
        });
        Ok(id)
    }

    fn invalidate_sheet_data_cache(
        &self,
        spreadsheet_id: &str,
        sheet_name: Option<&str>,
    ) -> Result<bool> {
        self.lock().ranges.retain(|r| match sheet_name {
            Some(sheet) => !r.is_on(spreadsheet_id, sheet),
            None => r.spreadsheet_id != spreadsheet_id,
        });
        Ok(true)
    }

    fn detect_incomplete_ranges(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<Vec<i64>> {
        Ok(self
            .lock()
            .ranges
            .iter()
            .filter(|r| r.is_on(spreadsheet_id, sheet_name) && r.cells.is_empty())
            .map(|r| r.id)
            .collect())
    }

    fn delete_range_data(&self, range_id: i64) -> Result<()> {
        self.lock().ranges.retain(|r| r.id != range_id);
        Ok(())
    }

    fn clean_orphaned_ranges(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<usize> {
        let mut inner = self.lock();
        if inner.spreadsheets.contains(spreadsheet_id) {
            return Ok(0);
        }
        let before = inner.ranges.len();
        inner.ranges.retain(|r| !r.is_on(spreadsheet_id, sheet_name));
        Ok(before - inner.ranges.len())
    }
}
