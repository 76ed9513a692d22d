//! Tests for the read-through cache against an in-memory store

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;
use sheet_cache::prelude::*;
use sheet_cache::CachedRangeRecord;

const SPREADSHEET: &str = "spreadsheet-1";
const SHEET: &str = "Sheet1";

/// Answers from a fixed table of sheet-qualified ranges and records every call
#[derive(Default)]
struct ScriptedFetcher {
    responses: HashMap<String, SheetData>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedFetcher {
    fn new() -> Self {
        Self::default()
    }

    fn with(mut self, range: &str, data: SheetData) -> Self {
        self.responses.insert(range.to_string(), data);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch(
        &self,
        _spreadsheet_id: &str,
        range: &str,
    ) -> std::result::Result<SheetData, FetchError> {
        self.calls.borrow_mut().push(range.to_string());
        Ok(self.responses.get(range).cloned().unwrap_or_default())
    }
}

#[derive(Debug)]
struct TransportError;

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connection reset")
    }
}

impl std::error::Error for TransportError {}

/// A memory store that can fail, lose cells or report corrupt records
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_writes: bool,
    fail_reads: bool,
    /// Reads touching any of these come back as `None`
    unreadable: Vec<CellRange>,
    /// Extra records returned alongside the real ones
    bogus_records: Vec<CachedRangeRecord>,
}

impl Store for FlakyStore {
    fn get_cached_ranges(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Result<Vec<CachedRangeRecord>> {
        let mut records = self.inner.get_cached_ranges(spreadsheet_id, sheet_name)?;
        records.extend(self.bogus_records.iter().cloned());
        Ok(records)
    }

    fn get_sheet_data_from_cache(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        range: &CellRange,
    ) -> Result<Option<SheetData>> {
        if self.fail_reads {
            return Err(Error::store("cell table unreadable"));
        }
        if self.unreadable.iter().any(|lost| lost.overlaps_with(range)) {
            return Ok(None);
        }
        self.inner.get_sheet_data_from_cache(spreadsheet_id, sheet_name, range)
    }

    fn store_sheet_data_range(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        range: &CellRange,
        data: &SheetData,
    ) -> Result<i64> {
        if self.fail_writes {
            return Err(Error::store("disk full"));
        }
        self.inner.store_sheet_data_range(spreadsheet_id, sheet_name, range, data)
    }

    fn invalidate_sheet_data_cache(
        &self,
        spreadsheet_id: &str,
        sheet_name: Option<&str>,
    ) -> Result<bool> {
        self.inner.invalidate_sheet_data_cache(spreadsheet_id, sheet_name)
    }

    fn detect_incomplete_ranges(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Result<Vec<i64>> {
        self.inner.detect_incomplete_ranges(spreadsheet_id, sheet_name)
    }

    fn delete_range_data(&self, range_id: i64) -> Result<()> {
        self.inner.delete_range_data(range_id)
    }

    fn clean_orphaned_ranges(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<usize> {
        self.inner.clean_orphaned_ranges(spreadsheet_id, sheet_name)
    }
}

fn r(a1: &str) -> CellRange {
    CellRange::from_a1_notation(a1).unwrap()
}

fn seed(store: &impl Store, a1: &str, data: SheetData) {
    store.store_sheet_data_range(SPREADSHEET, SHEET, &r(a1), &data).unwrap();
}

/// Test that a cold request is fetched, cached, and then served from cache
#[test]
fn test_cold_request_then_cache_hit() {
    let cache = SheetDataCache::new(MemoryStore::new());
    let fetcher = ScriptedFetcher::new().with("Sheet1!A1:B2", sheet_data([["x", "y"], ["z", "w"]]));

    let first = cache.get_sheet_data(&fetcher, SPREADSHEET, SHEET, "A1:B2").unwrap();
    assert_eq!(first.data, sheet_data([["x", "y"], ["z", "w"]]));
    assert_eq!(first.sources, vec![RangeSource::remote("A1:B2")]);

    let second = cache.get_sheet_data(&fetcher, SPREADSHEET, SHEET, "A1:B2").unwrap();
    assert_eq!(second.data, first.data);
    assert_eq!(second.sources, vec![RangeSource::cache("A1:B2")]);
    assert_eq!(fetcher.calls(), vec!["Sheet1!A1:B2"]);
}

/// Test that a request tiled by several cached ranges needs no fetch
#[test]
fn test_tiled_cache_serves_without_fetching() {
    let store = MemoryStore::new();
    seed(&store, "A1:B2", sheet_data([["A1", "B1"], ["A2", "B2"]]));
    seed(&store, "C1:D2", sheet_data([["C1", "D1"], ["C2", "D2"]]));
    seed(&store, "A3:D4", sheet_data([["A3", "B3", "C3", "D3"], ["A4", "B4", "C4", "D4"]]));

    let cache = SheetDataCache::new(store);
    let fetcher = ScriptedFetcher::new();
    let load = cache.get_sheet_data(&fetcher, SPREADSHEET, SHEET, "A1:D4").unwrap();

    assert!(fetcher.calls().is_empty());
    assert_eq!(load.sources, vec![RangeSource::cache("A1:D4")]);
    assert_eq!(
        load.data,
        sheet_data([
            ["A1", "B1", "C1", "D1"],
            ["A2", "B2", "C2", "D2"],
            ["A3", "B3", "C3", "D3"],
            ["A4", "B4", "C4", "D4"],
        ])
    );
}

/// Test merging a cached corner with two fetched fragments
#[test]
fn test_partial_overlap_merges_cache_and_remote() {
    let store = MemoryStore::new();
    seed(&store, "A1:B2", sheet_data([["a", "b"], ["c", "d"]]));

    let cache = SheetDataCache::new(store);
    let fetcher = ScriptedFetcher::new()
        .with("Sheet1!A3:C3", sheet_data([["g", "h", "i"]]))
        .with("Sheet1!C1:C2", sheet_data([["e"], ["f"]]));

    let load = cache.get_sheet_data(&fetcher, SPREADSHEET, SHEET, "A1:C3").unwrap();

    assert_eq!(fetcher.calls(), vec!["Sheet1!A3:C3", "Sheet1!C1:C2"]);
    assert_eq!(
        load.data,
        sheet_data([["a", "b", "e"], ["c", "d", "f"], ["g", "h", "i"]])
    );
    assert_eq!(
        load.sources,
        vec![
            RangeSource::cache("A1:B2"),
            RangeSource::remote("A3:C3"),
            RangeSource::remote("C1:C2"),
        ]
    );

    // the fetched fragments complete the coverage
    let again = cache.get_sheet_data(&fetcher, SPREADSHEET, SHEET, "A1:C3").unwrap();
    assert_eq!(again.data, load.data);
    assert_eq!(again.sources, vec![RangeSource::cache("A1:C3")]);
    assert_eq!(fetcher.calls().len(), 2);
}

/// Test that fragments land relative to the request, not the sheet origin
#[test]
fn test_fragments_use_request_relative_offsets() {
    let store = MemoryStore::new();
    seed(&store, "D6", sheet_data([["mid"]]));

    let cache = SheetDataCache::new(store);
    let fetcher = ScriptedFetcher::new()
        .with("Sheet1!C5:E5", sheet_data([["c5", "d5", "e5"]]))
        .with("Sheet1!C7:E7", sheet_data([["c7", "d7", "e7"]]))
        .with("Sheet1!C6:C6", sheet_data([["c6"]]))
        .with("Sheet1!E6:E6", sheet_data([["e6"]]));

    let load = cache.get_sheet_data(&fetcher, SPREADSHEET, SHEET, "C5:E7").unwrap();

    assert_eq!(
        fetcher.calls(),
        vec!["Sheet1!C5:E5", "Sheet1!C7:E7", "Sheet1!C6:C6", "Sheet1!E6:E6"]
    );
    assert_eq!(
        load.data,
        sheet_data([
            ["c5", "d5", "e5"],
            ["c6", "mid", "e6"],
            ["c7", "d7", "e7"],
        ])
    );
    assert_eq!(load.sources[0], RangeSource::cache("D6:D6"));
}

/// Test that a short remote answer leaves the rest of its fragment empty
#[test]
fn test_short_remote_fragment_pads_with_empty() {
    let store = MemoryStore::new();
    seed(&store, "A1:A2", sheet_data([["a1"], ["a2"]]));

    let cache = SheetDataCache::new(store);
    let fetcher = ScriptedFetcher::new().with("Sheet1!B1:C2", sheet_data([["b1"]]));

    let load = cache.get_sheet_data(&fetcher, SPREADSHEET, SHEET, "A1:C2").unwrap();

    assert_eq!(
        load.data,
        sheet_data([[Some("a1"), Some("b1"), None], [Some("a2"), None, None]])
    );
}

/// Test that the most recently cached range wins on shared cells
#[test]
fn test_newest_cached_range_wins() {
    let store = MemoryStore::new();
    seed(&store, "A1:B1", sheet_data([["old", "old"]]));
    thread::sleep(Duration::from_millis(5));
    seed(&store, "B1:C1", sheet_data([["new", "new"]]));

    let cache = SheetDataCache::new(store);
    let fetcher = ScriptedFetcher::new().with("Sheet1!D1:D1", sheet_data([["d"]]));

    let load = cache.get_sheet_data(&fetcher, SPREADSHEET, SHEET, "A1:D1").unwrap();

    assert_eq!(load.data, sheet_data([["old", "new", "new", "d"]]));
    assert_eq!(
        load.sources,
        vec![
            RangeSource::cache("B1:C1"),
            RangeSource::cache("A1:B1"),
            RangeSource::remote("D1:D1"),
        ]
    );
}

/// Test that a single cell is requested in two-corner form
#[test]
fn test_single_cell_request() {
    let cache = SheetDataCache::new(MemoryStore::new());
    let fetcher = ScriptedFetcher::new().with("Sheet1!C3:C3", sheet_data([[42]]));

    let load = cache.get_sheet_data(&fetcher, SPREADSHEET, SHEET, "C3").unwrap();

    assert_eq!(fetcher.calls(), vec!["Sheet1!C3:C3"]);
    assert_eq!(load.data, vec![vec![CellValue::Number(42.0)]]);
    assert_eq!(load.sources, vec![RangeSource::remote("C3")]);
}

/// Test that an empty sheet yields an empty matrix and caches nothing
#[test]
fn test_empty_remote_result() {
    let cache = SheetDataCache::new(MemoryStore::new());
    let fetcher = ScriptedFetcher::new();

    let load = cache.get_sheet_data(&fetcher, SPREADSHEET, SHEET, "A1:B2").unwrap();
    assert!(load.data.is_empty());
    assert_eq!(load.sources, vec![RangeSource::remote("A1:B2")]);
    assert_eq!(cache.store().range_count(), 0);

    cache.get_sheet_data(&fetcher, SPREADSHEET, SHEET, "A1:B2").unwrap();
    assert_eq!(fetcher.calls().len(), 2);
}

/// Test that an empty fragment in a mixed result still gets a full-size matrix
#[test]
fn test_empty_fragment_next_to_cached_data() {
    let store = MemoryStore::new();
    seed(&store, "A1", sheet_data([["a"]]));

    let cache = SheetDataCache::new(store);
    let fetcher = ScriptedFetcher::new();

    let load = cache.get_sheet_data(&fetcher, SPREADSHEET, SHEET, "A1:B1").unwrap();

    assert_eq!(load.data, sheet_data([[Some("a"), None]]));
    assert_eq!(
        load.sources,
        vec![RangeSource::cache("A1:A1"), RangeSource::remote("B1:B1")]
    );
    assert_eq!(cache.store().range_count(), 1);
}

/// Test that unparseable ranges are passed straight to the fetcher
#[test]
fn test_unparseable_range_is_fetched_uncached() {
    let cache = SheetDataCache::new(MemoryStore::new());
    let fetcher = ScriptedFetcher::new().with(
        "Sheet1!Totals",
        vec![vec![CellValue::text("sum"), CellValue::Number(10.0)]],
    );

    let load = cache.get_sheet_data(&fetcher, SPREADSHEET, SHEET, "Totals").unwrap();

    assert_eq!(fetcher.calls(), vec!["Sheet1!Totals"]);
    assert_eq!(load.data[0][1], CellValue::Number(10.0));
    assert_eq!(load.sources, vec![RangeSource::remote("Totals")]);
    assert_eq!(cache.store().range_count(), 0);
}

/// Test that fetch failures surface with their original error attached
#[test]
fn test_fetch_error_propagates() {
    let cache = SheetDataCache::new(MemoryStore::new());
    let fetcher = |_id: &str, _range: &str| -> std::result::Result<SheetData, FetchError> {
        Err(Box::new(TransportError))
    };

    let err = cache
        .get_sheet_data(&fetcher, SPREADSHEET, SHEET, "A1:B2")
        .unwrap_err();

    assert!(err.is_fetch());
    match err {
        Error::Fetch(source) => assert!(source.downcast_ref::<TransportError>().is_some()),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(cache.store().range_count(), 0);
}

/// Test that failing to persist still returns the fetched data
#[test]
fn test_store_write_failure_is_not_fatal() {
    let cache = SheetDataCache::new(FlakyStore {
        fail_writes: true,
        ..FlakyStore::default()
    });
    let fetcher = ScriptedFetcher::new().with("Sheet1!A1:A2", sheet_data([["x"], ["y"]]));

    let load = cache.get_sheet_data(&fetcher, SPREADSHEET, SHEET, "A1:A2").unwrap();
    assert_eq!(load.data, sheet_data([["x"], ["y"]]));

    cache.get_sheet_data(&fetcher, SPREADSHEET, SHEET, "A1:A2").unwrap();
    assert_eq!(fetcher.calls().len(), 2);
}

/// Test that ranges without cells are dropped before planning fetches
#[test]
fn test_incomplete_ranges_are_refetched() {
    let store = MemoryStore::new();
    seed(&store, "A1:B2", vec![vec![]]);

    let cache = SheetDataCache::new(store);
    let fetcher = ScriptedFetcher::new().with("Sheet1!A1:B2", sheet_data([[1, 2], [3, 4]]));

    let load = cache.get_sheet_data(&fetcher, SPREADSHEET, SHEET, "A1:B2").unwrap();

    assert_eq!(fetcher.calls(), vec!["Sheet1!A1:B2"]);
    assert_eq!(load.data, sheet_data([[1, 2], [3, 4]]));
    assert_eq!(cache.store().range_count(), 1);
}

/// Test that ranges of an unknown spreadsheet are cleaned up and refetched
#[test]
fn test_orphaned_ranges_are_refetched() {
    let store = MemoryStore::new();
    seed(&store, "A1", sheet_data([["stale"]]));
    store.forget_spreadsheet(SPREADSHEET);

    let cache = SheetDataCache::new(store);
    let fetcher = ScriptedFetcher::new().with("Sheet1!A1:A1", sheet_data([["fresh"]]));

    let load = cache.get_sheet_data(&fetcher, SPREADSHEET, SHEET, "A1").unwrap();

    assert_eq!(load.data, sheet_data([["fresh"]]));
    assert_eq!(load.sources, vec![RangeSource::remote("A1")]);
}

/// Test that a covered range the store can't read is fetched, not faked
#[test]
fn test_unreadable_cached_range_is_refetched() {
    let store = FlakyStore {
        unreadable: vec![r("A1:B1")],
        ..FlakyStore::default()
    };
    seed(&store, "A1:B1", sheet_data([["a", "b"]]));

    let cache = SheetDataCache::new(store);
    let fetcher = ScriptedFetcher::new().with("Sheet1!A1:B1", sheet_data([["x", "y"]]));

    let load = cache.get_sheet_data(&fetcher, SPREADSHEET, SHEET, "A1:B1").unwrap();

    assert_eq!(load.data, sheet_data([["x", "y"]]));
    assert_eq!(load.sources, vec![RangeSource::remote("A1:B1")]);
    assert_eq!(fetcher.calls(), vec!["Sheet1!A1:B1"]);
}

/// Test that only the unreadable part of a covered request is fetched
#[test]
fn test_unreadable_piece_is_refetched_next_to_readable_cache() {
    let store = FlakyStore {
        unreadable: vec![r("C1:D1")],
        ..FlakyStore::default()
    };
    seed(&store, "A1:B1", sheet_data([["a", "b"]]));
    seed(&store, "C1:D1", sheet_data([["c", "d"]]));

    let cache = SheetDataCache::new(store);
    let fetcher = ScriptedFetcher::new().with("Sheet1!C1:D1", sheet_data([["y", "z"]]));

    let load = cache.get_sheet_data(&fetcher, SPREADSHEET, SHEET, "A1:D1").unwrap();

    assert_eq!(load.data, sheet_data([["a", "b", "y", "z"]]));
    assert_eq!(
        load.sources,
        vec![RangeSource::cache("A1:B1"), RangeSource::remote("C1:D1")]
    );
    assert_eq!(fetcher.calls(), vec!["Sheet1!C1:D1"]);
}

/// Test that a record with impossible bounds is ignored
#[test]
fn test_invalid_cached_record_is_skipped() {
    let store = FlakyStore {
        bogus_records: vec![CachedRangeRecord {
            range_id: 99,
            start_row: 5,
            start_col: 5,
            end_row: 1,
            end_col: 1,
            cached_at: chrono::Utc::now(),
        }],
        ..FlakyStore::default()
    };

    let cache = SheetDataCache::new(store);
    let fetcher = ScriptedFetcher::new().with("Sheet1!A1:B1", sheet_data([["x", "y"]]));

    let load = cache.get_sheet_data(&fetcher, SPREADSHEET, SHEET, "A1:B1").unwrap();
    assert_eq!(load.data, sheet_data([["x", "y"]]));
    assert_eq!(load.sources, vec![RangeSource::remote("A1:B1")]);

    let report = cache.validate_cache_integrity(SPREADSHEET, SHEET).unwrap();
    assert_eq!(report.checked, 1);
    assert!(report.is_valid());
}

/// Test that a whole-sheet request is refused before anything is fetched
#[test]
fn test_oversized_request_is_refused() {
    let store = MemoryStore::new();
    seed(&store, "A1", sheet_data([["x"]]));

    let cache = SheetDataCache::new(store);
    let fetcher = ScriptedFetcher::new();

    let err = cache
        .get_sheet_data(&fetcher, SPREADSHEET, SHEET, "A1:XFD1048576")
        .unwrap_err();

    assert!(matches!(
        err,
        Error::RangeTooLarge { limit, .. } if limit == sheet_cache::MAX_MATRIX_CELLS
    ));
    assert!(fetcher.calls().is_empty());
}

/// Test invalidating one sheet and then the whole spreadsheet
#[test]
fn test_invalidate_cache() {
    let cache = SheetDataCache::new(MemoryStore::new());
    let fetcher = ScriptedFetcher::new()
        .with("Sheet1!A1:A1", sheet_data([["one"]]))
        .with("Sheet2!A1:A1", sheet_data([["two"]]));

    for sheet in ["Sheet1", "Sheet2"] {
        cache.get_sheet_data(&fetcher, SPREADSHEET, sheet, "A1").unwrap();
    }
    assert_eq!(fetcher.calls().len(), 2);

    assert!(cache.invalidate_cache(SPREADSHEET, Some("Sheet1")).unwrap());
    let sheet1 = cache.get_sheet_data(&fetcher, SPREADSHEET, "Sheet1", "A1").unwrap();
    let sheet2 = cache.get_sheet_data(&fetcher, SPREADSHEET, "Sheet2", "A1").unwrap();
    assert_eq!(sheet1.sources, vec![RangeSource::remote("A1")]);
    assert_eq!(sheet2.sources, vec![RangeSource::cache("A1")]);
    assert_eq!(fetcher.calls().len(), 3);

    assert!(cache.invalidate_cache(SPREADSHEET, None).unwrap());
    assert_eq!(cache.store().range_count(), 0);
}

/// Test integrity validation on a healthy cache
#[test]
fn test_validate_cache_integrity_ok() {
    let store = MemoryStore::new();
    seed(&store, "A1:E10", vec![vec![CellValue::text("v"); 5]; 10]);
    seed(&store, "G1", sheet_data([["g"]]));

    let cache = SheetDataCache::new(store);
    let report = cache.validate_cache_integrity(SPREADSHEET, SHEET).unwrap();

    assert!(report.is_valid());
    assert_eq!(report.checked, 2);
}

/// Test that unreadable and cell-less ranges are reported, not repaired
#[test]
fn test_validate_cache_integrity_reports_failures() {
    let store = MemoryStore::new();
    seed(&store, "A1:B2", sheet_data([["a", "b"], ["c", "d"]]));
    seed(&store, "D1:D3", vec![vec![]]);

    let cache = SheetDataCache::new(store);
    let report = cache.validate_cache_integrity(SPREADSHEET, SHEET).unwrap();
    assert_eq!(report.checked, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].range, r("D1:D3"));
    assert_eq!(cache.store().range_count(), 2);

    let flaky = FlakyStore {
        fail_reads: true,
        ..FlakyStore::default()
    };
    seed(&flaky, "A1:B2", sheet_data([["a", "b"], ["c", "d"]]));
    let cache = SheetDataCache::new(flaky);
    let report = cache.validate_cache_integrity(SPREADSHEET, SHEET).unwrap();
    assert!(!report.is_valid());
    assert_eq!(report.failures.len(), 1);
}
