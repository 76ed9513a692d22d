//! # sheet-cache
//!
//! A range-based read-through cache for spreadsheet data.
//!
//! Requests for A1 ranges are answered from a persistent [`Store`] where
//! possible. Only the rectangles the store doesn't cover are fetched from
//! the remote source, and they are persisted for next time.
//!
//! ## Features
//!
//! - Minimal remote fetches: a request is split into disjoint uncovered fragments
//! - Provenance for every part of a result ([`LoadSource::Cache`] or [`LoadSource::Remote`])
//! - SQLite store (`sqlite` feature) and an in-process [`MemoryStore`]
//! - CSV directory fetcher (`csv` feature) for offline use
//!
//! ## Example
//!
//! ```rust
//! use sheet_cache::prelude::*;
//!
//! let cache = SheetDataCache::new(MemoryStore::new());
//! let fetcher = |_id: &str, range: &str| -> std::result::Result<SheetData, FetchError> {
//!     assert_eq!(range, "Sheet1!A1:B2");
//!     Ok(sheet_data([["x", "y"], ["z", "w"]]))
//! };
//!
//! let first = cache.get_sheet_data(&fetcher, "spreadsheet", "Sheet1", "A1:B2").unwrap();
//! assert_eq!(first.sources, vec![RangeSource::remote("A1:B2")]);
//!
//! let second = cache.get_sheet_data(&fetcher, "spreadsheet", "Sheet1", "A1:B2").unwrap();
//! assert_eq!(second.data, first.data);
//! assert_eq!(second.sources, vec![RangeSource::cache("A1:B2")]);
//! ```

pub mod cache;
pub mod memory;
pub mod prelude;

pub use cache::{IntegrityReport, SheetDataCache, SheetLoad};
pub use memory::MemoryStore;

// Re-export core types
pub use sheet_cache_core::{
    cell_to_a1, column_to_letters, letters_to_column, parse_cell_reference, sheet_data,
    sheet_qualified, CachedRange, CachedRangeRecord, CellRange, CellValue, Error, FetchError,
    Fetcher, LoadSource, RangeOptimizer, RangeSource, Result, SheetData, Store, StoreError,
    INTEGRITY_PROBE_SIZE, MAX_MATRIX_CELLS,
};

// Re-export backends
#[cfg(feature = "csv")]
pub use sheet_cache_csv::{CsvError, CsvFetcher, CsvReadOptions, CsvWriteOptions, CsvWriter};
#[cfg(feature = "sqlite")]
pub use sheet_cache_sqlite::{SqliteError, SqliteStore};
