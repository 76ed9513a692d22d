//! # sheet-cache-core
//!
//! Core data structures for the sheet-cache range cache.
//!
//! This crate provides the fundamental types used throughout sheet-cache:
//! - [`CellValue`] and [`SheetData`] - Cell contents and matrices of them
//! - [`CellRange`] - 1-based rectangles with intersection, union and subtraction
//! - [`CachedRange`] - A range known to be persisted, with its timestamp
//! - [`RangeOptimizer`] - Which fragments of a request still need fetching
//! - [`Store`] and [`Fetcher`] - The capability traits the cache is built on
//!
//! ## Example
//!
//! ```rust
//! use sheet_cache_core::{CachedRange, CellRange, RangeOptimizer};
//! use chrono::Utc;
//!
//! let requested = CellRange::from_a1_notation("A1:C3").unwrap();
//! let cached = vec![CachedRange::new(
//!     CellRange::from_a1_notation("A1:B2").unwrap(),
//!     "spreadsheet",
//!     "Sheet1",
//!     Utc::now(),
//!     None,
//! )];
//!
//! let missing = RangeOptimizer::find_missing_ranges(&requested, &cached);
//! let names: Vec<_> = missing.iter().map(|r| r.to_a1_notation()).collect();
//! assert_eq!(names, ["A3:C3", "C1:C2"]);
//! ```

pub mod cached;
pub mod cell;
pub mod error;
pub mod fetch;
pub mod optimizer;
pub mod range;
pub mod store;

// Re-exports for convenience
pub use cached::CachedRange;
pub use cell::{
    cell_to_a1, column_to_letters, letters_to_column, parse_cell_reference, sheet_data,
    sheet_qualified, CellValue, SheetData,
};
pub use error::{Error, FetchError, Result, StoreError};
pub use fetch::{Fetcher, LoadSource, RangeSource};
pub use optimizer::RangeOptimizer;
pub use range::{CellRange, MAX_MATRIX_CELLS};
pub use store::{CachedRangeRecord, Store};

/// Number of leading rows and columns of each cached range read back when
/// checking cache integrity
pub const INTEGRITY_PROBE_SIZE: u32 = 3;
