//! # sheet-cache-csv
//!
//! CSV fetcher and writer for sheet-cache.
//!
//! [`CsvFetcher`] serves sheet-qualified ranges from a directory laid out as
//! `<root>/<spreadsheet_id>/<Sheet>.csv`, which makes it a stand-in for a
//! remote spreadsheet API. [`CsvWriter`] renders a result matrix.

mod error;
mod fetcher;
mod options;
mod reader;
mod writer;

pub use error::{CsvError, CsvResult};
pub use fetcher::CsvFetcher;
pub use options::{CsvReadOptions, CsvWriteOptions};
pub use reader::CsvReader;
pub use writer::CsvWriter;
