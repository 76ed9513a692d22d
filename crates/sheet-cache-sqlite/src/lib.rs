//! # sheet-cache-sqlite
//!
//! SQLite store for sheet-cache.
//!
//! Ranges live in `sheet_data_ranges`, their cells in `sheet_data_cells`,
//! and both hang off a `spreadsheets` row with cascading deletes.

mod error;
mod schema;
mod store;
mod value;

pub use error::{SqliteError, SqliteResult};
pub use schema::create_tables;
pub use store::SqliteStore;
