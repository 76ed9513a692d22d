//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The value stored in a cell
//! - [`SheetData`] - A matrix of cell values
//! - A1 helpers for converting between `(row, col)` and `"B7"`

mod address;
mod value;

pub use address::{
    cell_to_a1, column_to_letters, letters_to_column, parse_cell_reference, sheet_qualified,
};
pub use value::{sheet_data, CellValue, SheetData};
