//! Mapping between cell values and SQLite storage classes
//!
//! Empty is NULL, Text is TEXT, Number is REAL and Bool is INTEGER 0/1.

use rusqlite::types::{Value, ValueRef};
use sheet_cache_core::CellValue;

/// Convert a cell into the SQL value stored in `sheet_data_cells.cell_value`
pub fn to_sql(value: &CellValue) -> Value {
    match value {
        CellValue::Empty => Value::Null,
        CellValue::Text(s) => Value::Text(s.clone()),
        CellValue::Number(n) => Value::Real(*n),
        CellValue::Bool(b) => Value::Integer(i64::from(*b)),
    }
}

/// Convert a stored SQL value back into a cell
pub fn from_sql(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Empty,
        ValueRef::Integer(i) => CellValue::Bool(i != 0),
        ValueRef::Real(n) => CellValue::Number(n),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            CellValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
