//! CSV reader

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::CsvResult;
use crate::options::CsvReadOptions;
use sheet_cache_core::{CellValue, SheetData};

/// CSV file reader
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into rows of cells
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<SheetData> {
        let file = File::open(path)?;
        Self::read(file, options)
    }

    /// Read CSV from a reader into rows of cells.
    ///
    /// Every record is data, the first one is row 1. Records may have
    /// different lengths. Blank lines are skipped by the parser, so an
    /// empty row has to be written as `""` or a line of delimiters.
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<SheetData> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            let row = record
                .iter()
                .map(|field| {
                    if options.auto_detect_types {
                        Self::detect_type(field)
                    } else if field.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::text(field)
                    }
                })
                .collect();
            rows.push(row);
        }

        Ok(rows)
    }

    /// Detect the type of a field value
    fn detect_type(field: &str) -> CellValue {
        let trimmed = field.trim();

        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        if trimmed.eq_ignore_ascii_case("true") {
            return CellValue::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return CellValue::Bool(false);
        }

        // Try number
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return CellValue::Number(n);
            }
        }

        // Default to text, as written
        CellValue::text(field)
    }
}
