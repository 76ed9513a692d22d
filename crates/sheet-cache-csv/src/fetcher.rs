//! Directory-backed fetcher

use std::io;
use std::path::{Path, PathBuf};

use crate::error::{CsvError, CsvResult};
use crate::options::CsvReadOptions;
use crate::reader::CsvReader;
use sheet_cache_core::{CellRange, FetchError, Fetcher, SheetData};

/// A [`Fetcher`] that reads `<root>/<spreadsheet_id>/<Sheet>.csv`.
///
/// Answers look like those of a tabular spreadsheet API: the requested
/// rectangle with trailing empty cells and rows dropped, and `[]` when the
/// sheet doesn't exist or has nothing in range.
#[derive(Debug, Clone)]
pub struct CsvFetcher {
    root: PathBuf,
    options: CsvReadOptions,
}

impl CsvFetcher {
    /// Create a fetcher rooted at `root`
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self::with_options(root, CsvReadOptions::default())
    }

    /// Create a fetcher with explicit read options
    pub fn with_options<P: Into<PathBuf>>(root: P, options: CsvReadOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    /// Get the root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the CSV file holding `sheet_name` of `spreadsheet_id`
    pub fn sheet_path(&self, spreadsheet_id: &str, sheet_name: &str) -> CsvResult<PathBuf> {
        check_name(spreadsheet_id)?;
        check_name(sheet_name)?;
        Ok(self
            .root
            .join(spreadsheet_id)
            .join(format!("{}.csv", sheet_name)))
    }

    /// Read a sheet-qualified range such as `Sheet1!B2:C4`
    pub fn read_range(&self, spreadsheet_id: &str, range: &str) -> CsvResult<SheetData> {
        let (sheet_name, a1) = match range.rsplit_once('!') {
            Some((sheet, a1)) => (unquote(sheet), a1),
            None => return Err(CsvError::InvalidName(format!("range without sheet: {}", range))),
        };
        let range = CellRange::from_a1_notation(a1)?;
        let path = self.sheet_path(spreadsheet_id, sheet_name)?;

        let rows = match CsvReader::read_file(&path, &self.options) {
            Ok(rows) => rows,
            Err(CsvError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no sheet file at {}", path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        Ok(slice(&rows, &range))
    }
}

impl Fetcher for CsvFetcher {
    fn fetch(&self, spreadsheet_id: &str, range: &str) -> Result<SheetData, FetchError> {
        Ok(self.read_range(spreadsheet_id, range)?)
    }
}

fn unquote(sheet: &str) -> &str {
    sheet
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(sheet)
}

fn check_name(name: &str) -> CsvResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(CsvError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Cut `range` out of `rows`, then drop trailing empty cells and rows
fn slice(rows: &SheetData, range: &CellRange) -> SheetData {
    let first_row = range.start_row() as usize - 1;
    let first_col = range.start_col() as usize - 1;

    let mut out: SheetData = rows
        .iter()
        .skip(first_row)
        .take(range.row_count() as usize)
        .map(|row| {
            let mut cells: Vec<_> = row
                .iter()
                .skip(first_col)
                .take(range.col_count() as usize)
                .cloned()
                .collect();
            while cells.last().is_some_and(|c| c.is_empty()) {
                cells.pop();
            }
            cells
        })
        .collect();

    while out.last().is_some_and(|row| row.is_empty()) {
        out.pop();
    }
    out
}
