//! CSV error types

use thiserror::Error;

/// Result type for CSV operations
pub type CsvResult<T> = std::result::Result<T, CsvError>;

/// Errors that can occur during CSV operations
#[derive(Debug, Error)]
pub enum CsvError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV library error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet or sheet name that can't be mapped to a file
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] sheet_cache_core::Error),
}

impl From<CsvError> for sheet_cache_core::Error {
    fn from(err: CsvError) -> Self {
        match err {
            CsvError::Core(inner) => inner,
            other => sheet_cache_core::Error::fetch(other),
        }
    }
}
