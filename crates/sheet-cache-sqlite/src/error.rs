//! SQLite store error types

use thiserror::Error;

/// Result type for SQLite store operations
pub type SqliteResult<T> = std::result::Result<T, SqliteError>;

/// Errors that can occur in the SQLite store
#[derive(Debug, Error)]
pub enum SqliteError {
    /// IO error (creating the database directory)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite library error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] sheet_cache_core::Error),
}

impl From<SqliteError> for sheet_cache_core::Error {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Core(inner) => inner,
            other => sheet_cache_core::Error::store(other),
        }
    }
}
