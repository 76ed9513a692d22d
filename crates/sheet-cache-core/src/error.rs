//! Error types for sheet-cache-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error produced by a [`Store`](crate::Store) backend
pub type StoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Boxed error produced by a [`Fetcher`](crate::Fetcher) transport
pub type FetchError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in sheet-cache
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed A1 notation
    #[error("Invalid range format: {0}")]
    InvalidFormat(String),

    /// Row/column below 1, or start after end on either axis
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    /// A range too large to materialize as a matrix
    #[error("Range too large: {cells} cells (limit {limit})")]
    RangeTooLarge { cells: u64, limit: u64 },

    /// The persistent store failed
    #[error("Store error: {0}")]
    Store(#[source] StoreError),

    /// The remote fetch failed (transport or auth)
    #[error("Fetch error: {0}")]
    Fetch(#[source] FetchError),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Wrap a backend error as a store failure
    pub fn store<E>(err: E) -> Self
    where
        E: Into<StoreError>,
    {
        Error::Store(err.into())
    }

    /// Wrap a transport error as a fetch failure
    pub fn fetch<E>(err: E) -> Self
    where
        E: Into<FetchError>,
    {
        Error::Fetch(err.into())
    }

    /// Check whether this error came from the fetch transport
    pub fn is_fetch(&self) -> bool {
        matches!(self, Error::Fetch(_))
    }
}
