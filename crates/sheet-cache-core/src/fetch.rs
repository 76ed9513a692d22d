//! Remote fetch contract and result provenance

use std::fmt;

use crate::cell::SheetData;
use crate::error::FetchError;

/// Retrieves a literal sheet-qualified A1 range (`"Sheet1!A1:B2"`) from the
/// remote source.
///
/// Implementations return an empty matrix when there is no data and only
/// fail for transport or authentication problems.
pub trait Fetcher {
    /// Fetch `range` of `spreadsheet_id`
    fn fetch(&self, spreadsheet_id: &str, range: &str) -> Result<SheetData, FetchError>;
}

impl<F> Fetcher for F
where
    F: Fn(&str, &str) -> Result<SheetData, FetchError>,
{
    fn fetch(&self, spreadsheet_id: &str, range: &str) -> Result<SheetData, FetchError> {
        self(spreadsheet_id, range)
    }
}

/// Where a part of a result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoadSource {
    /// Served from the store
    Cache,
    /// Fetched from the remote source during this call
    Remote,
}

impl LoadSource {
    /// Get the display string for this source
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadSource::Cache => "CACHE",
            LoadSource::Remote => "REMOTE",
        }
    }
}

impl fmt::Display for LoadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A range of the result tagged with its [`LoadSource`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RangeSource {
    /// Where the cells came from
    pub source: LoadSource,
    /// The A1 range the tag applies to
    pub range: String,
}

impl RangeSource {
    /// Tag a range as served from cache
    pub fn cache<S: Into<String>>(range: S) -> Self {
        Self {
            source: LoadSource::Cache,
            range: range.into(),
        }
    }

    /// Tag a range as fetched remotely
    pub fn remote<S: Into<String>>(range: S) -> Self {
        Self {
            source: LoadSource::Remote,
            range: range.into(),
        }
    }
}

impl fmt::Display for RangeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.source, self.range)
    }
}
