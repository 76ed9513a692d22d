//! Prelude module - common imports for sheet-cache users
//!
//! ```rust
//! use sheet_cache::prelude::*;
//! ```

pub use crate::{
    sheet_data,
    CachedRange,
    CellRange,
    CellValue,
    Error,
    FetchError,
    Fetcher,
    IntegrityReport,
    LoadSource,
    MemoryStore,
    RangeOptimizer,
    RangeSource,
    Result,
    SheetData,
    SheetDataCache,
    SheetLoad,
    Store,
};

#[cfg(feature = "csv")]
pub use crate::CsvFetcher;
#[cfg(feature = "sqlite")]
pub use crate::SqliteStore;
