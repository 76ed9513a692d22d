//! Options for reading sheets and printing loaded ranges

/// How a sheet file is parsed by [`CsvReader`](crate::CsvReader)
#[derive(Debug, Clone, Copy)]
pub struct CsvReadOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Turn `true`/`false` and numeric fields into typed cells; otherwise
    /// every non-empty field is text
    pub auto_detect_types: bool,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            auto_detect_types: true,
        }
    }
}

/// How [`CsvWriter`](crate::CsvWriter) prints a matrix
#[derive(Debug, Clone, Copy)]
pub struct CsvWriteOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// End records with `\r\n` instead of `\n`
    pub crlf: bool,
}

impl Default for CsvWriteOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            crlf: false,
        }
    }
}
