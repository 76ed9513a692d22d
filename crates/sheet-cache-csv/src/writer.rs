//! CSV writer

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::CsvResult;
use crate::options::CsvWriteOptions;
use sheet_cache_core::SheetData;

/// CSV file writer
pub struct CsvWriter;

impl CsvWriter {
    /// Write rows of cells to a CSV file
    pub fn write_file<P: AsRef<Path>>(
        data: &SheetData,
        path: P,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let file = File::create(path)?;
        Self::write(data, file, options)
    }

    /// Write rows of cells to a writer.
    ///
    /// Rows are written as they are, ragged rows stay ragged.
    pub fn write<W: Write>(
        data: &SheetData,
        writer: W,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let terminator = if options.crlf {
            csv::Terminator::CRLF
        } else {
            csv::Terminator::Any(b'\n')
        };

        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .terminator(terminator)
            .flexible(true)
            .from_writer(writer);

        for row in data {
            csv_writer.write_record(row.iter().map(|value| value.to_string()))?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}
