//! sheetcache CLI - read-through range cache over a directory of CSV sheets

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use directories::ProjectDirs;
use log::LevelFilter;
use sheet_cache::prelude::*;
use sheet_cache::{CsvWriteOptions, CsvWriter};
use std::io;
use std::path::{Path, PathBuf};

const DB_FILE_NAME: &str = "sheet-cache.db";

#[derive(Parser)]
#[command(name = "sheetcache")]
#[command(
    author,
    version,
    about = "Range-based read-through cache for spreadsheet data"
)]
struct Cli {
    /// Cache database (default: sheet-cache.db in the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Directory holding <spreadsheet>/<Sheet>.csv files, used as the remote source
    #[arg(long, global = true, default_value = ".")]
    source: PathBuf,

    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a range through the cache and print it as CSV
    Get {
        /// Spreadsheet id
        spreadsheet: String,

        /// Sheet name
        sheet: String,

        /// Range in A1 notation, e.g. A1:C10
        range: String,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Field delimiter (default: comma)
        #[arg(short, long, default_value = ",")]
        delimiter: char,
    },

    /// List the cached ranges of a sheet
    Ranges {
        /// Spreadsheet id
        spreadsheet: String,

        /// Sheet name
        sheet: String,
    },

    /// Drop cached data for a sheet, or for every sheet of a spreadsheet
    Invalidate {
        /// Spreadsheet id
        spreadsheet: String,

        /// Sheet name (default: all sheets)
        sheet: Option<String>,
    },

    /// Probe every cached range of a sheet; fails if any can't be read back
    Validate {
        /// Spreadsheet id
        spreadsheet: String,

        /// Sheet name
        sheet: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let db = match cli.db {
        Some(path) => path,
        None => default_db_path()?,
    };
    let store = SqliteStore::open(&db)
        .with_context(|| format!("Failed to open cache database '{}'", db.display()))?;
    log::debug!("using cache database {}", db.display());
    let cache = SheetDataCache::new(store);

    match cli.command {
        Commands::Get {
            spreadsheet,
            sheet,
            range,
            output,
            delimiter,
        } => get(
            &cache,
            &cli.source,
            &spreadsheet,
            &sheet,
            &range,
            output.as_deref(),
            delimiter,
        ),
        Commands::Ranges { spreadsheet, sheet } => list_ranges(&cache, &spreadsheet, &sheet),
        Commands::Invalidate { spreadsheet, sheet } => {
            cache
                .invalidate_cache(&spreadsheet, sheet.as_deref())
                .context("Failed to invalidate cache")?;
            eprintln!(
                "Invalidated {} ({})",
                spreadsheet,
                sheet.as_deref().unwrap_or("all sheets")
            );
            Ok(())
        }
        Commands::Validate { spreadsheet, sheet } => validate(&cache, &spreadsheet, &sheet),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn default_db_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("org", "sheet-cache", "sheet-cache")
        .context("Could not determine a data directory; pass --db")?;
    Ok(dirs.data_dir().join(DB_FILE_NAME))
}

fn get(
    cache: &SheetDataCache<SqliteStore>,
    source: &Path,
    spreadsheet: &str,
    sheet: &str,
    range: &str,
    output: Option<&Path>,
    delimiter: char,
) -> Result<()> {
    let delimiter = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .with_context(|| format!("Delimiter '{}' is not an ASCII character", delimiter))?;
    let options = CsvWriteOptions {
        delimiter,
        ..Default::default()
    };

    let fetcher = CsvFetcher::new(source);
    let load = cache
        .get_sheet_data(&fetcher, spreadsheet, sheet, range)
        .with_context(|| format!("Failed to load {}!{}", sheet, range))?;

    if let Some(output_path) = output {
        CsvWriter::write_file(&load.data, output_path, &options)
            .with_context(|| format!("Failed to write '{}'", output_path.display()))?;
        eprintln!("Wrote {} rows to '{}'", load.data.len(), output_path.display());
    } else {
        CsvWriter::write(&load.data, io::stdout().lock(), &options)
            .context("Failed to write to stdout")?;
    }

    for tag in &load.sources {
        eprintln!("{}", tag);
    }

    Ok(())
}

fn list_ranges(cache: &SheetDataCache<SqliteStore>, spreadsheet: &str, sheet: &str) -> Result<()> {
    let records = cache
        .store()
        .get_cached_ranges(spreadsheet, sheet)
        .context("Failed to read cached ranges")?;

    if records.is_empty() {
        eprintln!("No cached ranges for {} / {}", spreadsheet, sheet);
        return Ok(());
    }

    for record in &records {
        match CachedRange::from_record(spreadsheet, sheet, record) {
            Ok(cached) => println!(
                "{}\t{}\t{}",
                record.range_id,
                cached.range,
                cached.cached_at.to_rfc3339()
            ),
            Err(e) => println!("{}\t<invalid: {}>", record.range_id, e),
        }
    }

    Ok(())
}

fn validate(cache: &SheetDataCache<SqliteStore>, spreadsheet: &str, sheet: &str) -> Result<()> {
    let report = cache
        .validate_cache_integrity(spreadsheet, sheet)
        .context("Failed to validate cache")?;

    for failure in &report.failures {
        println!("FAILED\t{}", failure.range);
    }

    if !report.is_valid() {
        bail!(
            "{} of {} cached ranges failed validation",
            report.failures.len(),
            report.checked
        );
    }

    println!("{} cached ranges OK", report.checked);
    Ok(())
}
