//! SQLite implementation of the cache store

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sheet_cache_core::{
    CachedRange, CachedRangeRecord, CellRange, CellValue, RangeOptimizer, Result, SheetData,
    Store,
};

use crate::error::SqliteResult;
use crate::schema;
use crate::value;

/// Persistent store for cached ranges backed by a single SQLite database
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, creating parent directories
    /// and tables as needed
    pub fn open<P: AsRef<Path>>(path: P) -> SqliteResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(10))?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        log::debug!("opened sheet cache at {} (journal_mode={})", path.display(), mode);

        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> SqliteResult<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> SqliteResult<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        schema::create_tables(&conn)?;
        Ok(Self { conn, path })
    }

    /// Path of the database file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Access the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Register a spreadsheet, or update its display name
    pub fn register_spreadsheet(
        &self,
        spreadsheet_id: &str,
        name: Option<&str>,
    ) -> SqliteResult<()> {
        self.conn.execute(
            "INSERT INTO spreadsheets (spreadsheet_id, name) VALUES (?1, ?2)
             ON CONFLICT(spreadsheet_id) DO UPDATE SET name = COALESCE(excluded.name, name)",
            params![spreadsheet_id, name],
        )?;
        Ok(())
    }

    /// Delete a spreadsheet together with all of its ranges and cells
    pub fn delete_spreadsheet(&self, spreadsheet_id: &str) -> SqliteResult<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM spreadsheets WHERE spreadsheet_id = ?1",
            params![spreadsheet_id],
        )?;
        Ok(deleted > 0)
    }

    /// All ranges cached for one sheet, oldest first
    pub fn cached_ranges(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> SqliteResult<Vec<CachedRangeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, start_row, start_col, end_row, end_col, cached_at
             FROM sheet_data_ranges
             WHERE spreadsheet_id = ?1 AND sheet_name = ?2
             ORDER BY cached_at, id",
        )?;

        let rows = stmt.query_map(params![spreadsheet_id, sheet_name], |row| {
            Ok(CachedRangeRecord {
                range_id: row.get(0)?,
                start_row: row.get(1)?,
                start_col: row.get(2)?,
                end_row: row.get(3)?,
                end_col: row.get(4)?,
                cached_at: row.get::<_, DateTime<Utc>>(5)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Read a rectangle of cells, or `None` when it is not fully cached.
    ///
    /// Ranges are applied oldest first, so where they overlap the most
    /// recently cached range decides the value.
    pub fn read_range(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        range: &CellRange,
    ) -> SqliteResult<Option<SheetData>> {
        let cached: Vec<CachedRange> = self
            .cached_ranges(spreadsheet_id, sheet_name)?
            .iter()
            .filter_map(|record| CachedRange::from_record(spreadsheet_id, sheet_name, record).ok())
            .collect();

        if !RangeOptimizer::can_satisfy_from_cache(range, &cached) {
            return Ok(None);
        }

        let mut result = range.empty_matrix()?;

        let mut stmt = self.conn.prepare(
            "SELECT row_num, col_num, cell_value FROM sheet_data_cells
             WHERE range_id = ?1
               AND row_num BETWEEN ?2 AND ?3
               AND col_num BETWEEN ?4 AND ?5",
        )?;

        for entry in &cached {
            let Some(overlap) = range.intersection(&entry.range) else {
                continue;
            };

            // a newer range without a stored cell still hides older values
            for row in overlap.start_row()..=overlap.end_row() {
                for col in overlap.start_col()..=overlap.end_col() {
                    if let Some((r, c)) = range.offset_of(row, col) {
                        result[r][c] = CellValue::Empty;
                    }
                }
            }

            let cells = stmt.query_map(
                params![
                    entry.range_id,
                    overlap.start_row(),
                    overlap.end_row(),
                    overlap.start_col(),
                    overlap.end_col()
                ],
                |row| {
                    Ok((
                        row.get::<_, u32>(0)?,
                        row.get::<_, u32>(1)?,
                        value::from_sql(row.get_ref(2)?),
                    ))
                },
            )?;

            for cell in cells {
                let (row, col, value) = cell?;
                if let Some((r, c)) = range.offset_of(row, col) {
                    result[r][c] = value;
                }
            }
        }

        Ok(Some(result))
    }

    /// Persist `data` as the contents of `range` and return the new range id
    pub fn write_range(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        range: &CellRange,
        data: &SheetData,
    ) -> SqliteResult<i64> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT OR IGNORE INTO spreadsheets (spreadsheet_id) VALUES (?1)",
            params![spreadsheet_id],
        )?;

        let replaced = tx.execute(
            "DELETE FROM sheet_data_ranges
             WHERE spreadsheet_id = ?1 AND sheet_name = ?2
               AND start_row = ?3 AND start_col = ?4 AND end_row = ?5 AND end_col = ?6",
            params![
                spreadsheet_id,
                sheet_name,
                range.start_row(),
                range.start_col(),
                range.end_row(),
                range.end_col()
            ],
        )?;
        if replaced > 0 {
            log::debug!("replacing cached range {} of '{}'", range, sheet_name);
        }

        tx.execute(
            "INSERT INTO sheet_data_ranges
                (spreadsheet_id, sheet_name, start_row, start_col, end_row, end_col, cached_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                spreadsheet_id,
                sheet_name,
                range.start_row(),
                range.start_col(),
                range.end_row(),
                range.end_col(),
                Utc::now()
            ],
        )?;
        let range_id = tx.last_insert_rowid();

        {
            let mut insert = tx.prepare(
                "INSERT INTO sheet_data_cells (range_id, row_num, col_num, cell_value)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;

            let mut clipped = 0usize;
            for (r, row) in data.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    let row_num = range.start_row() as u64 + r as u64;
                    let col_num = range.start_col() as u64 + c as u64;
                    if row_num > range.end_row() as u64 || col_num > range.end_col() as u64 {
                        clipped += 1;
                        continue;
                    }
                    insert.execute(params![range_id, row_num, col_num, value::to_sql(cell)])?;
                }
            }

            if clipped > 0 {
                log::warn!(
                    "dropped {} cells outside {} while caching '{}'",
                    clipped,
                    range,
                    sheet_name
                );
            }
        }

        tx.commit()?;
        Ok(range_id)
    }

    /// Drop cached ranges for one sheet, or the whole spreadsheet when
    /// `sheet_name` is `None`
    pub fn invalidate(
        &self,
        spreadsheet_id: &str,
        sheet_name: Option<&str>,
    ) -> SqliteResult<usize> {
        let deleted = match sheet_name {
            Some(sheet) => self.conn.execute(
                "DELETE FROM sheet_data_ranges WHERE spreadsheet_id = ?1 AND sheet_name = ?2",
                params![spreadsheet_id, sheet],
            )?,
            None => self.conn.execute(
                "DELETE FROM sheet_data_ranges WHERE spreadsheet_id = ?1",
                params![spreadsheet_id],
            )?,
        };
        log::debug!(
            "invalidated {} cached ranges of {} ({})",
            deleted,
            spreadsheet_id,
            sheet_name.unwrap_or("all sheets")
        );
        Ok(deleted)
    }

    /// Ids of ranges on a sheet that have no stored cells
    pub fn incomplete_ranges(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> SqliteResult<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id FROM sheet_data_ranges r
             WHERE r.spreadsheet_id = ?1 AND r.sheet_name = ?2
               AND NOT EXISTS (SELECT 1 FROM sheet_data_cells c WHERE c.range_id = r.id)
             ORDER BY r.id",
        )?;
        let ids = stmt.query_map(params![spreadsheet_id, sheet_name], |row| row.get(0))?;

        let mut result = Vec::new();
        for id in ids {
            result.push(id?);
        }
        Ok(result)
    }

    /// Delete one range and its cells
    pub fn delete_range(&self, range_id: i64) -> SqliteResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM sheet_data_cells WHERE range_id = ?1",
            params![range_id],
        )?;
        let deleted = tx.execute(
            "DELETE FROM sheet_data_ranges WHERE id = ?1",
            params![range_id],
        )?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    /// Delete ranges of a sheet whose spreadsheet row is gone
    pub fn orphaned_ranges_cleanup(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> SqliteResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM sheet_data_cells WHERE range_id IN (
                SELECT id FROM sheet_data_ranges
                WHERE spreadsheet_id = ?1 AND sheet_name = ?2
                  AND spreadsheet_id NOT IN (SELECT spreadsheet_id FROM spreadsheets))",
            params![spreadsheet_id, sheet_name],
        )?;
        let deleted = tx.execute(
            "DELETE FROM sheet_data_ranges
             WHERE spreadsheet_id = ?1 AND sheet_name = ?2
               AND spreadsheet_id NOT IN (SELECT spreadsheet_id FROM spreadsheets)",
            params![spreadsheet_id, sheet_name],
        )?;
        tx.commit()?;
        Ok(deleted)
    }

    /// Display name recorded for a spreadsheet
    pub fn spreadsheet_name(&self, spreadsheet_id: &str) -> SqliteResult<Option<String>> {
        let name = self
            .conn
            .query_row(
                "SELECT name FROM spreadsheets WHERE spreadsheet_id = ?1",
                params![spreadsheet_id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(name.flatten())
    }
}

impl Store for SqliteStore {
    fn get_cached_ranges(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Result<Vec<CachedRangeRecord>> {
        Ok(self.cached_ranges(spreadsheet_id, sheet_name)?)
    }

    fn get_sheet_data_from_cache(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        range: &CellRange,
    ) -> Result<Option<SheetData>> {
        Ok(self.read_range(spreadsheet_id, sheet_name, range)?)
    }

    fn store_sheet_data_range(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        range: &CellRange,
        data: &SheetData,
    ) -> Result<i64> {
        Ok(self.write_range(spreadsheet_id, sheet_name, range, data)?)
    }

    fn invalidate_sheet_data_cache(
        &self,
        spreadsheet_id: &str,
        sheet_name: Option<&str>,
    ) -> Result<bool> {
        self.invalidate(spreadsheet_id, sheet_name)?;
        Ok(true)
    }

    fn detect_incomplete_ranges(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<Vec<i64>> {
        Ok(self.incomplete_ranges(spreadsheet_id, sheet_name)?)
    }

    fn delete_range_data(&self, range_id: i64) -> Result<()> {
        self.delete_range(range_id)?;
        Ok(())
    }

    fn clean_orphaned_ranges(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<usize> {
        Ok(self.orphaned_ranges_cleanup(spreadsheet_id, sheet_name)?)
    }
}
