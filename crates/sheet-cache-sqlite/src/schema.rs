//! Table and index definitions

use rusqlite::Connection;

use crate::error::SqliteResult;

/// Create the cache tables if they don't exist.
///
/// Deleting a spreadsheet cascades to its ranges, and deleting a range
/// cascades to its cells. `cell_value` is declared without a type so each
/// value keeps its own storage class.
pub fn create_tables(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS spreadsheets (
            spreadsheet_id TEXT PRIMARY KEY,
            name TEXT
        );

        CREATE TABLE IF NOT EXISTS sheet_data_ranges (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            spreadsheet_id TEXT NOT NULL,
            sheet_name TEXT NOT NULL,
            start_row INTEGER NOT NULL,
            start_col INTEGER NOT NULL,
            end_row INTEGER NOT NULL,
            end_col INTEGER NOT NULL,
            cached_at TEXT NOT NULL,
            FOREIGN KEY (spreadsheet_id) REFERENCES spreadsheets(spreadsheet_id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS sheet_data_cells (
            range_id INTEGER NOT NULL,
            row_num INTEGER NOT NULL,
            col_num INTEGER NOT NULL,
            cell_value,
            PRIMARY KEY (range_id, row_num, col_num),
            FOREIGN KEY (range_id) REFERENCES sheet_data_ranges(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_sheet_data_ranges_lookup
            ON sheet_data_ranges(spreadsheet_id, sheet_name);

        CREATE INDEX IF NOT EXISTS idx_sheet_data_cells_position
            ON sheet_data_cells(range_id, row_num, col_num);",
    )?;

    log::debug!("sheet cache tables ready");
    Ok(())
}
