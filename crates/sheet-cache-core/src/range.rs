//! Rectangular cell ranges and their set algebra

use std::fmt;
use std::str::FromStr;

use crate::cell::{cell_to_a1, parse_cell_reference};
use crate::cell::{CellValue, SheetData};
use crate::error::{Error, Result};

/// Largest number of cells [`CellRange::empty_matrix`] will allocate.
///
/// `A1:XFD1048576` is valid notation but would need ~17 billion cells.
pub const MAX_MATRIX_CELLS: u64 = 10_000_000;

/// An inclusive, axis-aligned rectangle of cells (e.g., "A1:B10")
///
/// Coordinates are 1-based, matching A1 notation. A `CellRange` always
/// satisfies `1 <= start <= end` on both axes; every operation returns a new
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CellRange {
    start_row: u32,
    start_col: u32,
    end_row: u32,
    end_col: u32,
}

impl CellRange {
    /// Create a new cell range
    ///
    /// Fails with [`Error::InvalidRange`] if any coordinate is below 1 or
    /// the start lies after the end on either axis. Nothing is swapped.
    pub fn new(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Result<Self> {
        if start_row < 1 || start_col < 1 || end_row < 1 || end_col < 1 {
            return Err(Error::InvalidRange(format!(
                "row and column numbers must be positive, got ({}, {}):({}, {})",
                start_row, start_col, end_row, end_col
            )));
        }

        if start_row > end_row || start_col > end_col {
            return Err(Error::InvalidRange(format!(
                "start ({}, {}) must not be after end ({}, {})",
                start_row, start_col, end_row, end_col
            )));
        }

        Ok(Self {
            start_row,
            start_col,
            end_row,
            end_col,
        })
    }

    /// Create a single-cell range
    pub fn single(row: u32, col: u32) -> Result<Self> {
        Self::new(row, col, row, col)
    }

    /// Parse a range from `A1` or `A1:B5` notation
    ///
    /// # Examples
    /// ```
    /// use sheet_cache_core::CellRange;
    ///
    /// let range = CellRange::from_a1_notation("B2:D10").unwrap();
    /// assert_eq!(range.start_row(), 2);
    /// assert_eq!(range.end_col(), 4);
    ///
    /// let cell = CellRange::from_a1_notation("C3").unwrap();
    /// assert_eq!(cell.cell_count(), 1);
    /// ```
    pub fn from_a1_notation(range_str: &str) -> Result<Self> {
        match range_str.split_once(':') {
            Some((start, end)) => {
                let (start_row, start_col) = parse_cell_reference(start.trim())?;
                let (end_row, end_col) = parse_cell_reference(end.trim())?;
                Self::new(start_row, start_col, end_row, end_col)
            }
            None => {
                let (row, col) = parse_cell_reference(range_str.trim())?;
                Self::single(row, col)
            }
        }
    }

    /// Format as `A1:B5`; a single cell renders as `C3:C3`
    pub fn to_a1_notation(&self) -> String {
        format!(
            "{}:{}",
            cell_to_a1(self.start_row, self.start_col),
            cell_to_a1(self.end_row, self.end_col)
        )
    }

    /// First row (1-based)
    pub fn start_row(&self) -> u32 {
        self.start_row
    }

    /// First column (1-based)
    pub fn start_col(&self) -> u32 {
        self.start_col
    }

    /// Last row, inclusive
    pub fn end_row(&self) -> u32 {
        self.end_row
    }

    /// Last column, inclusive
    pub fn end_col(&self) -> u32 {
        self.end_col
    }

    /// Get the number of rows in the range
    pub fn row_count(&self) -> u32 {
        self.end_row - self.start_row + 1
    }

    /// Get the number of columns in the range
    pub fn col_count(&self) -> u32 {
        self.end_col - self.start_col + 1
    }

    /// Get the total number of cells in the range
    pub fn cell_count(&self) -> u64 {
        self.row_count() as u64 * self.col_count() as u64
    }

    /// Allocate a matrix of [`CellValue::Empty`] shaped like this range
    ///
    /// Fails with [`Error::RangeTooLarge`] above [`MAX_MATRIX_CELLS`].
    pub fn empty_matrix(&self) -> Result<SheetData> {
        let cells = self.cell_count();
        if cells > MAX_MATRIX_CELLS {
            return Err(Error::RangeTooLarge {
                cells,
                limit: MAX_MATRIX_CELLS,
            });
        }
        Ok(vec![
            vec![CellValue::Empty; self.col_count() as usize];
            self.row_count() as usize
        ])
    }

    /// Check if a single 1-based cell lies within this range
    pub fn contains_cell(&self, row: u32, col: u32) -> bool {
        row >= self.start_row && row <= self.end_row && col >= self.start_col && col <= self.end_col
    }

    /// Check if `other` lies entirely within this range
    pub fn contains(&self, other: &CellRange) -> bool {
        self.start_row <= other.start_row
            && self.start_col <= other.start_col
            && self.end_row >= other.end_row
            && self.end_col >= other.end_col
    }

    /// Check if this range shares at least one cell with another
    pub fn overlaps_with(&self, other: &CellRange) -> bool {
        !(self.end_row < other.start_row
            || self.start_row > other.end_row
            || self.end_col < other.start_col
            || self.start_col > other.end_col)
    }

    /// Get the intersection of two ranges, if any
    pub fn intersection(&self, other: &CellRange) -> Option<CellRange> {
        if !self.overlaps_with(other) {
            return None;
        }

        Some(CellRange {
            start_row: self.start_row.max(other.start_row),
            start_col: self.start_col.max(other.start_col),
            end_row: self.end_row.min(other.end_row),
            end_col: self.end_col.min(other.end_col),
        })
    }

    /// Bounding box of both ranges.
    ///
    /// This is not an exact union: the result may include cells that are in
    /// neither input.
    pub fn union(&self, other: &CellRange) -> CellRange {
        CellRange {
            start_row: self.start_row.min(other.start_row),
            start_col: self.start_col.min(other.start_col),
            end_row: self.end_row.max(other.end_row),
            end_col: self.end_col.max(other.end_col),
        }
    }

    /// Remove `other` from this range, returning the disjoint remainder.
    ///
    /// Up to four fragments, in this order: the band above the overlap and
    /// the band below it (both spanning this range's full width), then the
    /// bands left and right of the overlap (spanning only the overlap's
    /// rows).
    pub fn subtract(&self, other: &CellRange) -> Vec<CellRange> {
        let Some(overlap) = self.intersection(other) else {
            return vec![*self];
        };

        if overlap == *self {
            return Vec::new();
        }

        let mut remaining = Vec::with_capacity(4);

        if self.start_row < overlap.start_row {
            remaining.push(CellRange {
                start_row: self.start_row,
                start_col: self.start_col,
                end_row: overlap.start_row - 1,
                end_col: self.end_col,
            });
        }

        if self.end_row > overlap.end_row {
            remaining.push(CellRange {
                start_row: overlap.end_row + 1,
                start_col: self.start_col,
                end_row: self.end_row,
                end_col: self.end_col,
            });
        }

        if self.start_col < overlap.start_col {
            remaining.push(CellRange {
                start_row: overlap.start_row,
                start_col: self.start_col,
                end_row: overlap.end_row,
                end_col: overlap.start_col - 1,
            });
        }

        if self.end_col > overlap.end_col {
            remaining.push(CellRange {
                start_row: overlap.start_row,
                start_col: overlap.end_col + 1,
                end_row: overlap.end_row,
                end_col: self.end_col,
            });
        }

        remaining
    }

    /// Zero-based `(row, col)` offset of an absolute cell from this range's
    /// top-left corner, i.e. its index in a matrix shaped like this range.
    ///
    /// Returns `None` for cells outside the range.
    pub fn offset_of(&self, row: u32, col: u32) -> Option<(usize, usize)> {
        if !self.contains_cell(row, col) {
            return None;
        }
        Some((
            (row - self.start_row) as usize,
            (col - self.start_col) as usize,
        ))
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_notation())
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_a1_notation(s)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for CellRange {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        struct Raw {
            start_row: u32,
            start_col: u32,
            end_row: u32,
            end_col: u32,
        }

        let raw = Raw::deserialize(deserializer)?;
        CellRange::new(raw.start_row, raw.start_col, raw.end_row, raw.end_col)
            .map_err(serde::de::Error::custom)
    }
}
