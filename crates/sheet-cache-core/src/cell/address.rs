//! A1 notation codec for single cells
//!
//! Rows and columns are 1-based throughout: `A1` is `(1, 1)`, `AA1` is `(1, 27)`.

use crate::error::{Error, Result};

/// Convert a 1-based column number to letters (1 = A, 26 = Z, 27 = AA, etc.)
///
/// Column 0 has no letters and yields an empty string.
pub fn column_to_letters(col: u32) -> String {
    let mut result = String::new();
    let mut n = col;

    while n > 0 {
        // bijective base-26: shift to 0-based before each digit
        n -= 1;
        let c = ((n % 26) as u8 + b'A') as char;
        result.insert(0, c);
        n /= 26;
    }

    result
}

/// Convert column letters to a 1-based column number (A = 1, Z = 26, AA = 27, etc.)
///
/// Letters are case-insensitive.
pub fn letters_to_column(letters: &str) -> Result<u32> {
    if letters.is_empty() {
        return Err(Error::InvalidFormat("empty column letters".into()));
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(Error::InvalidFormat(format!(
                "invalid column letter '{}'",
                c
            )));
        }
        let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        col = col
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| Error::InvalidFormat(format!("column '{}' is too large", letters)))?;
    }

    Ok(col)
}

/// Parse a cell reference like `A1` or `bc123` into 1-based `(row, col)`.
///
/// The text must match `^[A-Za-z]+[0-9]+$`. A row of `0` parses; range
/// construction rejects it later as an invalid range.
///
/// ```
/// use sheet_cache_core::parse_cell_reference;
///
/// assert_eq!(parse_cell_reference("A1").unwrap(), (1, 1));
/// assert_eq!(parse_cell_reference("AA10").unwrap(), (10, 27));
/// assert!(parse_cell_reference("1A").is_err());
/// ```
pub fn parse_cell_reference(cell_ref: &str) -> Result<(u32, u32)> {
    let bytes = cell_ref.as_bytes();
    let letters_end = bytes
        .iter()
        .position(|b| !b.is_ascii_alphabetic())
        .unwrap_or(bytes.len());

    let (letters, digits) = cell_ref.split_at(letters_end);
    if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidFormat(format!(
            "invalid cell reference format: '{}'",
            cell_ref
        )));
    }

    let col = letters_to_column(letters)?;
    let row: u32 = digits.parse().map_err(|_| {
        Error::InvalidFormat(format!("row number out of range in '{}'", cell_ref))
    })?;

    Ok((row, col))
}

/// Format a 1-based `(row, col)` as an A1 cell reference
pub fn cell_to_a1(row: u32, col: u32) -> String {
    format!("{}{}", column_to_letters(col), row)
}

/// Qualify an A1 range with its sheet name, as sent to a fetcher (`Sheet1!A1:B2`)
pub fn sheet_qualified(sheet_name: &str, range_a1: &str) -> String {
    format!("{}!{}", sheet_name, range_a1)
}
