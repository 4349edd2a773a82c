//! Cell references and sheet naming rules.

use crate::error::{TableError, TableResult};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Longest sheet name common spreadsheet formats accept.
pub const MAX_SHEET_NAME: usize = 31;

/// Truncate a sheet name to `MAX_SHEET_NAME` characters.
///
/// Truncation is by character, so multi-byte names never split mid-codepoint,
/// and the same input always yields the same name.
pub fn truncate_sheet_name(name: &str) -> Cow<'_, str> {
    match name.char_indices().nth(MAX_SHEET_NAME) {
        None => Cow::Borrowed(name),
        Some((cut, _)) => {
            let short = &name[..cut];
            tracing::warn!(
                original = %name,
                truncated = %short,
                "sheet name exceeds {MAX_SHEET_NAME} characters"
            );
            Cow::Borrowed(short)
        }
    }
}

/// Zero-based (row, column) anchor parsed from an `A1`-style reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub const A1: CellRef = CellRef { row: 0, col: 0 };
    pub const A2: CellRef = CellRef { row: 1, col: 0 };

    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl FromStr for CellRef {
    type Err = TableError;

    fn from_str(s: &str) -> TableResult<Self> {
        let invalid = || TableError::InvalidCellRef {
            reference: s.to_string(),
        };
        let s_trim = s.trim();
        let split = s_trim
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = s_trim.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }
        let col = letters
            .chars()
            .try_fold(0usize, |acc, c| {
                acc.checked_mul(26)?
                    .checked_add(c.to_ascii_uppercase() as usize - 'A' as usize + 1)
            })
            .ok_or_else(invalid)?
            - 1;
        let row: usize = digits.parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }
        Ok(Self { row: row - 1, col })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut n = self.col + 1;
        let mut letters = Vec::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push((b'A' + rem as u8) as char);
            n = (n - 1) / 26;
        }
        let col: String = letters.into_iter().rev().collect();
        write!(f, "{}{}", col, self.row + 1)
    }
}
