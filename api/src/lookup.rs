//! Finding a player's row by name.
//!
//! The sheets are kept roughly alphabetical by hand, so a binary search is
//! tried first. When it misses, every row is scanned before the name is
//! declared absent: an unsorted sheet is slower, never wrong.
use crate::{RawRow, cell, cell_at};
use log::{debug, warn};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaseSensitivity {
    Sensitive,
    #[default]
    Insensitive,
}

impl CaseSensitivity {
    fn key(self, name: &str) -> String {
        match self {
            CaseSensitivity::Sensitive => name.to_owned(),
            CaseSensitivity::Insensitive => name.to_lowercase(),
        }
    }
}

/// Name stored at `column`, if the cell can be read as text at all.
fn row_name(row: &RawRow, column: usize) -> Option<String> {
    cell::to_string(cell_at(row, column)).ok()
}

/// Phase one: binary search assuming `rows` are sorted by name.
///
/// Unreadable name cells sort first. On unsorted data this may miss a row
/// that is present, but never returns a row that doesn't match.
pub fn binary_search(
    rows: &[RawRow],
    column: usize,
    name: &str,
    case: CaseSensitivity,
) -> Option<usize> {
    let target = case.key(name);
    rows.binary_search_by(|row| match row_name(row, column) {
        Some(candidate) => case.key(&candidate).cmp(&target),
        None => Ordering::Less,
    })
    .ok()
}

/// Phase two: scan every row.
pub fn linear_search(
    rows: &[RawRow],
    column: usize,
    name: &str,
    case: CaseSensitivity,
) -> Option<usize> {
    let target = case.key(name);
    rows.iter().position(|row| {
        row_name(row, column).is_some_and(|candidate| case.key(&candidate) == target)
    })
}

/// Binary search, falling back to a full scan.
pub fn find_row<'a>(
    rows: &'a [RawRow],
    column: usize,
    name: &str,
    case: CaseSensitivity,
) -> Option<&'a RawRow> {
    if let Some(idx) = binary_search(rows, column, name, case) {
        return rows.get(idx);
    }

    debug!("binary search missed {name:?}, scanning {} rows", rows.len());
    let idx = linear_search(rows, column, name, case)?;
    warn!("{name:?} found at row {idx} by linear scan; the sheet is not sorted by name");
    rows.get(idx)
}
