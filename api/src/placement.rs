//! Placements from the wide standings table.
//!
//! The standings header names every tournament column by the rank it
//! records ("1st", "2nd", "17th", ...). Rows hold a positive number in each
//! column where the player reached that rank.
use crate::cell::{self, CellError};
use crate::{Cell, RawRow};
use log::debug;
use std::collections::BTreeMap;
use std::fmt;

/// Name and tournament-count columns; never placement columns.
pub const RESERVED_COLUMNS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// The standings range came back without even a header row.
    MissingHeader,
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderError::MissingHeader => write!(f, "standings range has no header row"),
        }
    }
}

impl std::error::Error for HeaderError {}

/// Standings column position → placement rank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementIndex {
    ranks: BTreeMap<usize, u32>,
}

impl PlacementIndex {
    /// Scan the header row, keeping every column whose label is a positive
    /// number followed by a two-letter ordinal suffix. Every other column is
    /// skipped, so a header without ranks yields an empty index.
    pub fn from_header(header: &[Cell]) -> Self {
        let mut ranks = BTreeMap::new();

        for (pos, cell) in header.iter().enumerate().skip(RESERVED_COLUMNS) {
            let Cell::Text(label) = cell else {
                continue;
            };
            match parse_ordinal(label) {
                Some(rank) => {
                    ranks.insert(pos, rank);
                }
                None => debug!("standings column {pos} ({label:?}) is not a placement"),
            }
        }

        Self { ranks }
    }

    /// Rank recorded by the column at `pos`, if it is a placement column.
    pub fn rank_at(&self, pos: usize) -> Option<u32> {
        self.ranks.get(&pos).copied()
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.ranks.iter().map(|(&pos, &rank)| (pos, rank))
    }
}

/// "17th" → 17. Labels shorter than two characters, zero, negative and
/// non-numeric prefixes yield `None`.
fn parse_ordinal(label: &str) -> Option<u32> {
    let (cut, _) = label.char_indices().rev().nth(1)?;
    let rank = label[..cut].parse::<i64>().ok()?;
    u32::try_from(rank).ok().filter(|&r| r > 0)
}

/// Best (lowest) rank across every placement column the player scored in.
///
/// `Ok(None)` means the player has no placement yet, which is not an error.
/// Blank cells are skipped; any other cell that isn't a number is.
pub fn best_placement(row: &RawRow, index: &PlacementIndex) -> Result<Option<u32>, CellError> {
    let mut best: Option<u32> = None;

    for (pos, cell) in row.iter().enumerate().skip(RESERVED_COLUMNS) {
        let Some(rank) = index.rank_at(pos) else {
            continue;
        };
        if is_blank(cell) {
            continue;
        }
        if cell::to_int(cell)? > 0 {
            best = Some(best.map_or(rank, |b| b.min(rank)));
        }
    }

    Ok(best)
}

fn is_blank(cell: &Cell) -> bool {
    match cell {
        Cell::Empty => true,
        Cell::Text(text) => text.is_empty(),
        _ => false,
    }
}
