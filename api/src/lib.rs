pub mod cache;
pub mod cell;
pub mod client;
pub mod decode;
pub mod lookup;
pub mod placement;
pub mod resolver;
pub mod sheets;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use resolver::{ResolveError, SheetSession, UserResolver};

// ---------------------------------------------------------------------------
// Raw sheet data, cells exactly as the data source hands them over
// ---------------------------------------------------------------------------

/// A single spreadsheet value.
///
/// Sheets returns unformatted values as JSON strings, numbers or booleans;
/// `null` and positions past the end of a short row both read as `Empty`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    Text(String),
    #[default]
    Empty,
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_owned())
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Decimal(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Boolean(value)
    }
}

/// One row of a fetched range. Never mutated after fetch.
pub type RawRow = Vec<Cell>;

/// Borrow the cell at `idx`, treating a truncated row as empty there.
pub fn cell_at(row: &[Cell], idx: usize) -> &Cell {
    static EMPTY: Cell = Cell::Empty;
    row.get(idx).unwrap_or(&EMPTY)
}

// ---------------------------------------------------------------------------
// Domain types
// ---------------------------------------------------------------------------

/// Consolidated MT Career statistics for one player.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct User {
    pub username: String,
    /// Tournament the player first entered ("2019MT1"), provisional mark removed.
    pub first_tournament: String,
    pub tourney_count: i64,
    pub win_count: i64,
    pub lose_count: i64,
    pub draft_points: f64,
    /// Best (numerically lowest) placement ever; `None` until the player places.
    pub highest_position: Option<u32>,
}

impl User {
    /// Value shown by the legacy title cards when a player never placed.
    pub const NO_PLACEMENT: u32 = 9999;

    pub fn highest_position_or_sentinel(&self) -> u32 {
        self.highest_position.unwrap_or(Self::NO_PLACEMENT)
    }
}

/// Entrant totals read from the tournament summary block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Entrants {
    /// Entrants summed over every tournament so far.
    pub total: u32,
    /// Entrants of the most recent tournament.
    pub latest: u32,
}

// ---------------------------------------------------------------------------
// Layout configuration: where things live inside the spreadsheet
// ---------------------------------------------------------------------------

/// An open-ended range: the last row is only known once entrants are counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRange {
    pub sheet_name: String,
    pub first_column: String,
    pub last_column: String,
    pub first_row: u32,
}

impl SheetRange {
    pub fn new(sheet_name: &str, first_column: &str, last_column: &str, first_row: u32) -> Self {
        Self {
            sheet_name: sheet_name.to_owned(),
            first_column: first_column.to_owned(),
            last_column: last_column.to_owned(),
            first_row,
        }
    }

    /// Close the range at `last_row`, never above its own first row.
    pub fn through(&self, last_row: u32) -> A1Range {
        A1Range {
            sheet_name: self.sheet_name.clone(),
            first_column: self.first_column.clone(),
            first_row: self.first_row,
            last_column: self.last_column.clone(),
            last_row: last_row.max(self.first_row),
        }
    }
}

/// A closed rectangular range, rendered in A1 notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Range {
    pub sheet_name: String,
    pub first_column: String,
    pub first_row: u32,
    pub last_column: String,
    pub last_row: u32,
}

impl fmt::Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Always quoted: names like "A1" or "R1C1" would read as cell references.
        write!(
            f,
            "'{}'!{}{}:{}{}",
            self.sheet_name.replace('\'', "''"),
            self.first_column,
            self.first_row,
            self.last_column,
            self.last_row
        )
    }
}

/// Column positions inside a participation ("MT Career") row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub first_tournament: usize,
    pub username: usize,
    pub tourney_count: usize,
    pub win_count: usize,
    pub lose_count: usize,
    pub draft_points: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            first_tournament: 0,
            username: 1,
            tourney_count: 2,
            win_count: 3,
            lose_count: 4,
            draft_points: 7,
        }
    }
}

/// Everything the resolver needs to know about the spreadsheet's shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    /// Summary block; total entrants in its first cell, latest in its last.
    pub tourney_info: SheetRange,
    /// Participation table, one row per player.
    pub user_info: SheetRange,
    /// Standings table; the first row is the placement header.
    pub standings: SheetRange,
    pub columns: ColumnLayout,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            tourney_info: SheetRange::new("STATS", "C", "F", 16),
            user_info: SheetRange::new("MT Career", "A", "H", 2),
            standings: SheetRange::new("MT Career Standings", "A", "S", 1),
            columns: ColumnLayout::default(),
        }
    }
}
