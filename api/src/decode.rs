use crate::cell::{self, CellError};
use crate::{ColumnLayout, RawRow, User, cell_at};
use std::fmt;

/// The participation-row fields a [`User`] is decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Username,
    FirstTournament,
    TourneyCount,
    WinCount,
    LoseCount,
    DraftPoints,
}

impl UserField {
    pub fn label(&self) -> &'static str {
        match self {
            UserField::Username => "username",
            UserField::FirstTournament => "first tournament",
            UserField::TourneyCount => "tournament count",
            UserField::WinCount => "win count",
            UserField::LoseCount => "loss count",
            UserField::DraftPoints => "draft points",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodeError {
    pub field: UserField,
    pub column: usize,
    pub source: CellError,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to decode the {} (column {}): {}",
            self.field.label(),
            self.column,
            self.source
        )
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Decode one participation row. The placement is left unset; it lives in
/// the standings table.
pub fn decode_user(row: &RawRow, columns: &ColumnLayout) -> Result<User, DecodeError> {
    let field = |field: UserField, column: usize| {
        move |source: CellError| DecodeError { field, column, source }
    };

    let username = cell::to_string(cell_at(row, columns.username))
        .map_err(field(UserField::Username, columns.username))?;
    let first_tournament = cell::to_string(cell_at(row, columns.first_tournament))
        .map_err(field(UserField::FirstTournament, columns.first_tournament))?;
    let tourney_count = cell::to_int(cell_at(row, columns.tourney_count))
        .map_err(field(UserField::TourneyCount, columns.tourney_count))?;
    let win_count = cell::to_int(cell_at(row, columns.win_count))
        .map_err(field(UserField::WinCount, columns.win_count))?;
    let lose_count = cell::to_int(cell_at(row, columns.lose_count))
        .map_err(field(UserField::LoseCount, columns.lose_count))?;
    let draft_points = cell::to_float(cell_at(row, columns.draft_points))
        .map_err(field(UserField::DraftPoints, columns.draft_points))?;

    // A leading '.' marks a provisional entry in the sheet.
    let first_tournament = match first_tournament.strip_prefix('.') {
        Some(rest) => rest.to_owned(),
        None => first_tournament,
    };

    Ok(User {
        username,
        first_tournament,
        tourney_count,
        win_count,
        lose_count,
        draft_points,
        highest_position: None,
    })
}
