use mtcareers::{Entrants, User};
use serde::Serialize;

/// `1st`, `2nd`, `3rd`, `4th` ... `11th`, `12th`, `13th`, `21st`.
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

pub fn title_card(user: &User) -> String {
    let best = match user.highest_position {
        Some(rank) => ordinal(rank),
        None => "not placed yet".to_owned(),
    };
    let draft_points = format_points(user.draft_points);

    format!(
        "{}\n  {:<18}{}\n  {:<18}{}\n  {:<18}{}-{}\n  {:<18}{}\n  {:<18}{}",
        user.username,
        "first tournament",
        user.first_tournament,
        "tournaments",
        user.tourney_count,
        "record",
        user.win_count,
        user.lose_count,
        "draft points",
        draft_points,
        "best placement",
        best,
    )
}

pub fn entrants_summary(entrants: &Entrants) -> String {
    format!(
        "{} entrants across all tournaments, {} in the latest",
        entrants.total, entrants.latest
    )
}

/// Drops a trailing `.0` so whole numbers read as integers.
fn format_points(points: f64) -> String {
    if points.fract() == 0.0 && points.abs() < 1e15 {
        format!("{}", points as i64)
    } else {
        format!("{points}")
    }
}

/// One JSON document per line.
pub fn json_line<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string(value)
}
