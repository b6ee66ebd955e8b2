use futures_util::future::join_all;
use mtcareers::client::{ApiError, ApiResult, RangeFetcher};
use mtcareers::decode::UserField;
use mtcareers::resolver::FetchStep;
use mtcareers::{
    A1Range, Cell, Entrants, RawRow, ResolveError, SheetLayout, SheetSession, User, UserResolver,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ---------------------------------------------------------------------------
// A spreadsheet in memory, counting every download
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MockSheet {
    tourney: Vec<RawRow>,
    careers: Vec<RawRow>,
    standings: Vec<RawRow>,
    tourney_calls: AtomicUsize,
    career_calls: AtomicUsize,
    standings_calls: AtomicUsize,
    fail_next_career_fetch: AtomicBool,
    ranges: Mutex<Vec<String>>,
}

impl MockSheet {
    fn calls(&self) -> (usize, usize, usize) {
        (
            self.tourney_calls.load(Ordering::SeqCst),
            self.career_calls.load(Ordering::SeqCst),
            self.standings_calls.load(Ordering::SeqCst),
        )
    }
}

/// Cloneable handle so the test keeps reading the counters after the
/// session takes ownership of its fetcher.
#[derive(Clone)]
struct Fetcher(Arc<MockSheet>);

impl std::ops::Deref for Fetcher {
    type Target = MockSheet;

    fn deref(&self) -> &MockSheet {
        &self.0
    }
}

impl RangeFetcher for Fetcher {
    async fn fetch_range(&self, spreadsheet_id: &str, range: &A1Range) -> ApiResult<Vec<RawRow>> {
        assert_eq!(spreadsheet_id, "mt-career");
        self.ranges.lock().unwrap().push(range.to_string());
        // Give concurrent lookups a chance to pile up behind the first one.
        tokio::time::sleep(Duration::from_millis(20)).await;

        match range.sheet_name.as_str() {
            "STATS" => {
                self.tourney_calls.fetch_add(1, Ordering::SeqCst);
                Ok(self.tourney.clone())
            }
            "MT Career" => {
                self.career_calls.fetch_add(1, Ordering::SeqCst);
                if self.fail_next_career_fetch.swap(false, Ordering::SeqCst) {
                    return Err(ApiError::Other("connection reset".into()));
                }
                Ok(self.careers.clone())
            }
            "MT Career Standings" => {
                self.standings_calls.fetch_add(1, Ordering::SeqCst);
                Ok(self.standings.clone())
            }
            other => Err(ApiError::NotFound(format!("no sheet named {other}"))),
        }
    }
}

fn int(i: i64) -> Cell {
    Cell::Integer(i)
}

fn text(s: &str) -> Cell {
    Cell::from(s)
}

fn career(first: &str, name: &str, count: i64, wins: i64, losses: i64, draft: f64) -> RawRow {
    vec![
        text(first),
        text(name),
        int(count),
        int(wins),
        int(losses),
        text("-"),
        text("-"),
        Cell::Decimal(draft),
    ]
}

/// A small, mostly sorted copy of the real sheet.
fn mock_sheet() -> MockSheet {
    MockSheet {
        tourney: vec![vec![int(219), text(""), text(""), int(31)]],
        careers: vec![
            career(".2021MT4", "Alpha", 1, 0, 1, 0.0),
            career("2019MT1", "gfm", 3, 5, 2, 12.5),
            career("2020MT2", "Kirby", 2, 3, 2, 4.25),
            career("2022MT1", "newcomer", 1, 0, 1, 0.0),
            career("2019MT1", "Zelda", 4, 9, 3, 20.0),
            // Appended out of order, as happens by hand.
            career("2023MT2", "Bravo", 1, 1, 1, 1.5),
        ],
        standings: vec![
            ["Name", "MT#", "1st", "2nd", "3rd", "4th", "Notes"].map(text).to_vec(),
            vec![text("Alpha"), int(1), int(0), int(0), int(0), int(0)],
            vec![text("GFM"), int(3), int(0), int(1), int(0), int(1), text("x")],
            vec![text("Kirby"), int(2), text(""), int(0), int(1)],
            vec![text("Zelda"), int(4), int(1), int(1), int(0), int(0)],
        ],
        ..Default::default()
    }
}

fn session(sheet: &Arc<MockSheet>) -> SheetSession<Fetcher> {
    SheetSession::new(Fetcher(Arc::clone(sheet)), "mt-career")
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resolves_a_consolidated_user() {
    let sheet = Arc::new(mock_sheet());
    let session = session(&sheet);
    let user = UserResolver::default().resolve(&session, "gfm").await.unwrap();

    assert_eq!(
        user,
        User {
            username: "gfm".into(),
            first_tournament: "2019MT1".into(),
            tourney_count: 3,
            win_count: 5,
            lose_count: 2,
            draft_points: 12.5,
            highest_position: Some(2),
        }
    );
}

#[tokio::test]
async fn names_match_case_insensitively() {
    let sheet = Arc::new(mock_sheet());
    let session = session(&sheet);
    let resolver = UserResolver::default();

    let user = resolver.resolve(&session, "ZELDA").await.unwrap();
    assert_eq!(user.username, "Zelda");
    assert_eq!(user.highest_position, Some(1));

    let user = resolver.resolve(&session, "kirby").await.unwrap();
    assert_eq!(user.highest_position, Some(3));
}

#[tokio::test]
async fn unsorted_rows_are_still_found() {
    let sheet = Arc::new(mock_sheet());
    let session = session(&sheet);
    let user = UserResolver::default().resolve(&session, "bravo").await.unwrap();
    assert_eq!(user.first_tournament, "2023MT2");
    assert_eq!(user.draft_points, 1.5);
}

#[tokio::test]
async fn provisional_first_tournament_is_cleaned_up() {
    let sheet = Arc::new(mock_sheet());
    let session = session(&sheet);
    let user = UserResolver::default().resolve(&session, "alpha").await.unwrap();
    assert_eq!(user.first_tournament, "2021MT4");
}

#[tokio::test]
async fn players_without_placements_are_not_errors() {
    let sheet = Arc::new(mock_sheet());
    let session = session(&sheet);
    let resolver = UserResolver::default();

    // Standings row full of zeroes.
    let alpha = resolver.resolve(&session, "Alpha").await.unwrap();
    assert_eq!(alpha.highest_position, None);

    // No standings row at all.
    let newcomer = resolver.resolve(&session, "newcomer").await.unwrap();
    assert_eq!(newcomer.highest_position, None);
    assert_eq!(newcomer.highest_position_or_sentinel(), User::NO_PLACEMENT);
}

#[tokio::test]
async fn unknown_users_are_reported_as_not_found() {
    let sheet = Arc::new(mock_sheet());
    let session = session(&sheet);
    let err = UserResolver::default().resolve(&session, "nobody").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "user \"nobody\" not found");
}

#[tokio::test]
async fn the_standings_header_is_not_a_player() {
    let mut sheet = mock_sheet();
    sheet.careers.push(career("2024MT1", "name", 1, 0, 1, 0.0));
    let sheet = Arc::new(sheet);
    let session = session(&sheet);
    let user = UserResolver::default().resolve(&session, "Name").await.unwrap();
    assert_eq!(user.highest_position, None);
}

// ---------------------------------------------------------------------------
// Caching
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ranges_are_fetched_once_per_session() {
    let sheet = Arc::new(mock_sheet());
    let session = session(&sheet);
    let resolver = UserResolver::default();

    resolver.resolve(&session, "gfm").await.unwrap();
    assert_eq!(sheet.calls(), (1, 1, 1));

    resolver.resolve(&session, "Zelda").await.unwrap();
    resolver.resolve(&session, "nobody").await.unwrap_err();
    resolver.resolve(&session, "gfm").await.unwrap();
    assert_eq!(sheet.calls(), (1, 1, 1));
    assert!(session.cache().is_warm());
}

#[tokio::test]
async fn ranges_are_sized_by_the_entrant_total() {
    let sheet = Arc::new(mock_sheet());
    let session = session(&sheet);
    UserResolver::default().resolve(&session, "gfm").await.unwrap();

    let ranges = sheet.ranges.lock().unwrap().clone();
    assert_eq!(
        ranges,
        vec![
            "'STATS'!C16:F17".to_owned(),
            "'MT Career'!A2:H219".to_owned(),
            "'MT Career Standings'!A1:S219".to_owned(),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_use_fetches_each_range_once() {
    let sheet = Arc::new(mock_sheet());
    let session = Arc::new(session(&sheet));
    let resolver = UserResolver::default();

    let names = ["gfm", "Zelda", "kirby", "alpha", "nobody", "GFM", "bravo", "newcomer"];
    let results = join_all(names.iter().map(|name| resolver.resolve(&session, name))).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 7);
    assert_eq!(sheet.calls(), (1, 1, 1));

    let handles: Vec<_> = names
        .iter()
        .map(|name| {
            let session = Arc::clone(&session);
            let resolver = resolver.clone();
            let name = name.to_string();
            tokio::spawn(async move { resolver.resolve(&session, &name).await.is_ok() })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(sheet.calls(), (1, 1, 1));
}

#[tokio::test]
async fn failed_fetches_are_retried_by_the_next_lookup() {
    let sheet = Arc::new(mock_sheet());
    sheet.fail_next_career_fetch.store(true, Ordering::SeqCst);
    let session = session(&sheet);
    let resolver = UserResolver::default();

    let err = resolver.resolve(&session, "gfm").await.unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Fetch { step: FetchStep::Participation, ref range, .. } if range == "'MT Career'!A2:H219"
    ));
    assert!(session.cache().participation().is_none());

    let user = resolver.resolve(&session, "gfm").await.unwrap();
    assert_eq!(user.highest_position, Some(2));
    assert_eq!(sheet.calls(), (1, 2, 1));
}

#[tokio::test]
async fn entrant_totals_can_be_warmed_separately() {
    let sheet = Arc::new(mock_sheet());
    let session = session(&sheet);
    let resolver = UserResolver::default();

    assert_eq!(session.entrants(), None);
    let entrants = resolver.fetch_tourney_aggregate(&session).await.unwrap();
    assert_eq!(entrants, Entrants { total: 219, latest: 31 });
    assert_eq!(session.entrants(), Some(entrants));
    assert_eq!(sheet.calls(), (1, 0, 0));

    resolver.resolve(&session, "gfm").await.unwrap();
    assert_eq!(sheet.calls(), (1, 1, 1));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_tournament_info_is_fatal() {
    let mut sheet = mock_sheet();
    sheet.tourney.clear();
    let sheet = Arc::new(sheet);
    let session = session(&sheet);

    let err = UserResolver::default().resolve(&session, "gfm").await.unwrap_err();
    assert!(matches!(err, ResolveError::EmptyRange { step: FetchStep::TourneyInfo, .. }));
    assert_eq!(sheet.calls(), (1, 0, 0));
}

#[tokio::test]
async fn unreadable_entrant_totals_are_fatal() {
    let mut sheet = mock_sheet();
    sheet.tourney = vec![vec![text("lots"), int(31)]];
    let sheet = Arc::new(sheet);
    let session = session(&sheet);

    let err = UserResolver::default().fetch_tourney_aggregate(&session).await.unwrap_err();
    assert!(matches!(err, ResolveError::Entrants(_)));
}

#[tokio::test]
async fn a_header_without_ranks_leaves_everyone_unplaced() {
    let mut sheet = mock_sheet();
    sheet.standings[0] = ["Name", "MT#", "xyz", "0th"].map(text).to_vec();
    let sheet = Arc::new(sheet);
    let session = session(&sheet);

    let user = UserResolver::default().resolve(&session, "gfm").await.unwrap();
    assert_eq!(user.username, "gfm");
    assert_eq!(user.win_count, 5);
    assert_eq!(user.highest_position, None);
    assert!(session.cache().standings().is_some_and(|s| s.index.is_empty()));
}

#[tokio::test]
async fn malformed_participation_rows_name_the_field() {
    let mut sheet = mock_sheet();
    sheet.careers[1][2] = text("three");
    let sheet = Arc::new(sheet);
    let session = session(&sheet);

    let err = UserResolver::default().resolve(&session, "gfm").await.unwrap_err();
    let ResolveError::Decode(decode) = err else {
        panic!("expected a decode error, got {err}");
    };
    assert_eq!(decode.field, UserField::TourneyCount);
}

#[tokio::test]
async fn malformed_placements_are_fatal() {
    let mut sheet = mock_sheet();
    sheet.standings[2][3] = text("DQ");
    let sheet = Arc::new(sheet);
    let session = session(&sheet);

    let err = UserResolver::default().resolve(&session, "gfm").await.unwrap_err();
    assert!(matches!(err, ResolveError::Placement { ref username, .. } if username == "gfm"));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn custom_layouts_are_honoured() {
    let mut layout = SheetLayout::default();
    layout.columns.username = 0;
    layout.columns.first_tournament = 1;
    let mut sheet = mock_sheet();
    for row in &mut sheet.careers {
        row.swap(0, 1);
    }
    let sheet = Arc::new(sheet);
    let session = session(&sheet);

    let user = UserResolver::new(layout).resolve(&session, "gfm").await.unwrap();
    assert_eq!(user.username, "gfm");
    assert_eq!(user.first_tournament, "2019MT1");
}
