use crate::cache::RangeCache;
use crate::cell::{self, CellError};
use crate::client::{ApiError, RangeFetcher};
use crate::decode::{DecodeError, decode_user};
use crate::lookup::{self, CaseSensitivity};
use crate::placement::{self, HeaderError};
use crate::{A1Range, Entrants, RawRow, SheetLayout, User};
use log::{debug, info};
use std::fmt;
use tokio::sync::OnceCell;

/// Which of the three downloads a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStep {
    TourneyInfo,
    Participation,
    Standings,
}

impl fmt::Display for FetchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStep::TourneyInfo => write!(f, "tournament info"),
            FetchStep::Participation => write!(f, "participation table"),
            FetchStep::Standings => write!(f, "standings table"),
        }
    }
}

#[derive(Debug)]
pub enum ResolveError {
    /// The data source failed.
    Fetch { step: FetchStep, range: String, source: ApiError },
    /// The data source answered with nothing at all.
    EmptyRange { step: FetchStep, range: String },
    /// The entrant totals couldn't be read as counts.
    Entrants(CellError),
    Header(HeaderError),
    Decode(DecodeError),
    /// The player's standings row holds something other than a placement.
    Placement { username: String, source: CellError },
    /// The player isn't in the participation table.
    UserNotFound(String),
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::UserNotFound(_))
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Fetch { step, range, source } => {
                write!(f, "failed to fetch the {step} ({range}): {source}")
            }
            ResolveError::EmptyRange { step, range } => {
                write!(f, "the {step} ({range}) came back empty")
            }
            ResolveError::Entrants(e) => write!(f, "failed to read the entrant totals: {e}"),
            ResolveError::Header(e) => write!(f, "failed to index the standings header: {e}"),
            ResolveError::Decode(e) => write!(f, "failed to decode the participation row: {e}"),
            ResolveError::Placement { username, source } => {
                write!(f, "failed to read the placements of {username}: {source}")
            }
            ResolveError::UserNotFound(name) => write!(f, "user {name:?} not found"),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Fetch { source, .. } => Some(source),
            ResolveError::Entrants(e) | ResolveError::Placement { source: e, .. } => Some(e),
            ResolveError::Header(e) => Some(e),
            ResolveError::Decode(e) => Some(e),
            ResolveError::EmptyRange { .. } | ResolveError::UserNotFound(_) => None,
        }
    }
}

impl From<HeaderError> for ResolveError {
    fn from(e: HeaderError) -> Self {
        ResolveError::Header(e)
    }
}

impl From<DecodeError> for ResolveError {
    fn from(e: DecodeError) -> Self {
        ResolveError::Decode(e)
    }
}

/// One spreadsheet being read: the access handle, its id, and everything
/// downloaded from it so far.
#[derive(Debug)]
pub struct SheetSession<F> {
    fetcher: F,
    spreadsheet_id: String,
    entrants: OnceCell<Entrants>,
    cache: RangeCache,
}

impl<F: RangeFetcher> SheetSession<F> {
    pub fn new(fetcher: F, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            fetcher,
            spreadsheet_id: spreadsheet_id.into(),
            entrants: OnceCell::new(),
            cache: RangeCache::new(),
        }
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// Entrant totals, once fetched.
    pub fn entrants(&self) -> Option<Entrants> {
        self.entrants.get().copied()
    }

    pub fn cache(&self) -> &RangeCache {
        &self.cache
    }

    async fn fetch(&self, step: FetchStep, range: A1Range) -> Result<Vec<RawRow>, ResolveError> {
        let rows = self
            .fetcher
            .fetch_range(&self.spreadsheet_id, &range)
            .await
            .map_err(|source| ResolveError::Fetch { step, range: range.to_string(), source })?;

        if rows.is_empty() {
            return Err(ResolveError::EmptyRange { step, range: range.to_string() });
        }
        info!("fetched {} rows of the {step} ({range})", rows.len());
        Ok(rows)
    }
}

/// Answers "what are this player's MT Career statistics?".
#[derive(Debug, Clone, Default)]
pub struct UserResolver {
    layout: SheetLayout,
}

impl UserResolver {
    pub fn new(layout: SheetLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    /// Read the entrant totals, once per session. Exposed so callers can warm
    /// a session before the first lookup.
    pub async fn fetch_tourney_aggregate<F: RangeFetcher>(
        &self,
        session: &SheetSession<F>,
    ) -> Result<Entrants, ResolveError> {
        let info = &self.layout.tourney_info;
        session
            .entrants
            .get_or_try_init(|| async {
                let range = info.through(info.first_row + 1);
                let rows = session.fetch(FetchStep::TourneyInfo, range.clone()).await?;
                let (Some(first), Some(last)) = (rows[0].first(), rows[0].last()) else {
                    return Err(ResolveError::EmptyRange {
                        step: FetchStep::TourneyInfo,
                        range: range.to_string(),
                    });
                };
                let entrants = Entrants {
                    total: cell::to_count(first).map_err(ResolveError::Entrants)?,
                    latest: cell::to_count(last).map_err(ResolveError::Entrants)?,
                };
                debug!(
                    "{} entrants in total, {} in the latest tournament",
                    entrants.total, entrants.latest
                );
                Ok::<_, ResolveError>(entrants)
            })
            .await
            .copied()
    }

    /// Look a player up by name, case-insensitively.
    ///
    /// A player absent from the participation table is a
    /// [`ResolveError::UserNotFound`]; a player with no placement yet is not
    /// an error and comes back with `highest_position: None`.
    pub async fn resolve<F: RangeFetcher>(
        &self,
        session: &SheetSession<F>,
        username: &str,
    ) -> Result<User, ResolveError> {
        let entrants = self.fetch_tourney_aggregate(session).await?;

        // The entrant total is a generous upper bound on the rows in use.
        let participation = session
            .cache
            .participation_or_fetch(|| {
                session.fetch(FetchStep::Participation, self.layout.user_info.through(entrants.total))
            })
            .await?;
        let standings = session
            .cache
            .standings_or_fetch(|| {
                session.fetch(FetchStep::Standings, self.layout.standings.through(entrants.total))
            })
            .await?;

        let columns = &self.layout.columns;
        let row = lookup::find_row(
            &participation.rows,
            columns.username,
            username,
            CaseSensitivity::Insensitive,
        )
        .ok_or_else(|| ResolveError::UserNotFound(username.to_owned()))?;
        let mut user = decode_user(row, columns)?;

        let Some(row) =
            lookup::find_row(standings.players(), 0, username, CaseSensitivity::Insensitive)
        else {
            debug!("{username} has no standings row");
            return Ok(user);
        };
        match placement::best_placement(row, &standings.index) {
            Ok(Some(rank)) => user.highest_position = Some(rank),
            Ok(None) => debug!("{username} has no placement yet"),
            Err(source) => {
                return Err(ResolveError::Placement { username: user.username, source });
            }
        }

        Ok(user)
    }
}
