//! Session-wide cache of the two big ranges.
//!
//! Each range is downloaded once per session and never refreshed. Population
//! is single-flight: the first caller fetches while concurrent callers wait on
//! the same result, and a failed fetch leaves the slot empty for a later retry.
use crate::placement::{HeaderError, PlacementIndex};
use crate::RawRow;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::future::Future;
use tokio::sync::OnceCell;

/// The participation table, as downloaded.
#[derive(Debug)]
pub struct Participation {
    pub rows: Vec<RawRow>,
    pub fetched_at: DateTime<Utc>,
}

/// The standings table together with the placement index built from its
/// header row.
#[derive(Debug)]
pub struct Standings {
    /// Header row first, then one row per player.
    pub rows: Vec<RawRow>,
    pub index: PlacementIndex,
    pub fetched_at: DateTime<Utc>,
}

impl Standings {
    pub fn from_rows(rows: Vec<RawRow>) -> Result<Self, HeaderError> {
        let header = rows.first().ok_or(HeaderError::MissingHeader)?;
        let index = PlacementIndex::from_header(header);
        Ok(Self { rows, index, fetched_at: Utc::now() })
    }

    /// Player rows, without the header.
    pub fn players(&self) -> &[RawRow] {
        self.rows.get(1..).unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub struct RangeCache {
    participation: OnceCell<Participation>,
    standings: OnceCell<Standings>,
}

impl RangeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn participation(&self) -> Option<&Participation> {
        self.participation.get()
    }

    pub fn standings(&self) -> Option<&Standings> {
        self.standings.get()
    }

    pub fn is_warm(&self) -> bool {
        self.participation.initialized() && self.standings.initialized()
    }

    pub async fn participation_or_fetch<E, F, Fut>(&self, fetch: F) -> Result<&Participation, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<RawRow>, E>>,
    {
        self.participation
            .get_or_try_init(|| async move {
                debug!("participation range not cached yet");
                let rows = fetch().await?;
                info!("cached {} participation rows", rows.len());
                Ok(Participation { rows, fetched_at: Utc::now() })
            })
            .await
    }

    /// The placement index is built here, once, from the freshly fetched
    /// header. A missing header leaves the slot empty.
    pub async fn standings_or_fetch<E, F, Fut>(&self, fetch: F) -> Result<&Standings, E>
    where
        E: From<HeaderError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<RawRow>, E>>,
    {
        self.standings
            .get_or_try_init(|| async move {
                debug!("standings range not cached yet");
                let standings = Standings::from_rows(fetch().await?)?;
                if standings.index.is_empty() {
                    warn!("no standings header column names a placement; nobody will have one");
                }
                info!(
                    "cached {} standings rows, {} placement columns",
                    standings.players().len(),
                    standings.index.len()
                );
                Ok(standings)
            })
            .await
    }
}
