use crate::state::messages::{LookupRequest, LookupResponse};
use log::{debug, error};
use mtcareers::client::RangeFetcher;
use mtcareers::{ResolveError, SheetSession, UserResolver};
use tokio::sync::mpsc;

/// Sole owner of the sheet session. Requests are served in arrival order, so
/// every lookup after the first one is answered from the session's cache.
pub struct LookupWorker<F> {
    session: SheetSession<F>,
    resolver: UserResolver,
    requests: mpsc::Receiver<LookupRequest>,
    responses: mpsc::Sender<LookupResponse>,
}

impl<F: RangeFetcher> LookupWorker<F> {
    pub fn new(
        session: SheetSession<F>,
        resolver: UserResolver,
        requests: mpsc::Receiver<LookupRequest>,
        responses: mpsc::Sender<LookupResponse>,
    ) -> Self {
        Self { session, resolver, requests, responses }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            let response = match request {
                LookupRequest::Resolve { username } => self.handle_resolve(username).await,
                LookupRequest::Warm => self.handle_warm().await,
            };

            debug!("lookup request complete");
            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send lookup response: {e}");
                break;
            }
        }
        debug!("lookup worker shutting down");
    }

    async fn handle_resolve(&self, username: String) -> LookupResponse {
        debug!("resolving {username}");
        match self.resolver.resolve(&self.session, &username).await {
            Ok(user) => LookupResponse::Resolved { user },
            Err(ResolveError::UserNotFound(_)) => LookupResponse::NotFound { username },
            Err(e) => {
                error!("lookup of {username} failed: {e}");
                LookupResponse::Error { message: format!("{username}: {e}") }
            }
        }
    }

    async fn handle_warm(&self) -> LookupResponse {
        debug!("reading entrant totals of {}", self.session.spreadsheet_id());
        match self.resolver.fetch_tourney_aggregate(&self.session).await {
            Ok(entrants) => LookupResponse::Warmed { entrants },
            Err(e) => LookupResponse::Error { message: e.to_string() },
        }
    }
}
