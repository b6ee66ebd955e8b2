use crate::sheets::{ErrorEnvelope, ValueRange};
use crate::{A1Range, RawRow};
use log::debug;
use reqwest::{Client, StatusCode, Url};
use std::fmt;
use std::future::Future;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const SHEETS_API: &str = "https://sheets.googleapis.com";

/// Anything that can hand over a rectangular block of spreadsheet cells.
///
/// The resolver doesn't care how authentication or transport happen; tests
/// plug in canned rows, the binary plugs in [`SheetsApi`].
pub trait RangeFetcher {
    fn fetch_range(
        &self,
        spreadsheet_id: &str,
        range: &A1Range,
    ) -> impl Future<Output = ApiResult<Vec<RawRow>>> + Send;
}

/// Already-issued Google credentials. Obtaining and renewing them is someone
/// else's job.
#[derive(Clone)]
pub enum Credentials {
    ApiKey(String),
    AccessToken(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ApiKey(_) => write!(f, "ApiKey(..)"),
            Credentials::AccessToken(_) => write!(f, "AccessToken(..)"),
        }
    }
}

/// Google Sheets v4 client reading unformatted cell values.
#[derive(Debug, Clone)]
pub struct SheetsApi {
    client: Client,
    base_url: String,
    credentials: Credentials,
    timeout: Duration,
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api { status: StatusCode, message: String, url: String },
    Parsing(reqwest::Error, String),
    NotFound(String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api { status, message, url } => {
                write!(f, "API error for {url}: {status}: {message}")
            }
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Network(e, _) | ApiError::Parsing(e, _) => Some(e),
            _ => None,
        }
    }
}

impl SheetsApi {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            client: Client::builder()
                .user_agent("mttitlecard/0.1 (MT Career title cards)")
                .build()
                .unwrap_or_default(),
            base_url: SHEETS_API.to_owned(),
            credentials,
            timeout: Duration::from_secs(10),
        }
    }

    /// Point the client somewhere else (a proxy, or a mock server in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}` with the range
    /// percent-encoded as a single path segment.
    fn values_url(&self, spreadsheet_id: &str, range: &A1Range) -> ApiResult<Url> {
        let range = range.to_string();
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::Other(format!("invalid base url {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Other(format!("base url {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet_id, "values", range.as_str()]);
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("valueRenderOption", "UNFORMATTED_VALUE")
                .append_pair("majorDimension", "ROWS");
            if let Credentials::ApiKey(key) = &self.credentials {
                query.append_pair("key", key);
            }
        }
        Ok(url)
    }

    async fn get_values(&self, url: Url) -> ApiResult<ValueRange> {
        // Never echo the API key back in error messages.
        let shown = format!("{}{}", url.origin().ascii_serialization(), url.path());

        let mut request = self.client.get(url).timeout(self.timeout);
        if let Credentials::AccessToken(token) = &self.credentials {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e, shown.clone()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<ValueRange>()
                .await
                .map_err(|e| ApiError::Parsing(e, shown));
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .ok()
            .and_then(|env| env.summary())
            .unwrap_or(body);

        if status == StatusCode::NOT_FOUND {
            Err(ApiError::NotFound(format!("{shown}: {message}")))
        } else {
            Err(ApiError::Api { status, message, url: shown })
        }
    }
}

impl RangeFetcher for SheetsApi {
    async fn fetch_range(&self, spreadsheet_id: &str, range: &A1Range) -> ApiResult<Vec<RawRow>> {
        let url = self.values_url(spreadsheet_id, range)?;
        debug!("fetching {range} from spreadsheet {spreadsheet_id}");
        let values = self.get_values(url).await?;
        Ok(values.values)
    }
}
