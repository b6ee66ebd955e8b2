//! Google Sheets v4 wire types: serde shapes for `spreadsheets.values.get`.
//! Endpoint: https://sheets.googleapis.com/v4/spreadsheets/{id}/values/{range}
use crate::RawRow;
use serde::Deserialize;

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    /// The range actually returned, in A1 notation (may be narrower than asked).
    pub range: Option<String>,
    pub major_dimension: Option<String>,
    /// Absent altogether when the range holds no values.
    #[serde(default)]
    pub values: Vec<RawRow>,
}

// ---------------------------------------------------------------------------
// Error envelope returned alongside non-2xx statuses
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ErrorEnvelope {
    pub error: Option<GoogleError>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct GoogleError {
    pub code: Option<u16>,
    pub message: Option<String>,
    pub status: Option<String>,
}

impl ErrorEnvelope {
    /// "PERMISSION_DENIED: The caller does not have permission", or whatever
    /// part of it the body carried.
    pub fn summary(&self) -> Option<String> {
        let err = self.error.as_ref()?;
        match (err.status.as_deref(), err.message.as_deref()) {
            (Some(status), Some(message)) => Some(format!("{status}: {message}")),
            (None, Some(message)) => Some(message.to_owned()),
            (Some(status), None) => Some(status.to_owned()),
            (None, None) => None,
        }
    }
}
