use mtcareers::{Entrants, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupRequest {
    Resolve { username: String },
    /// Read the entrant totals without looking anybody up.
    Warm,
}

#[derive(Debug)]
pub enum LookupResponse {
    Resolved { user: User },
    NotFound { username: String },
    Warmed { entrants: Entrants },
    Error { message: String },
}

impl LookupResponse {
    pub fn is_failure(&self) -> bool {
        matches!(self, LookupResponse::NotFound { .. } | LookupResponse::Error { .. })
    }
}
