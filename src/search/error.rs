//! Error types for the remote search client.

/// A remote search request failed.
///
/// A response that parses but lacks the expected nesting is not an error; see
/// [`crate::search::extract_hits`].
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("missing site in search target")]
    MissingSite,

    #[error("missing token in search target")]
    MissingToken,

    #[error("invalid search endpoint `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to send search request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("search request failed: HTTP {status}")]
    Status { status: u16, body: String },

    #[error("empty response body from search API")]
    EmptyBody,

    #[error("failed to parse search response: {reason}")]
    MalformedJson { reason: String },
}

impl SearchError {
    /// True when the request never left the process because the caller's
    /// input was incomplete.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            SearchError::MissingSite
                | SearchError::MissingToken
                | SearchError::InvalidUrl { .. }
                | SearchError::InvalidHeader(_)
        )
    }
}
