use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single page request.
///
/// Every variant is recoverable by retrying the same offset; the
/// extractor does not distinguish transient from permanent causes.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection failure, timeout, or a body that could not be read.
    #[error("request failed: {0}")]
    Transport(String),

    /// The API answered with a non-2xx status.
    #[error("HTTP {status}")]
    Status { status: StatusCode, body: String },

    /// The body was not the expected `{"records": [...], "total": ...}` object.
    #[error("could not decode response: {reason}")]
    Decode { reason: String, body: String },
}

impl FetchError {
    /// Raw response body, when the failure carried one.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Transport(_) => None,
            Self::Status { body, .. } | Self::Decode { body, .. } => Some(body),
        }
    }

    /// Short label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "Request Error",
            Self::Status { .. } => "HTTP Error",
            Self::Decode { .. } => "JSON Decode Error",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
