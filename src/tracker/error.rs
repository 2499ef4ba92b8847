use thiserror::Error;

/// Everything that can go wrong between a tracker action and the service.
///
/// The `Display` output is what a dashboard shows in its error banner, so
/// server messages and transport errors are rendered verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("{0}")]
    Transport(String),
    /// The service answered with a non-2xx status.
    #[error("{message}")]
    Server { status: u16, message: String },
    /// The response body did not match the expected shape.
    #[error("Invalid response from server: {0}")]
    Decode(String),
    /// Refused locally before any request was sent.
    #[error("{0}")]
    Invalid(String),
}

impl ApiError {
    /// HTTP 409: the action raced with another actor or used a stale view.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Server { status: 409, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}
