use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request's cancellation token fired. Not an application error:
    /// callers drop it silently (a debug log at most).
    #[error("Request cancelled")]
    Cancelled,

    #[error("Server returned status {status}")]
    Status { status: u16 },

    #[error("Unexpected response body: {details}")]
    Decode { details: String },

    #[error("Invalid URL: {details}")]
    Url { details: String },
}

impl ApiError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}
