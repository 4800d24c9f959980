// Error types module

use thiserror::Error;

use crate::fetcher::FetchError;
use crate::image_optimizer::ImageError;

/// Terminal failure of one proxied request
///
/// Each variant maps to exactly one HTTP status through
/// [`ProxyError::to_http_status`]; the `Display` output is sent to the
/// caller as the plain-text response body.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Caller-supplied query parameters are malformed
    #[error("{0}")]
    InvalidRequest(String),

    /// Remote source unreachable, timed out, or answered with a non-2xx status
    #[error("download failed: {message}")]
    FetchFailed {
        /// Remote status to pass through, when the remote answered
        status: Option<u16>,
        message: String,
    },

    /// Remote body exceeds the configured source size limit
    #[error("download failed: source exceeds {max_bytes} bytes")]
    SourceTooLarge { max_bytes: usize },

    /// Decode, resize or encode failure
    #[error("image: {0}")]
    Image(#[from] ImageError),

    /// Processing task could not be joined
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        ProxyError::InvalidRequest(message.into())
    }

    /// Maps the error to the HTTP status written to the caller
    ///
    /// Remote non-2xx statuses are forwarded unchanged; transport failures
    /// are reported as 400 since the caller chose the URL.
    pub fn to_http_status(&self) -> u16 {
        match self {
            ProxyError::InvalidRequest(_) => 400,
            ProxyError::FetchFailed { status, .. } => status.unwrap_or(400),
            ProxyError::SourceTooLarge { .. } => 413,
            ProxyError::Image(err) => err.to_http_status(),
            ProxyError::Internal(_) => 500,
        }
    }
}

impl From<FetchError> for ProxyError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Status { status, .. } => ProxyError::FetchFailed {
                status: Some(status),
                message: err.to_string(),
            },
            FetchError::Transport(_) => ProxyError::FetchFailed {
                status: None,
                message: err.to_string(),
            },
            FetchError::TooLarge { max_bytes } => ProxyError::SourceTooLarge { max_bytes },
        }
    }
}
