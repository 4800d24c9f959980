//! Remote image fetcher.
//!
//! Downloads the source image named by the request with a single GET,
//! bounded by the client timeout and by a maximum body size. There are no
//! retries: transient remote failures surface directly to the caller.
//!
//! The response is owned by [`RemoteFetcher::fetch`] and dropped on every
//! return path, so an early failure never leaves a connection checked out.

use bytes::{Bytes, BytesMut};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur while downloading a source image.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS failure, connection refused, timeout, or broken body stream
    #[error("{0}")]
    Transport(String),

    /// The remote answered with a non-2xx status
    #[error("{reason}")]
    Status { status: u16, reason: String },

    /// The body is larger than the configured limit
    #[error("source exceeds {max_bytes} bytes")]
    TooLarge { max_bytes: usize },
}

/// Configuration for the remote fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Whole-request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Maximum accepted body size in bytes.
    pub max_bytes: usize,
}

/// Shared HTTP client for source downloads.
///
/// Cloning is cheap; clones share the same connection pool.
#[derive(Clone)]
pub struct RemoteFetcher {
    http_client: reqwest::Client,
    max_bytes: usize,
}

impl RemoteFetcher {
    /// Create a new fetcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    /// (e.g., TLS configuration issues, system resource exhaustion).
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http_client = builder
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            max_bytes: config.max_bytes,
        })
    }

    /// Download the body at `url`.
    ///
    /// # Errors
    ///
    /// - `Transport` if the request cannot be sent or the body cannot be read
    ///   within the timeout
    /// - `Status` if the remote answers with a non-2xx status
    /// - `TooLarge` if the declared or actual body size exceeds the limit
    pub async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError> {
        let mut response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.to_string(),
            });
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(FetchError::TooLarge {
                    max_bytes: self.max_bytes,
                });
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?
        {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(FetchError::TooLarge {
                    max_bytes: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(url = %url, bytes = body.len(), "Source downloaded");

        Ok(body.freeze())
    }
}
