//! Types for post-download notifications.

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by notification collaborators.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("HTTP {status} from {service}")]
    HttpStatus { service: String, status: u16 },

    #[error("Request timeout")]
    Timeout,
}

impl NotifyError {
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NotifyError::Timeout
        } else {
            NotifyError::ConnectionFailed(e.to_string())
        }
    }
}

/// Asks the media server to rescan its libraries.
#[async_trait]
pub trait LibraryRefresher: Send + Sync {
    fn name(&self) -> &str;

    async fn refresh(&self) -> Result<(), NotifyError>;
}

/// Marks the originating request as fulfilled.
#[async_trait]
pub trait RequestTracker: Send + Sync {
    fn name(&self) -> &str;

    async fn mark_available(&self, request_id: &str) -> Result<(), NotifyError>;
}
