//! Error types for the placer module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching and placing a file.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP request could not be sent or the body could not be read.
    #[error("Request failed for {url}: {message}")]
    Request { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Failed to create a destination or staging directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to move the staged file into place.
    #[error("Failed to move file from {source} to {destination}")]
    MoveFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Final size is outside the tolerance around the expected size.
    #[error("Size mismatch: expected {expected} bytes, got {actual} (tolerance {tolerance})")]
    SizeMismatch {
        expected: u64,
        actual: u64,
        tolerance: u64,
    },

    /// A tiny transfer that looks like an error page rather than media.
    #[error("Suspicious transfer of {bytes} bytes ({content_type})")]
    SuspiciousTransfer { bytes: u64, content_type: String },

    /// No downloadable file passed best-file selection.
    #[error("No suitable file to download")]
    NoSuitableFile,

    /// The release carries no link to fetch.
    #[error("Release has no links")]
    NoLinks,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Creates a move failed error.
    pub fn move_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::MoveFailed {
            source,
            destination,
            error,
        }
    }

    /// Whether a later attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request { .. } | Self::Io(_) | Self::MoveFailed { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Request {
            url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            message: err.to_string(),
        }
    }
}
