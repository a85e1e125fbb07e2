//! Types for the download orchestrator.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::debrid::DebridError;
use crate::matcher::PatternError;
use crate::placer::FetchError;

/// Errors that end the attempt on a single release.
///
/// None of these abort the whole item: the orchestrator logs them and moves
/// on to the next candidate.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Debrid provider error.
    #[error("debrid error: {0}")]
    Debrid(#[from] DebridError),

    /// Local transfer or placement error.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Item pattern failed to compile.
    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// Release carries neither a magnet nor a direct link.
    #[error("release has no magnet link: {0}")]
    NoMagnet(String),

    /// The provider gave no usable download link.
    #[error("no unrestricted links for {0}")]
    NoLinks(String),
}

/// Options for one download attempt.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Download files locally instead of only queueing them remotely.
    pub stream: bool,
    /// Title pattern used instead of the item's own deviation pattern.
    pub query: Option<String>,
    /// Accept releases regardless of title match or cached coverage.
    pub force: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            stream: true,
            query: None,
            force: false,
        }
    }
}

impl DownloadOptions {
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Result of a download attempt over an item's releases.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DownloadOutcome {
    /// Files were transferred and placed in the library.
    Downloaded { release: String, paths: Vec<PathBuf> },
    /// The provider accepted the release and is still fetching it.
    Pending { release: String },
    /// Every candidate was rejected or failed.
    Exhausted,
}

impl DownloadOutcome {
    /// Downloaded and pending both count as success for the item.
    pub fn is_success(&self) -> bool {
        !matches!(self, DownloadOutcome::Exhausted)
    }

    pub fn release(&self) -> Option<&str> {
        match self {
            DownloadOutcome::Downloaded { release, .. } | DownloadOutcome::Pending { release } => {
                Some(release)
            }
            DownloadOutcome::Exhausted => None,
        }
    }
}

/// Why a candidate release was passed over without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Title matched neither the item pattern nor the season marker.
    TitleMismatch,
    /// No cached file version covers enough of the wanted files.
    NoQualifyingVersion,
    /// The provider reported no files for the torrent.
    NoFiles,
    /// The release is not cached and the version requires cached content.
    CacheRequired,
    /// The provider can neither serve nor fetch the torrent.
    RemoteUnavailable,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::TitleMismatch => "title mismatch",
            RejectReason::NoQualifyingVersion => "no qualifying cached version",
            RejectReason::NoFiles => "no files reported",
            RejectReason::CacheRequired => "cached content required",
            RejectReason::RemoteUnavailable => "remote torrent unavailable",
        }
    }
}

/// Outcome of trying one candidate release.
#[derive(Debug)]
pub(crate) enum CandidateOutcome {
    Downloaded(Vec<PathBuf>),
    Pending,
    Rejected(RejectReason),
}

/// Outcome of one engine pass over an item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessOutcome {
    /// The item is resting after an earlier exhausted attempt.
    CoolingDown,
    /// A remote download for the item is already in flight.
    InFlight,
    /// A download attempt ran.
    Attempted { download: DownloadOutcome },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_success() {
        assert!(DownloadOutcome::Pending {
            release: "x".to_string()
        }
        .is_success());
        assert!(DownloadOutcome::Downloaded {
            release: "x".to_string(),
            paths: vec![]
        }
        .is_success());
        assert!(!DownloadOutcome::Exhausted.is_success());
        assert_eq!(DownloadOutcome::Exhausted.release(), None);
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let json = serde_json::to_value(DownloadOutcome::Pending {
            release: "Heat.1995".to_string(),
        })
        .unwrap();
        assert_eq!(json["outcome"], "pending");
        assert_eq!(json["release"], "Heat.1995");
    }

    #[test]
    fn test_default_options_stream() {
        let options = DownloadOptions::default();
        assert!(options.stream);
        assert!(!options.force);
        assert!(options.query.is_none());
    }
}
