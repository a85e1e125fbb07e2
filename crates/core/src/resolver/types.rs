//! Types for the availability resolver.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matcher::PatternError;

/// Errors that abort an availability check before any network call.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),
}

/// Summary of one availability check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityReport {
    /// Distinct hashes sent to the provider.
    pub hashes: usize,
    /// Releases dropped for an invalid hash.
    pub dropped: usize,
    /// Direct-link releases that skip the hash check.
    pub skipped_http: usize,
    /// The batch request failed and hashes were checked one by one.
    pub fallback_used: bool,
    /// Individual requests issued in fallback mode.
    pub individual_checks: usize,
    /// Individual requests that failed.
    pub failed: usize,
    /// Releases marked cached.
    pub cached: usize,
}
