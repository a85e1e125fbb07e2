//! Configuration for the download fetcher.

use serde::{Deserialize, Serialize};

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Write buffer size in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Bytes between progress log lines.
    #[serde(default = "default_progress_interval")]
    pub progress_interval_bytes: u64,

    /// Allowed relative size difference, in percent of the expected size.
    #[serde(default = "default_tolerance_percent")]
    pub size_tolerance_percent: u32,

    /// Lower bound for the allowed size difference.
    #[serde(default = "default_tolerance_floor")]
    pub size_tolerance_floor_bytes: u64,

    /// Transfers smaller than this with a text-like content type are suspicious.
    #[serde(default = "default_suspicious_size")]
    pub suspicious_size_bytes: u64,

    /// Retry a suspicious transfer once with a byte-range request.
    #[serde(default = "default_true")]
    pub range_retry: bool,

    /// Connect timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_buffer_size() -> usize {
    16 * 1024 * 1024 // 16 MB
}

fn default_progress_interval() -> u64 {
    500 * 1024 * 1024
}

fn default_tolerance_percent() -> u32 {
    5
}

fn default_tolerance_floor() -> u64 {
    10 * 1024 * 1024
}

fn default_suspicious_size() -> u64 {
    1024 * 1024
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("debridarr/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            progress_interval_bytes: default_progress_interval(),
            size_tolerance_percent: default_tolerance_percent(),
            size_tolerance_floor_bytes: default_tolerance_floor(),
            suspicious_size_bytes: default_suspicious_size(),
            range_retry: true,
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl FetcherConfig {
    /// Sets the size tolerance percent.
    pub fn with_tolerance_percent(mut self, percent: u32) -> Self {
        self.size_tolerance_percent = percent;
        self
    }

    /// Enables or disables the byte-range retry.
    pub fn with_range_retry(mut self, enabled: bool) -> Self {
        self.range_retry = enabled;
        self
    }

    /// Sets the write buffer size.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Allowed absolute difference for an expected size: `max(pct, floor)`.
    pub fn size_tolerance(&self, expected: u64) -> u64 {
        let relative = (expected as u128 * self.size_tolerance_percent as u128 / 100) as u64;
        relative.max(self.size_tolerance_floor_bytes)
    }
}
