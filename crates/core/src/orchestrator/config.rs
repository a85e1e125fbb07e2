//! Download orchestrator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the download orchestrator and the engine around it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Pause after adding a magnet or selecting files, before reading the
    /// torrent back (milliseconds). The provider needs a moment to settle.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// How long an item rests after an exhausted attempt (seconds).
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,

    /// How many existing remote torrents to scan when looking for a
    /// previously started download.
    #[serde(default = "default_existing_limit")]
    pub existing_torrents_limit: u32,

    /// Download files locally. When disabled, releases are only added to the
    /// provider and left for it to fetch.
    #[serde(default = "default_stream")]
    pub stream: bool,
}

fn default_settle_delay() -> u64 {
    2000 // 2 seconds
}

fn default_cooldown() -> u64 {
    3600 // 1 hour
}

fn default_existing_limit() -> u32 {
    200
}

fn default_stream() -> bool {
    true
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay(),
            cooldown_secs: default_cooldown(),
            existing_torrents_limit: default_existing_limit(),
            stream: default_stream(),
        }
    }
}

impl OrchestratorConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn with_settle_delay_ms(mut self, ms: u64) -> Self {
        self.settle_delay_ms = ms;
        self
    }

    pub fn with_cooldown_secs(mut self, secs: u64) -> Self {
        self.cooldown_secs = secs;
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}
