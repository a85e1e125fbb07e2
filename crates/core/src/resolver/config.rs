//! Configuration for the availability resolver.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the availability resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Delay after each individual hash check in fallback mode.
    #[serde(default = "default_individual_check_delay_ms")]
    pub individual_check_delay_ms: u64,

    /// File-name patterns that mark a file as unwanted.
    #[serde(default = "default_unwanted_patterns")]
    pub unwanted_patterns: Vec<String>,
}

fn default_individual_check_delay_ms() -> u64 {
    1000
}

fn default_unwanted_patterns() -> Vec<String> {
    vec!["sample".to_string(), "trailer".to_string()]
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            individual_check_delay_ms: default_individual_check_delay_ms(),
            unwanted_patterns: default_unwanted_patterns(),
        }
    }
}

impl ResolverConfig {
    pub fn individual_check_delay(&self) -> Duration {
        Duration::from_millis(self.individual_check_delay_ms)
    }

    /// Sets the delay between individual checks.
    pub fn with_individual_check_delay_ms(mut self, ms: u64) -> Self {
        self.individual_check_delay_ms = ms;
        self
    }

    /// Replaces the unwanted patterns.
    pub fn with_unwanted_patterns(mut self, patterns: Vec<String>) -> Self {
        self.unwanted_patterns = patterns;
        self
    }
}
