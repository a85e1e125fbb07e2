//! Jellyfin library refresh.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::JellyfinConfig;

use super::{LibraryRefresher, NotifyError};

const TOKEN_HEADER: &str = "X-MediaBrowser-Token";

/// Triggers a full library scan on a Jellyfin server.
pub struct JellyfinRefresher {
    client: Client,
    config: JellyfinConfig,
}

impl JellyfinRefresher {
    pub fn new(config: JellyfinConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");
        Self::with_client(client, config)
    }

    pub fn with_client(client: Client, config: JellyfinConfig) -> Self {
        Self { client, config }
    }

    fn refresh_url(&self) -> String {
        format!("{}/Library/Refresh", self.config.url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LibraryRefresher for JellyfinRefresher {
    fn name(&self) -> &str {
        "jellyfin"
    }

    async fn refresh(&self) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.refresh_url())
            .header(TOKEN_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(NotifyError::from_reqwest)?;

        // 204 or 200 with an empty body on success
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::HttpStatus {
                service: self.name().to_string(),
                status: status.as_u16(),
            });
        }
        debug!("Jellyfin library refresh requested");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_url() {
        let refresher = JellyfinRefresher::new(JellyfinConfig {
            url: "http://localhost:8096/".to_string(),
            api_key: "key".to_string(),
            timeout_secs: 5,
        });
        assert_eq!(refresher.refresh_url(), "http://localhost:8096/Library/Refresh");
    }
}
