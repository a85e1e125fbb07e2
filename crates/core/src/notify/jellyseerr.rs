//! Jellyseerr request tracker.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::config::JellyseerrConfig;

use super::{NotifyError, RequestTracker};

/// Marks Jellyseerr media as available once downloaded.
pub struct JellyseerrTracker {
    client: Client,
    config: JellyseerrConfig,
}

impl JellyseerrTracker {
    pub fn new(config: JellyseerrConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");
        Self::with_client(client, config)
    }

    pub fn with_client(client: Client, config: JellyseerrConfig) -> Self {
        Self { client, config }
    }

    fn available_url(&self, request_id: &str) -> String {
        format!(
            "{}/api/v1/media/{}/available",
            self.config.url.trim_end_matches('/'),
            request_id
        )
    }
}

#[async_trait]
impl RequestTracker for JellyseerrTracker {
    fn name(&self) -> &str {
        "jellyseerr"
    }

    async fn mark_available(&self, request_id: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.available_url(request_id))
            .header("X-Api-Key", &self.config.api_key)
            .json(&json!({ "is4k": false }))
            .send()
            .await
            .map_err(NotifyError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::HttpStatus {
                service: self.name().to_string(),
                status: status.as_u16(),
            });
        }
        debug!(request_id, "Marked request as available");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_url() {
        let tracker = JellyseerrTracker::new(JellyseerrConfig {
            url: "http://localhost:5055".to_string(),
            api_key: "key".to_string(),
            timeout_secs: 5,
        });
        assert_eq!(
            tracker.available_url("42"),
            "http://localhost:5055/api/v1/media/42/available"
        );
    }
}
