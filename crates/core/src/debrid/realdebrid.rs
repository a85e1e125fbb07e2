//! Real-Debrid REST client implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::RealDebridConfig;

use super::{
    AddMagnetResult, CachedFile, CachedVariant, DebridClient, DebridError, FileSelection,
    InstantAvailability, TorrentInfo, TorrentSummary, UnrestrictedLink,
};

/// Real-Debrid client implementation.
pub struct RealDebridClient {
    client: Client,
    config: RealDebridConfig,
}

impl RealDebridClient {
    /// Create a new Real-Debrid client.
    pub fn new(config: RealDebridConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");
        Self::with_client(client, config)
    }

    /// Create a client using an existing HTTP client.
    pub fn with_client(client: Client, config: RealDebridConfig) -> Self {
        Self { client, config }
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url(), endpoint)
    }

    /// Send an authenticated request. `None` for an empty body.
    async fn send(&self, request: RequestBuilder) -> Result<Option<Value>, DebridError> {
        let response = request
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DebridError::Timeout
                } else if e.is_connect() {
                    DebridError::ConnectionFailed(e.to_string())
                } else {
                    DebridError::Api {
                        status: 0,
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!(status = status.as_u16(), body = %body.chars().take(200).collect::<String>(), "Real-Debrid request failed");
            return Err(DebridError::from_status(status.as_u16(), &body));
        }
        if status.as_u16() == 202 {
            debug!("Real-Debrid: action already done");
        }

        if body.trim().is_empty() {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| DebridError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        check_error_body(&value, status.as_u16())?;
        Ok(Some(value))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, DebridError> {
        let value = self.send(request).await?.ok_or(DebridError::EmptyResponse)?;
        serde_json::from_value(value)
            .map_err(|e| DebridError::InvalidResponse(format!("Unexpected response shape: {}", e)))
    }
}

/// Reject bodies that carry an explicit `error` field.
fn check_error_body(value: &Value, status: u16) -> Result<(), DebridError> {
    if let Some(error) = value.get("error") {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let code = value
            .get("error_code")
            .and_then(Value::as_i64)
            .map(|c| format!(" (code {})", c))
            .unwrap_or_default();
        return Err(DebridError::Api {
            status,
            message: format!("{}{}", message, code),
        });
    }
    Ok(())
}

/// Decode an instant availability body.
///
/// Shape: `{ "<hash>": { "rd": [ { "<fileId>": { "filename", "filesize" } } ] } }`.
/// A hash mapped to an empty array or object is not cached.
pub fn parse_instant_availability(value: &Value) -> Result<InstantAvailability, DebridError> {
    check_error_body(value, 200)?;
    let Some(hashes) = value.as_object() else {
        return Err(DebridError::InvalidResponse(
            "instant availability is not an object".to_string(),
        ));
    };

    let mut availability = InstantAvailability::new();
    for (hash, entry) in hashes {
        let mut variants = Vec::new();
        if let Some(hosters) = entry.as_object() {
            for groups in hosters.values() {
                let Some(groups) = groups.as_array() else {
                    continue;
                };
                for group in groups {
                    let variant = parse_variant(group);
                    if !variant.is_empty() {
                        variants.push(variant);
                    }
                }
            }
        }
        availability.insert(hash, variants);
    }
    Ok(availability)
}

fn parse_variant(group: &Value) -> CachedVariant {
    let Some(files) = group.as_object() else {
        return Vec::new();
    };
    files
        .iter()
        .filter_map(|(id, file)| {
            Some(CachedFile {
                id: id.clone(),
                filename: file.get("filename")?.as_str()?.to_string(),
                filesize: file.get("filesize").and_then(Value::as_u64).unwrap_or(0),
            })
        })
        .collect()
}

#[async_trait]
impl DebridClient for RealDebridClient {
    fn name(&self) -> &str {
        "Real Debrid"
    }

    fn short(&self) -> &str {
        "RD"
    }

    async fn instant_availability(
        &self,
        hashes: &[String],
    ) -> Result<InstantAvailability, DebridError> {
        let url = self.url(&format!("torrents/instantAvailability/{}", hashes.join("/")));
        let value = self
            .send(self.client.get(&url))
            .await?
            .ok_or(DebridError::EmptyResponse)?;
        parse_instant_availability(&value)
    }

    async fn add_magnet(&self, magnet: &str) -> Result<AddMagnetResult, DebridError> {
        let url = self.url("torrents/addMagnet");
        self.send_json(self.client.post(&url).form(&[("magnet", magnet)]))
            .await
    }

    async fn select_files(
        &self,
        torrent_id: &str,
        selection: &FileSelection,
    ) -> Result<(), DebridError> {
        let url = self.url(&format!("torrents/selectFiles/{}", torrent_id));
        let files = selection.as_param();
        self.send(self.client.post(&url).form(&[("files", files.as_str())]))
            .await?;
        Ok(())
    }

    async fn torrent_info(&self, torrent_id: &str) -> Result<TorrentInfo, DebridError> {
        let url = self.url(&format!("torrents/info/{}", torrent_id));
        self.send_json(self.client.get(&url)).await
    }

    async fn unrestrict_link(&self, link: &str) -> Result<UnrestrictedLink, DebridError> {
        let url = self.url("unrestrict/link");
        self.send_json(self.client.post(&url).form(&[("link", link)]))
            .await
    }

    async fn delete_torrent(&self, torrent_id: &str) -> Result<(), DebridError> {
        let url = self.url(&format!("torrents/delete/{}", torrent_id));
        self.send(self.client.delete(&url)).await?;
        Ok(())
    }

    async fn list_torrents(&self, limit: u32) -> Result<Vec<TorrentSummary>, DebridError> {
        let url = self.url(&format!("torrents?limit={}", limit));
        match self.send(self.client.get(&url)).await? {
            // 204 when the account has no torrents
            None => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                DebridError::InvalidResponse(format!("Unexpected response shape: {}", e))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_instant_availability() {
        let body = json!({
            "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa": {
                "rd": [
                    {
                        "1": {"filename": "Show.S01E01.mkv", "filesize": 1500000000u64},
                        "2": {"filename": "Show.S01E02.mkv", "filesize": 1400000000u64}
                    },
                    {
                        "1": {"filename": "Show.S01E01.mkv", "filesize": 1500000000u64}
                    }
                ]
            },
            "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb": []
        });

        let availability = parse_instant_availability(&body).unwrap();
        let a = availability.variants("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].len(), 2);
        assert_eq!(a[0][0].filename, "Show.S01E01.mkv");
        assert_eq!(a[0][0].filesize, 1_500_000_000);
        assert!(availability
            .variants("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb")
            .is_empty());
    }

    #[test]
    fn test_parse_instant_availability_empty_object_means_not_cached() {
        let body = json!({"cccccccccccccccccccccccccccccccccccccccc": {}});
        let availability = parse_instant_availability(&body).unwrap();
        assert!(availability
            .variants("cccccccccccccccccccccccccccccccccccccccc")
            .is_empty());
    }

    #[test]
    fn test_error_object_is_failure() {
        let body = json!({"error": "disabled_endpoint", "error_code": 37});
        let err = parse_instant_availability(&body).unwrap_err();
        match err {
            DebridError::Api { message, .. } => {
                assert!(message.contains("disabled_endpoint"));
                assert!(message.contains("37"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_object_is_invalid() {
        let err = parse_instant_availability(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, DebridError::InvalidResponse(_)));
    }

    #[test]
    fn test_base_url_trims_slash() {
        let client = RealDebridClient::new(RealDebridConfig {
            url: "https://example.test/rest/1.0/".to_string(),
            api_key: "key".to_string(),
            timeout_secs: 5,
        });
        assert_eq!(
            client.url("torrents/info/X"),
            "https://example.test/rest/1.0/torrents/info/X"
        );
        assert_eq!(client.short(), "RD");
    }
}
