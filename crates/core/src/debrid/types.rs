//! Types for debrid service operations.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during debrid operations.
#[derive(Debug, Error)]
pub enum DebridError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Empty response")]
    EmptyResponse,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,
}

impl DebridError {
    /// Map an HTTP status and body to an error.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = body.chars().take(200).collect::<String>();
        match status {
            401 => DebridError::AuthenticationFailed(
                "API key does not seem to work, check the debrid settings".to_string(),
            ),
            403 => DebridError::PermissionDenied(format!(
                "infringing torrent, locked account or no premium: {}",
                message
            )),
            404 => DebridError::NotFound(message),
            _ => DebridError::Api { status, message },
        }
    }
}

/// Remote torrent status as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentStatus {
    MagnetError,
    MagnetConversion,
    WaitingFilesSelection,
    Queued,
    Downloading,
    Downloaded,
    Error,
    Virus,
    Compressing,
    Uploading,
    Dead,
    #[serde(other)]
    Unknown,
}

impl TorrentStatus {
    /// Still progressing on the remote side.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            TorrentStatus::Queued
                | TorrentStatus::MagnetConversion
                | TorrentStatus::Downloading
                | TorrentStatus::Uploading
        )
    }

    /// The provider gave up on the torrent.
    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            TorrentStatus::MagnetError
                | TorrentStatus::Error
                | TorrentStatus::Virus
                | TorrentStatus::Dead
        )
    }

    /// Files are available for unrestricting.
    pub fn is_ready(&self) -> bool {
        matches!(self, TorrentStatus::Downloaded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TorrentStatus::MagnetError => "magnet_error",
            TorrentStatus::MagnetConversion => "magnet_conversion",
            TorrentStatus::WaitingFilesSelection => "waiting_files_selection",
            TorrentStatus::Queued => "queued",
            TorrentStatus::Downloading => "downloading",
            TorrentStatus::Downloaded => "downloaded",
            TorrentStatus::Error => "error",
            TorrentStatus::Virus => "virus",
            TorrentStatus::Compressing => "compressing",
            TorrentStatus::Uploading => "uploading",
            TorrentStatus::Dead => "dead",
            TorrentStatus::Unknown => "unknown",
        }
    }
}

/// A cached file inside one variant of a hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedFile {
    pub id: String,
    pub filename: String,
    pub filesize: u64,
}

/// One cached "take" of a hash: the file set the provider can serve.
pub type CachedVariant = Vec<CachedFile>;

/// Instant availability per hash (lowercase).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstantAvailability {
    hashes: HashMap<String, Vec<CachedVariant>>,
}

impl InstantAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, hash: &str, variants: Vec<CachedVariant>) {
        self.hashes.insert(hash.to_lowercase(), variants);
    }

    /// Cached variants for a hash; empty when not cached.
    pub fn variants(&self, hash: &str) -> &[CachedVariant] {
        self.hashes
            .get(&hash.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

/// Result of adding a magnet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMagnetResult {
    pub id: String,
    #[serde(default)]
    pub uri: String,
}

/// Files to select on a remote torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSelection {
    All,
    Ids(Vec<String>),
}

impl FileSelection {
    /// Form value for the `files` parameter.
    pub fn as_param(&self) -> String {
        match self {
            FileSelection::All => "all".to_string(),
            FileSelection::Ids(ids) => ids.join(","),
        }
    }
}

/// A file inside a remote torrent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentFileEntry {
    pub id: u64,
    /// Path inside the torrent, starting with `/`.
    pub path: String,
    pub bytes: u64,
    /// 1 when selected for download.
    #[serde(default)]
    pub selected: u8,
}

impl TorrentFileEntry {
    /// Last path segment.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn is_selected(&self) -> bool {
        self.selected == 1
    }
}

/// Detailed remote torrent information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentInfo {
    pub id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub bytes: u64,
    pub status: TorrentStatus,
    #[serde(default)]
    pub files: Vec<TorrentFileEntry>,
    /// Hoster links, one per selected file once downloaded.
    #[serde(default)]
    pub links: Vec<String>,
}

impl TorrentInfo {
    pub fn selected_files(&self) -> impl Iterator<Item = &TorrentFileEntry> {
        self.files.iter().filter(|f| f.is_selected())
    }
}

/// Entry of the account's torrent list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentSummary {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub bytes: u64,
    pub status: TorrentStatus,
}

/// A hoster link turned into a direct download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnrestrictedLink {
    pub download: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub filesize: u64,
}

/// Trait for debrid service backends.
#[async_trait]
pub trait DebridClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Short identifier recorded in `ReleaseCandidate::cached_on`.
    fn short(&self) -> &str;

    /// Check which hashes are cached. An empty or malformed answer is an error.
    async fn instant_availability(
        &self,
        hashes: &[String],
    ) -> Result<InstantAvailability, DebridError>;

    /// Add a magnet to the account.
    async fn add_magnet(&self, magnet: &str) -> Result<AddMagnetResult, DebridError>;

    /// Select which files of a remote torrent to download.
    async fn select_files(
        &self,
        torrent_id: &str,
        selection: &FileSelection,
    ) -> Result<(), DebridError>;

    /// Get remote torrent details.
    async fn torrent_info(&self, torrent_id: &str) -> Result<TorrentInfo, DebridError>;

    /// Turn a hoster link into a direct download link.
    async fn unrestrict_link(&self, link: &str) -> Result<UnrestrictedLink, DebridError>;

    /// Remove a remote torrent.
    async fn delete_torrent(&self, torrent_id: &str) -> Result<(), DebridError>;

    /// List the account's torrents, newest first.
    async fn list_torrents(&self, limit: u32) -> Result<Vec<TorrentSummary>, DebridError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_deserialization() {
        let status: TorrentStatus = serde_json::from_str("\"magnet_conversion\"").unwrap();
        assert_eq!(status, TorrentStatus::MagnetConversion);
        let status: TorrentStatus = serde_json::from_str("\"something_new\"").unwrap();
        assert_eq!(status, TorrentStatus::Unknown);
    }

    #[test]
    fn test_status_pending() {
        assert!(TorrentStatus::Queued.is_pending());
        assert!(TorrentStatus::Downloading.is_pending());
        assert!(TorrentStatus::MagnetConversion.is_pending());
        assert!(TorrentStatus::Uploading.is_pending());
        assert!(!TorrentStatus::Downloaded.is_pending());
        assert!(!TorrentStatus::Dead.is_pending());
        assert!(TorrentStatus::Downloaded.is_ready());
    }

    #[test]
    fn test_status_failed() {
        assert!(TorrentStatus::Dead.is_failed());
        assert!(TorrentStatus::Virus.is_failed());
        assert!(TorrentStatus::MagnetError.is_failed());
        assert!(!TorrentStatus::Downloading.is_failed());
        assert!(!TorrentStatus::Unknown.is_failed());
    }

    #[test]
    fn test_from_status() {
        assert!(matches!(
            DebridError::from_status(401, ""),
            DebridError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            DebridError::from_status(403, ""),
            DebridError::PermissionDenied(_)
        ));
        assert!(matches!(
            DebridError::from_status(503, "down"),
            DebridError::Api { status: 503, .. }
        ));
    }

    #[test]
    fn test_file_selection_param() {
        assert_eq!(FileSelection::All.as_param(), "all");
        assert_eq!(
            FileSelection::Ids(vec!["1".into(), "4".into()]).as_param(),
            "1,4"
        );
    }

    #[test]
    fn test_torrent_info_decoding() {
        let json = r#"{
            "id": "ABC",
            "filename": "Show.S01.1080p",
            "hash": "aaaa",
            "bytes": 100,
            "status": "downloaded",
            "files": [
                {"id": 1, "path": "/Show.S01/Show.S01E01.mkv", "bytes": 60, "selected": 1},
                {"id": 2, "path": "/Show.S01/info.nfo", "bytes": 1, "selected": 0}
            ],
            "links": ["https://hoster/1"]
        }"#;
        let info: TorrentInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.status, TorrentStatus::Downloaded);
        let selected: Vec<_> = info.selected_files().collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name(), "Show.S01E01.mkv");
    }

    #[test]
    fn test_instant_availability_lookup_is_case_insensitive() {
        let mut availability = InstantAvailability::new();
        availability.insert(
            "ABCDEF",
            vec![vec![CachedFile {
                id: "1".into(),
                filename: "a.mkv".into(),
                filesize: 1,
            }]],
        );
        assert_eq!(availability.variants("abcdef").len(), 1);
        assert!(availability.variants("other").is_empty());
    }
}
