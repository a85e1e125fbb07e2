use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::orchestrator::OrchestratorConfig;
use crate::placer::FetcherConfig;
use crate::resolver::ResolverConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub debrid: DebridConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub downloader: FetcherConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub jellyfin: Option<JellyfinConfig>,
    #[serde(default)]
    pub jellyseerr: Option<JellyseerrConfig>,
}

/// Debrid service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DebridConfig {
    /// Debrid backend type
    pub backend: DebridBackend,
    /// Real-Debrid specific configuration (required when backend = "real_debrid")
    #[serde(default)]
    pub real_debrid: Option<RealDebridConfig>,
}

/// Available debrid backends
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DebridBackend {
    RealDebrid,
}

/// Real-Debrid REST API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RealDebridConfig {
    /// REST API base URL
    #[serde(default = "default_real_debrid_url")]
    pub url: String,
    /// Private API token
    pub api_key: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_real_debrid_url() -> String {
    "https://api.real-debrid.com/rest/1.0".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Local media library layout
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Root media directory
    #[serde(default = "default_library_root")]
    pub root: PathBuf,
    /// Staging directory for in-progress transfers, relative to root
    #[serde(default = "default_staging_dir")]
    pub staging_dir: String,
    /// Movies directory, relative to root
    #[serde(default = "default_movies_dir")]
    pub movies_dir: String,
    /// Shows directory, relative to root
    #[serde(default = "default_shows_dir")]
    pub shows_dir: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: default_library_root(),
            staging_dir: default_staging_dir(),
            movies_dir: default_movies_dir(),
            shows_dir: default_shows_dir(),
        }
    }
}

impl LibraryConfig {
    /// Library rooted at the given directory with default sub-directories.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn staging_path(&self) -> PathBuf {
        self.root.join(&self.staging_dir)
    }

    pub fn movies_path(&self) -> PathBuf {
        self.root.join(&self.movies_dir)
    }

    pub fn shows_path(&self) -> PathBuf {
        self.root.join(&self.shows_dir)
    }
}

fn default_library_root() -> PathBuf {
    PathBuf::from("media")
}

fn default_staging_dir() -> String {
    ".downloading".to_string()
}

fn default_movies_dir() -> String {
    "Movies".to_string()
}

fn default_shows_dir() -> String {
    "Shows".to_string()
}

/// Jellyfin library refresh configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JellyfinConfig {
    /// Jellyfin server URL (e.g., "http://localhost:8096")
    pub url: String,
    /// Jellyfin API token
    pub api_key: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// Jellyseerr request tracker configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JellyseerrConfig {
    /// Jellyseerr server URL (e.g., "http://localhost:5055")
    pub url: String,
    /// Jellyseerr API key
    pub api_key: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// Sanitized config for display (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub debrid: SanitizedDebridConfig,
    pub library: LibraryConfig,
    pub downloader: FetcherConfig,
    pub resolver: ResolverConfig,
    pub orchestrator: OrchestratorConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jellyfin: Option<SanitizedServiceConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jellyseerr: Option<SanitizedServiceConfig>,
}

/// Sanitized debrid config (API key redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDebridConfig {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_debrid: Option<SanitizedServiceConfig>,
}

/// Any URL + API key service with the key hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedServiceConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            debrid: SanitizedDebridConfig {
                backend: match config.debrid.backend {
                    DebridBackend::RealDebrid => "real_debrid".to_string(),
                },
                real_debrid: config
                    .debrid
                    .real_debrid
                    .as_ref()
                    .map(|rd| SanitizedServiceConfig {
                        url: rd.url.clone(),
                        api_key_configured: !rd.api_key.is_empty(),
                        timeout_secs: rd.timeout_secs,
                    }),
            },
            library: config.library.clone(),
            downloader: config.downloader.clone(),
            resolver: config.resolver.clone(),
            orchestrator: config.orchestrator.clone(),
            jellyfin: config.jellyfin.as_ref().map(|j| SanitizedServiceConfig {
                url: j.url.clone(),
                api_key_configured: !j.api_key.is_empty(),
                timeout_secs: j.timeout_secs,
            }),
            jellyseerr: config.jellyseerr.as_ref().map(|j| SanitizedServiceConfig {
                url: j.url.clone(),
                api_key_configured: !j.api_key.is_empty(),
                timeout_secs: j.timeout_secs,
            }),
        }
    }
}
