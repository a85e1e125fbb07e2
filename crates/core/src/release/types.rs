//! Release candidate types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::FileVersion;

/// Length of a hex-encoded BitTorrent v1 info-hash.
pub const INFO_HASH_LEN: usize = 40;

/// How a release is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseKind {
    /// Magnet link plus info-hash, resolved through the debrid service.
    Torrent,
    /// Direct HTTP link, downloaded as-is.
    Http,
}

/// A scraped release for a requested item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseCandidate {
    /// Scraper/provider that produced this release.
    pub source: String,
    pub kind: ReleaseKind,
    /// Display title, matched against the item's deviation.
    pub title: String,
    /// Info-hash (torrent releases only).
    #[serde(default)]
    pub hash: String,
    /// Size estimate in GB, refined by the availability check.
    #[serde(default)]
    pub size_gb: f64,
    /// Magnet URI or HTTP URL(s), in preference order.
    #[serde(default)]
    pub links: Vec<String>,
    /// Real filenames parallel to `links`, when known.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filenames: Vec<String>,
    #[serde(default)]
    pub seeders: u32,
    /// Debrid services confirming instant availability.
    #[serde(default)]
    pub cached_on: BTreeSet<String>,
    /// Cached file-sets, best first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_versions: Vec<FileVersion>,
    /// Wanted file count of the best version.
    #[serde(default)]
    pub wanted: usize,
    /// Unwanted file count of the best version.
    #[serde(default)]
    pub unwanted: usize,
}

impl ReleaseCandidate {
    /// A torrent release with a magnet link built from its hash.
    pub fn torrent(
        source: impl Into<String>,
        title: impl Into<String>,
        hash: impl Into<String>,
        size_gb: f64,
    ) -> Self {
        let hash = hash.into();
        let title = title.into();
        let magnet = format!("magnet:?xt=urn:btih:{}&dn={}", hash, title.replace(' ', "."));
        Self {
            source: source.into(),
            kind: ReleaseKind::Torrent,
            title,
            hash,
            size_gb,
            links: vec![magnet],
            filenames: Vec::new(),
            seeders: 0,
            cached_on: BTreeSet::new(),
            file_versions: Vec::new(),
            wanted: 0,
            unwanted: 0,
        }
    }

    /// A direct-link release.
    pub fn http(source: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind: ReleaseKind::Http,
            title: title.into(),
            hash: String::new(),
            size_gb: 0.0,
            links: vec![url.into()],
            filenames: Vec::new(),
            seeders: 0,
            cached_on: BTreeSet::new(),
            file_versions: Vec::new(),
            wanted: 0,
            unwanted: 0,
        }
    }

    pub fn with_seeders(mut self, seeders: u32) -> Self {
        self.seeders = seeders;
        self
    }

    pub fn with_filenames(mut self, filenames: Vec<String>) -> Self {
        self.filenames = filenames;
        self
    }

    /// Whether the info-hash has the expected length.
    pub fn has_valid_hash(&self) -> bool {
        self.hash.len() == INFO_HASH_LEN
    }

    /// Direct-link releases, including torrents whose first link is an HTTP URL.
    pub fn is_http(&self) -> bool {
        self.kind == ReleaseKind::Http
            || self.first_link().map(is_http_url).unwrap_or(false)
    }

    pub fn first_link(&self) -> Option<&str> {
        self.links.first().map(String::as_str)
    }

    /// The magnet URI, if the first link is one.
    pub fn magnet(&self) -> Option<&str> {
        self.first_link().filter(|l| l.starts_with("magnet:"))
    }

    pub fn is_cached(&self) -> bool {
        !self.cached_on.is_empty()
    }

    /// Whether any cached version carries at least one file.
    pub fn has_file_info(&self) -> bool {
        self.file_versions.iter().any(|v| !v.files().is_empty())
    }
}

pub(crate) fn is_http_url(link: &str) -> bool {
    link.starts_with("http://") || link.starts_with("https://")
}
