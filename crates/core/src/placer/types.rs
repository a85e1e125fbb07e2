//! Types for the placer module.

use serde::{Deserialize, Serialize};

/// Metadata carried by the request item, preferred over name parsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub is_show: bool,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub season: Option<u32>,
}

impl ItemMetadata {
    pub fn movie(title: impl Into<String>, year: Option<u16>) -> Self {
        Self {
            is_show: false,
            title: Some(title.into()),
            year,
            season: None,
        }
    }

    pub fn show(title: impl Into<String>, season: Option<u32>) -> Self {
        Self {
            is_show: true,
            title: Some(title.into()),
            year: None,
            season,
        }
    }
}

/// A single file to fetch into the library.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Direct (unrestricted) download URL.
    pub url: String,
    /// Name to give the file; sanitized before use.
    pub file_name: String,
    /// Size reported by the provider, when known.
    pub expected_size: Option<u64>,
    /// Metadata of the requesting item.
    pub item: ItemMetadata,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, file_name: impl Into<String>, item: ItemMetadata) -> Self {
        Self {
            url: url.into(),
            file_name: file_name.into(),
            expected_size: None,
            item,
        }
    }

    pub fn with_expected_size(mut self, size: Option<u64>) -> Self {
        self.expected_size = size;
        self
    }
}
