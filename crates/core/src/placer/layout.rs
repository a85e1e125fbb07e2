//! Organized destination paths inside the media library.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use super::error::FetchError;
use super::metadata::parse_metadata;
use super::sanitize::sanitize_filename;
use super::types::ItemMetadata;
use crate::config::LibraryConfig;

const UNKNOWN_SHOW: &str = "Unknown Show";
const UNKNOWN_MOVIE: &str = "Unknown Movie";

/// Maps file names to `Shows/<Title>/Season NN/` or `Movies/<Title> (<Year>)/`.
#[derive(Debug, Clone)]
pub struct LibraryLayout {
    config: LibraryConfig,
}

impl LibraryLayout {
    pub fn new(config: LibraryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.config.staging_path()
    }

    /// Full destination path for a file, without touching the filesystem.
    pub fn destination_for(&self, name: &str, item: &ItemMetadata) -> PathBuf {
        let file_name = sanitize_filename(name);
        let parsed = parse_metadata(name);
        let title = item
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| Some(parsed.title.clone()).filter(|t| !t.is_empty()));

        if item.is_show {
            let title = title.unwrap_or_else(|| UNKNOWN_SHOW.to_string());
            let season = item.season.or(parsed.season).unwrap_or(1);
            self.config
                .shows_path()
                .join(sanitize_filename(&title))
                .join(format!("Season {:02}", season))
                .join(file_name)
        } else {
            let title = title.unwrap_or_else(|| UNKNOWN_MOVIE.to_string());
            let folder = match item.year.or(parsed.year) {
                Some(year) => format!("{} ({})", title, year),
                None => title,
            };
            self.config
                .movies_path()
                .join(sanitize_filename(&folder))
                .join(file_name)
        }
    }

    /// Destination path for a file, creating missing directories.
    pub async fn organize_path(
        &self,
        name: &str,
        item: &ItemMetadata,
    ) -> Result<PathBuf, FetchError> {
        let destination = self.destination_for(name, item);
        if let Some(parent) = destination.parent() {
            ensure_dir(parent).await?;
        }
        debug!(destination = %destination.display(), "Organized destination");
        Ok(destination)
    }
}

pub(crate) async fn ensure_dir(path: &Path) -> Result<(), FetchError> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| FetchError::DirectoryCreationFailed {
            path: path.to_path_buf(),
            source: e,
        })
}
