//! Trait definitions for the placer module.

use std::path::PathBuf;

use async_trait::async_trait;

use super::error::FetchError;
use super::types::FetchRequest;

/// Downloads a file into its organized library location.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Fetches the file and returns its final path.
    ///
    /// On any failure the staged partial file is removed.
    async fn fetch(&self, request: FetchRequest) -> Result<PathBuf, FetchError>;
}
