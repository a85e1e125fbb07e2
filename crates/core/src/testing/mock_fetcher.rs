//! Mock fetcher for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::LibraryConfig;
use crate::placer::{FetchError, FetchRequest, Fetcher, LibraryLayout};

/// Mock implementation of the Fetcher trait.
///
/// Nothing is transferred: each request is recorded and answered with the
/// path the file would be organized to under the configured root.
///
/// # Example
///
/// ```rust,ignore
/// let fetcher = MockFetcher::new("/library");
/// let path = fetcher.fetch(request).await?;
///
/// let requests = fetcher.requests().await;
/// assert_eq!(requests[0].file_name, "Heat.1995.1080p.mkv");
/// ```
#[derive(Debug)]
pub struct MockFetcher {
    layout: LibraryLayout,
    /// Recorded fetch requests.
    requests: Arc<RwLock<Vec<FetchRequest>>>,
    /// URLs that fail with a size mismatch.
    failing_urls: Arc<RwLock<HashSet<String>>>,
    /// Whether every fetch fails.
    fail_all: Arc<RwLock<bool>>,
}

impl MockFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: LibraryLayout::new(LibraryConfig::with_root(root)),
            requests: Arc::new(RwLock::new(Vec::new())),
            failing_urls: Arc::new(RwLock::new(HashSet::new())),
            fail_all: Arc::new(RwLock::new(false)),
        }
    }

    /// Get all recorded fetch requests.
    pub async fn requests(&self) -> Vec<FetchRequest> {
        self.requests.read().await.clone()
    }

    /// Make fetches of URLs containing `fragment` fail.
    pub async fn fail_url(&self, fragment: &str) {
        self.failing_urls.write().await.insert(fragment.to_string());
    }

    /// Make every fetch fail.
    pub async fn set_fail_all(&self, fail: bool) {
        *self.fail_all.write().await = fail;
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, request: FetchRequest) -> Result<PathBuf, FetchError> {
        self.requests.write().await.push(request.clone());

        let failing = *self.fail_all.read().await
            || self
                .failing_urls
                .read()
                .await
                .iter()
                .any(|fragment| request.url.contains(fragment.as_str()));
        if failing {
            let expected = request.expected_size.unwrap_or(1_000_000_000);
            return Err(FetchError::SizeMismatch {
                expected,
                actual: expected / 2,
                tolerance: expected / 20,
            });
        }

        Ok(self
            .layout
            .destination_for(&request.file_name, &request.item))
    }
}
