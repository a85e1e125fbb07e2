//! Shared set of downloads in flight on the provider.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;

/// Identifiers of items whose remote download has been started but not yet
/// placed locally. Cloning shares the same set.
#[derive(Debug, Clone, Default)]
pub struct DownloadingSet {
    inner: Arc<RwLock<HashSet<String>>>,
}

impl DownloadingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the id was not already present.
    pub async fn insert(&self, id: impl Into<String>) -> bool {
        self.inner.write().await.insert(id.into())
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.inner.write().await.remove(id)
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.inner.read().await.contains(id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn snapshot(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.read().await.iter().cloned().collect();
        ids.sort();
        ids
    }
}
