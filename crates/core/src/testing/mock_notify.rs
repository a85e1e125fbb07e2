//! Mock notification collaborators for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::notify::{LibraryRefresher, NotifyError, RequestTracker};

/// Mock library refresher that counts rescans.
#[derive(Debug, Default)]
pub struct MockLibraryRefresher {
    refreshes: Arc<RwLock<usize>>,
    fail: Arc<RwLock<bool>>,
}

impl MockLibraryRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of refresh calls, failed ones included.
    pub async fn refresh_count(&self) -> usize {
        *self.refreshes.read().await
    }

    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }
}

#[async_trait]
impl LibraryRefresher for MockLibraryRefresher {
    fn name(&self) -> &str {
        "mock-refresher"
    }

    async fn refresh(&self) -> Result<(), NotifyError> {
        *self.refreshes.write().await += 1;
        if *self.fail.read().await {
            return Err(NotifyError::HttpStatus {
                service: self.name().to_string(),
                status: 500,
            });
        }
        Ok(())
    }
}

/// Mock request tracker that records marked request ids.
#[derive(Debug, Default)]
pub struct MockRequestTracker {
    marked: Arc<RwLock<Vec<String>>>,
    fail: Arc<RwLock<bool>>,
}

impl MockRequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request ids passed to mark_available, failed ones included.
    pub async fn marked(&self) -> Vec<String> {
        self.marked.read().await.clone()
    }

    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }
}

#[async_trait]
impl RequestTracker for MockRequestTracker {
    fn name(&self) -> &str {
        "mock-tracker"
    }

    async fn mark_available(&self, request_id: &str) -> Result<(), NotifyError> {
        self.marked.write().await.push(request_id.to_string());
        if *self.fail.read().await {
            return Err(NotifyError::ConnectionFailed("mock failure".to_string()));
        }
        Ok(())
    }
}
