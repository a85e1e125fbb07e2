//! Engine facade: availability check, download and retry bookkeeping.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::debrid::DebridClient;
use crate::item::RequestItem;
use crate::notify::{LibraryRefresher, RequestTracker};
use crate::placer::Fetcher;
use crate::resolver::{AvailabilityReport, AvailabilityResolver, ResolverConfig, ResolverError};

use super::config::OrchestratorConfig;
use super::runner::DownloadOrchestrator;
use super::state::DownloadingSet;
use super::types::{DownloadOptions, DownloadOutcome, OrchestratorError, ProcessOutcome};

/// Runs one resolution attempt per call for a request item.
pub struct Engine {
    resolver: AvailabilityResolver,
    orchestrator: DownloadOrchestrator,
}

impl Engine {
    pub fn new(
        debrid: Arc<dyn DebridClient>,
        fetcher: Arc<dyn Fetcher>,
        resolver_config: ResolverConfig,
        orchestrator_config: OrchestratorConfig,
    ) -> Self {
        let resolver = AvailabilityResolver::new(debrid.clone(), resolver_config);
        let orchestrator =
            DownloadOrchestrator::new(orchestrator_config, debrid, fetcher, DownloadingSet::new());
        Self {
            resolver,
            orchestrator,
        }
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn LibraryRefresher>) -> Self {
        self.orchestrator = self.orchestrator.with_refresher(refresher);
        self
    }

    pub fn with_tracker(mut self, tracker: Arc<dyn RequestTracker>) -> Self {
        self.orchestrator = self.orchestrator.with_tracker(tracker);
        self
    }

    pub fn downloading(&self) -> &DownloadingSet {
        self.orchestrator.downloading()
    }

    /// Annotate the item's releases with cache status only.
    pub async fn check(&self, item: &mut RequestItem) -> Result<AvailabilityReport, ResolverError> {
        self.resolver.check(item, false).await
    }

    /// Pick up a torrent for the item already present on the account.
    pub async fn download_from_existing(
        &self,
        item: &RequestItem,
    ) -> Result<DownloadOutcome, OrchestratorError> {
        self.orchestrator.download_from_existing(item).await
    }

    /// Resolve and download one item.
    ///
    /// Items resting after a failed attempt are left alone. Items already
    /// downloading on the provider are polled through the account's torrent
    /// list and only attempted again once their remote torrent is gone or
    /// failed. An exhausted attempt starts a cooldown; any success clears
    /// the retry state.
    pub async fn process(&self, item: &mut RequestItem) -> Result<ProcessOutcome, ResolverError> {
        let now = Utc::now();
        if item.is_cooling_down(now) {
            debug!(item = %item.query(), until = ?item.retry.cooldown_until, "Item is cooling down");
            return Ok(ProcessOutcome::CoolingDown);
        }
        if self.downloading().contains(&item.download_id()).await {
            match self.orchestrator.download_from_existing(item).await {
                Ok(DownloadOutcome::Pending { .. }) => {
                    debug!(item = %item.query(), "Item is already downloading");
                    return Ok(ProcessOutcome::InFlight);
                }
                Ok(download @ DownloadOutcome::Downloaded { .. }) => {
                    item.record_success();
                    return Ok(ProcessOutcome::Attempted { download });
                }
                Ok(DownloadOutcome::Exhausted) => {
                    debug!(item = %item.query(), "Remote download is gone, attempting again");
                }
                Err(e) => {
                    warn!(item = %item.query(), error = %e, "Could not poll remote torrents");
                    return Ok(ProcessOutcome::InFlight);
                }
            }
        }

        self.resolver.check(item, false).await?;

        let config = self.orchestrator.config();
        let options = DownloadOptions::default().with_stream(config.stream);
        let download = self.orchestrator.download(item, &options).await;

        match &download {
            DownloadOutcome::Exhausted => {
                item.record_failure(now, config.cooldown());
                info!(
                    item = %item.query(),
                    attempts = item.retry.attempts,
                    cooldown_secs = config.cooldown_secs,
                    "Attempt exhausted, cooling down"
                );
            }
            _ => item.record_success(),
        }

        Ok(ProcessOutcome::Attempted { download })
    }
}
