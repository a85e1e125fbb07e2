//! Download orchestrator implementation.
//!
//! Walks an item's releases in ranked order and drives each one through the
//! matching path:
//! - HTTP direct links are fetched as they are
//! - releases without file info are added to the provider to learn their files
//! - cached releases have a qualifying version selected and unrestricted
//!
//! The first release that downloads or is left pending on the provider ends
//! the walk. Errors only end the current release.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::debrid::{DebridClient, FileSelection, TorrentInfo, TorrentStatus};
use crate::item::{MediaKind, RequestItem};
use crate::matcher::{compile_deviation, PatternError, PatternSet};
use crate::notify::{LibraryRefresher, RequestTracker};
use crate::placer::{FetchError, FetchRequest, Fetcher, ItemMetadata};
use crate::release::ReleaseCandidate;
use crate::selection::{has_video_extension, rank_files, select_best_file, FileCandidate};

use super::config::OrchestratorConfig;
use super::state::DownloadingSet;
use super::types::{
    CandidateOutcome, DownloadOptions, DownloadOutcome, OrchestratorError, RejectReason,
};

/// Facts about the item captured once, before its releases are borrowed.
struct ItemContext {
    query: String,
    download_id: String,
    request_id: Option<String>,
    metadata: ItemMetadata,
    wanted: usize,
    allows_uncached: bool,
    whole_season: bool,
    /// Names of the requested files; empty when forced.
    patterns: PatternSet,
}

impl ItemContext {
    fn from_item(item: &RequestItem, force: bool) -> Result<Self, PatternError> {
        let patterns = if force {
            PatternSet::default()
        } else {
            PatternSet::compile(&item.files(), &[] as &[&str])?
        };
        Ok(Self {
            query: item.query(),
            download_id: item.download_id(),
            request_id: item.request_id.clone(),
            metadata: item.metadata(),
            wanted: item.files().len(),
            allows_uncached: item.allows_uncached(),
            whole_season: matches!(item.kind, MediaKind::Season | MediaKind::Show),
            patterns,
        })
    }
}

/// Drives request items from scraped releases to files in the library.
pub struct DownloadOrchestrator {
    config: OrchestratorConfig,
    debrid: Arc<dyn DebridClient>,
    fetcher: Arc<dyn Fetcher>,
    downloading: DownloadingSet,
    refresher: Option<Arc<dyn LibraryRefresher>>,
    tracker: Option<Arc<dyn RequestTracker>>,
}

impl DownloadOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        debrid: Arc<dyn DebridClient>,
        fetcher: Arc<dyn Fetcher>,
        downloading: DownloadingSet,
    ) -> Self {
        Self {
            config,
            debrid,
            fetcher,
            downloading,
            refresher: None,
            tracker: None,
        }
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn LibraryRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn with_tracker(mut self, tracker: Arc<dyn RequestTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn downloading(&self) -> &DownloadingSet {
        &self.downloading
    }

    /// Try the item's releases in order until one downloads or is left
    /// pending on the provider.
    ///
    /// When nothing works every release loses its cached marker, so callers
    /// can tell "nothing usable" apart from a partial result.
    pub async fn download(&self, item: &mut RequestItem, options: &DownloadOptions) -> DownloadOutcome {
        let pattern = options.query.clone().unwrap_or_else(|| item.deviation());
        let prepared = ItemContext::from_item(item, options.force)
            .and_then(|ctx| compile_deviation(&pattern).map(|regex| (ctx, regex)));
        let (ctx, deviation) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                error!(item = %item.query(), pattern = %pattern, error = %e, "Invalid item pattern");
                clear_cached(item);
                return DownloadOutcome::Exhausted;
            }
        };
        let season_marker = item.alternative_season_pattern().map(|p| p.to_lowercase());

        for release in item.releases.iter_mut() {
            let matches_primary = deviation.is_match(&release.title);
            let matches_season = season_marker
                .as_deref()
                .map(|marker| release.title.to_lowercase().contains(marker))
                .unwrap_or(false);

            if !(matches_primary || matches_season || options.force) {
                debug!(
                    release = %release.title,
                    item = %ctx.query,
                    reason = RejectReason::TitleMismatch.as_str(),
                    "Rejecting release"
                );
                continue;
            }
            if matches_season && !matches_primary {
                debug!(release = %release.title, item = %ctx.query, "Accepting season pack for a single episode");
            }

            match self.try_release(&ctx, release, options).await {
                Ok(CandidateOutcome::Downloaded(paths)) => {
                    info!(release = %release.title, item = %ctx.query, files = paths.len(), "Download complete");
                    self.after_download(&ctx).await;
                    return DownloadOutcome::Downloaded {
                        release: release.title.clone(),
                        paths,
                    };
                }
                Ok(CandidateOutcome::Pending) => {
                    self.downloading.insert(ctx.download_id.clone()).await;
                    info!(release = %release.title, item = %ctx.query, "Release is downloading on the provider");
                    return DownloadOutcome::Pending {
                        release: release.title.clone(),
                    };
                }
                Ok(CandidateOutcome::Rejected(reason)) => {
                    debug!(
                        release = %release.title,
                        item = %ctx.query,
                        reason = reason.as_str(),
                        "Rejecting release"
                    );
                }
                Err(e) => {
                    warn!(release = %release.title, item = %ctx.query, error = %e, "Release failed, trying the next one");
                }
            }
        }

        clear_cached(item);
        warn!(item = %ctx.query, "No release could be downloaded");
        DownloadOutcome::Exhausted
    }

    /// Pick up a torrent already present on the account, started by an
    /// earlier attempt.
    ///
    /// When no matching torrent is finished or still progressing, the item
    /// leaves the downloading set so the next attempt starts from scratch.
    pub async fn download_from_existing(
        &self,
        item: &RequestItem,
    ) -> Result<DownloadOutcome, OrchestratorError> {
        let ctx = ItemContext::from_item(item, false)?;
        let needle = normalize_name(&ctx.query);
        let torrents = self
            .debrid
            .list_torrents(self.config.existing_torrents_limit)
            .await?;

        for torrent in torrents {
            if !normalize_name(&torrent.filename).contains(&needle) {
                continue;
            }

            if matches!(torrent.status, TorrentStatus::Downloaded | TorrentStatus::Uploading) {
                debug!(torrent = %torrent.filename, item = %ctx.query, "Found finished remote torrent");
                let result = self.fetch_existing(&ctx, &torrent.id, &torrent.filename).await;
                match result {
                    Ok(paths) => {
                        info!(torrent = %torrent.filename, item = %ctx.query, "Downloaded existing remote torrent");
                        self.after_download(&ctx).await;
                        return Ok(DownloadOutcome::Downloaded {
                            release: torrent.filename,
                            paths,
                        });
                    }
                    Err(e) => {
                        warn!(torrent = %torrent.filename, item = %ctx.query, error = %e, "Existing remote torrent failed");
                        continue;
                    }
                }
            }

            if torrent.status.is_pending() {
                debug!(torrent = %torrent.filename, status = torrent.status.as_str(), "Remote torrent still downloading");
                self.downloading.insert(ctx.download_id.clone()).await;
                return Ok(DownloadOutcome::Pending {
                    release: torrent.filename,
                });
            }

            if torrent.status.is_failed() {
                warn!(torrent = %torrent.filename, item = %ctx.query, status = torrent.status.as_str(), "Remote torrent failed on the provider");
            }
        }

        if self.downloading.remove(&ctx.download_id).await {
            info!(item = %ctx.query, "No remote torrent left in progress, releasing item");
        }
        Ok(DownloadOutcome::Exhausted)
    }

    async fn fetch_existing(
        &self,
        ctx: &ItemContext,
        id: &str,
        filename: &str,
    ) -> Result<Vec<PathBuf>, OrchestratorError> {
        let info = self.debrid.torrent_info(id).await?;
        let files = self.unrestrict_selected(filename, &info).await?;
        self.fetch_files(ctx, &files, true).await
    }

    async fn try_release(
        &self,
        ctx: &ItemContext,
        release: &mut ReleaseCandidate,
        options: &DownloadOptions,
    ) -> Result<CandidateOutcome, OrchestratorError> {
        if !options.stream {
            return self.queue_remote(release).await;
        }
        if release.is_http() {
            return self.fetch_direct(ctx, release).await;
        }
        if !release.has_file_info() {
            return self.add_and_inspect(ctx, release).await;
        }
        self.download_cached(ctx, release, options.force).await
    }

    /// Hand the whole torrent to the provider and let it fetch remotely.
    async fn queue_remote(
        &self,
        release: &ReleaseCandidate,
    ) -> Result<CandidateOutcome, OrchestratorError> {
        let magnet = magnet_of(release)?;
        let added = self.debrid.add_magnet(magnet).await?;
        if let Err(e) = self
            .debrid
            .select_files(&added.id, &FileSelection::All)
            .await
        {
            self.discard_torrent(&added.id).await;
            return Err(e.into());
        }
        debug!(release = %release.title, torrent_id = %added.id, "Added release to the provider");
        Ok(CandidateOutcome::Pending)
    }

    async fn fetch_direct(
        &self,
        ctx: &ItemContext,
        release: &ReleaseCandidate,
    ) -> Result<CandidateOutcome, OrchestratorError> {
        let estimated = (release.size_gb * 1e9) as u64;
        let files: Vec<FileCandidate> = release
            .links
            .iter()
            .enumerate()
            .map(|(idx, link)| {
                let name = release
                    .filenames
                    .get(idx)
                    .filter(|n| !n.is_empty())
                    .cloned()
                    .unwrap_or_else(|| release.title.clone());
                FileCandidate::new(name, estimated).with_url(link.clone())
            })
            .collect();
        if files.is_empty() {
            return Err(OrchestratorError::NoLinks(release.title.clone()));
        }

        // Scraper sizes are estimates, so they are not enforced.
        let paths = self.fetch_files(ctx, &files, false).await?;
        Ok(CandidateOutcome::Downloaded(paths))
    }

    /// Add an uncached release to learn its files, select the videos and
    /// see whether the provider can serve it right away.
    async fn add_and_inspect(
        &self,
        ctx: &ItemContext,
        release: &ReleaseCandidate,
    ) -> Result<CandidateOutcome, OrchestratorError> {
        let magnet = magnet_of(release)?;
        let added = self.debrid.add_magnet(magnet).await?;

        let result = self.inspect_added(ctx, release, &added.id).await;
        if let Err(e) = &result {
            debug!(release = %release.title, torrent_id = %added.id, error = %e, "Removing torrent after failed inspection");
            self.discard_torrent(&added.id).await;
        }
        result
    }

    async fn inspect_added(
        &self,
        ctx: &ItemContext,
        release: &ReleaseCandidate,
        id: &str,
    ) -> Result<CandidateOutcome, OrchestratorError> {
        self.settle().await;

        let info = self.debrid.torrent_info(id).await?;
        if info.files.is_empty() {
            self.discard_torrent(id).await;
            return Ok(CandidateOutcome::Rejected(RejectReason::NoFiles));
        }

        let mut ids: Vec<String> = info
            .files
            .iter()
            .filter(|f| has_video_extension(f.name()))
            .map(|f| f.id.to_string())
            .collect();
        if ids.is_empty() {
            ids = info.files.iter().map(|f| f.id.to_string()).collect();
        }
        self.debrid
            .select_files(id, &FileSelection::Ids(ids))
            .await?;
        self.settle().await;

        let info = self.debrid.torrent_info(id).await?;
        if !info.links.is_empty() {
            let files = self.unrestrict_selected(&release.title, &info).await?;
            let paths = self.fetch_files(ctx, &files, true).await?;
            return Ok(CandidateOutcome::Downloaded(paths));
        }

        if info.status.is_pending() {
            if ctx.allows_uncached {
                return Ok(CandidateOutcome::Pending);
            }
            self.discard_torrent(id).await;
            return Ok(CandidateOutcome::Rejected(RejectReason::CacheRequired));
        }

        debug!(release = %release.title, status = info.status.as_str(), "Remote torrent cannot be fetched");
        self.discard_torrent(id).await;
        Ok(CandidateOutcome::Rejected(RejectReason::RemoteUnavailable))
    }

    /// Walk the ranked cached versions until one yields a link per file.
    async fn download_cached(
        &self,
        ctx: &ItemContext,
        release: &ReleaseCandidate,
        force: bool,
    ) -> Result<CandidateOutcome, OrchestratorError> {
        let magnet = magnet_of(release)?;

        for version in release.file_versions.iter() {
            if version.files().is_empty() {
                continue;
            }
            if !(force || version.satisfies_majority(ctx.wanted)) {
                debug!(
                    release = %release.title,
                    wanted = version.wanted_count(),
                    requested = ctx.wanted,
                    "Cached version covers too few wanted files"
                );
                continue;
            }

            let ids = version.file_ids();
            let added = self.debrid.add_magnet(magnet).await?;
            match self.try_version(ctx, release, &added.id, ids).await {
                Ok(Some(outcome)) => return Ok(outcome),
                Ok(None) => self.discard_torrent(&added.id).await,
                Err(e) => {
                    debug!(release = %release.title, torrent_id = %added.id, error = %e, "Removing torrent after failed version");
                    self.discard_torrent(&added.id).await;
                    return Err(e);
                }
            }
        }

        Ok(CandidateOutcome::Rejected(RejectReason::NoQualifyingVersion))
    }

    /// Select one cached version on an added torrent. `None` means the
    /// selection came back packed and the torrent should be dropped.
    async fn try_version(
        &self,
        ctx: &ItemContext,
        release: &ReleaseCandidate,
        id: &str,
        ids: Vec<String>,
    ) -> Result<Option<CandidateOutcome>, OrchestratorError> {
        let selected = ids.len();
        self.debrid
            .select_files(id, &FileSelection::Ids(ids))
            .await?;
        self.settle().await;
        let info = self.debrid.torrent_info(id).await?;

        if info.links.len() == selected {
            let files = self.unrestrict_selected(&release.title, &info).await?;
            let paths = self.fetch_files(ctx, &files, true).await?;
            return Ok(Some(CandidateOutcome::Downloaded(paths)));
        }

        if info.status.is_pending() {
            if ctx.allows_uncached {
                return Ok(Some(CandidateOutcome::Pending));
            }
            self.discard_torrent(id).await;
            return Ok(Some(CandidateOutcome::Rejected(RejectReason::CacheRequired)));
        }

        // Fewer links than files means the selection came back packed
        // into an archive.
        warn!(
            release = %release.title,
            selected,
            links = info.links.len(),
            "Cached version returned packed links, trying the next version"
        );
        Ok(None)
    }

    /// Unrestrict every link of a torrent, naming each after its selected
    /// file. Links that fail to unrestrict are skipped.
    async fn unrestrict_selected(
        &self,
        title: &str,
        info: &TorrentInfo,
    ) -> Result<Vec<FileCandidate>, OrchestratorError> {
        let selected: Vec<_> = info.selected_files().collect();
        let mut files = Vec::with_capacity(info.links.len());

        for (idx, link) in info.links.iter().enumerate() {
            let unrestricted = match self.debrid.unrestrict_link(link).await {
                Ok(u) => u,
                Err(e) => {
                    warn!(release = %title, link = %link, error = %e, "Failed to unrestrict link");
                    continue;
                }
            };
            let entry = selected.get(idx);
            let name = entry
                .map(|f| f.name().to_string())
                .filter(|n| !n.is_empty())
                .or_else(|| Some(unrestricted.filename.clone()).filter(|n| !n.is_empty()))
                .unwrap_or_else(|| format!("{}_{}", title, idx));
            let size = if unrestricted.filesize > 0 {
                unrestricted.filesize
            } else {
                entry.map(|f| f.bytes).unwrap_or(0)
            };
            files.push(FileCandidate::new(name, size).with_url(unrestricted.download));
        }

        if files.is_empty() {
            return Err(OrchestratorError::NoLinks(title.to_string()));
        }
        Ok(files)
    }

    /// Fetch the best file, or every suitable file for whole seasons.
    ///
    /// Files named like the requested ones are preferred; when none are,
    /// every file competes.
    async fn fetch_files(
        &self,
        ctx: &ItemContext,
        files: &[FileCandidate],
        enforce_size: bool,
    ) -> Result<Vec<PathBuf>, OrchestratorError> {
        let requested: Vec<FileCandidate> = files
            .iter()
            .filter(|f| ctx.patterns.wanted_match(&f.name).is_some())
            .cloned()
            .collect();
        let pool = if requested.is_empty() { files } else { &requested[..] };

        let chosen: Vec<&FileCandidate> = if ctx.whole_season {
            rank_files(pool)
        } else {
            select_best_file(pool).into_iter().collect()
        };
        if chosen.is_empty() {
            return Err(FetchError::NoSuitableFile.into());
        }

        let mut paths = Vec::with_capacity(chosen.len());
        for file in chosen {
            let url = file.url.clone().ok_or(FetchError::NoLinks)?;
            let expected = (enforce_size && file.size_bytes > 0).then_some(file.size_bytes);
            let request = FetchRequest::new(url, file.name.clone(), ctx.metadata.clone())
                .with_expected_size(expected);
            paths.push(self.fetcher.fetch(request).await?);
        }
        Ok(paths)
    }

    async fn after_download(&self, ctx: &ItemContext) {
        if self.downloading.remove(&ctx.download_id).await {
            debug!(download_id = %ctx.download_id, "Removed from downloading set");
        }

        if let Some(refresher) = &self.refresher {
            if let Err(e) = refresher.refresh().await {
                warn!(service = refresher.name(), error = %e, "Library refresh failed");
            }
        }

        if let (Some(tracker), Some(request_id)) = (&self.tracker, &ctx.request_id) {
            if let Err(e) = tracker.mark_available(request_id).await {
                warn!(service = tracker.name(), request_id = %request_id, error = %e, "Failed to mark request available");
            }
        }
    }

    async fn discard_torrent(&self, id: &str) {
        if let Err(e) = self.debrid.delete_torrent(id).await {
            warn!(torrent_id = %id, error = %e, "Failed to delete remote torrent");
        }
    }

    async fn settle(&self) {
        tokio::time::sleep(self.config.settle_delay()).await;
    }
}

fn magnet_of(release: &ReleaseCandidate) -> Result<&str, OrchestratorError> {
    release
        .magnet()
        .ok_or_else(|| OrchestratorError::NoMagnet(release.title.clone()))
}

fn clear_cached(item: &mut RequestItem) {
    for release in item.releases.iter_mut() {
        release.cached_on.clear();
    }
}

/// Lowercase alphanumerics with every other run collapsed to a dot.
fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.is_empty() && !out.ends_with('.') {
            out.push('.');
        }
    }
    out.trim_end_matches('.').to_string()
}
