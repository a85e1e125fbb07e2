//! Mock debrid provider for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::debrid::{
    AddMagnetResult, CachedFile, CachedVariant, DebridClient, DebridError, FileSelection,
    InstantAvailability, TorrentFileEntry, TorrentInfo, TorrentStatus, TorrentSummary,
    UnrestrictedLink,
};

/// Scripted behaviour of a torrent once its magnet is added.
#[derive(Debug, Clone)]
pub struct MockTorrent {
    /// Torrent name reported by the provider.
    pub filename: String,
    /// Files as `(path, bytes)`; ids are 1-based positions.
    pub files: Vec<(String, u64)>,
    /// Whether a selection turns into links immediately.
    pub cached: bool,
    /// Status reported after selection when not cached.
    pub pending_status: TorrentStatus,
    /// Cached selections collapse into a single archive link.
    pub packed: bool,
}

impl MockTorrent {
    /// A torrent the provider can serve right away.
    pub fn cached(filename: &str, files: &[(&str, u64)]) -> Self {
        Self {
            filename: filename.to_string(),
            files: files.iter().map(|(n, s)| (n.to_string(), *s)).collect(),
            cached: true,
            pending_status: TorrentStatus::Downloaded,
            packed: false,
        }
    }

    /// A torrent the provider still has to download.
    pub fn uncached(filename: &str, files: &[(&str, u64)]) -> Self {
        Self {
            cached: false,
            pending_status: TorrentStatus::Downloading,
            ..Self::cached(filename, files)
        }
    }

    pub fn with_status(mut self, status: TorrentStatus) -> Self {
        self.pending_status = status;
        self
    }

    /// Selections return one link for the whole set (a `.rar`).
    pub fn packed(mut self) -> Self {
        self.packed = true;
        self
    }
}

/// A torrent added to the mock account.
#[derive(Debug, Clone)]
struct MockEntry {
    hash: String,
    script: MockTorrent,
    selected: Option<Vec<u64>>,
    status_override: Option<TorrentStatus>,
}

impl MockEntry {
    fn status(&self) -> TorrentStatus {
        if let Some(status) = self.status_override {
            return status;
        }
        match &self.selected {
            None if self.script.files.is_empty() => TorrentStatus::MagnetConversion,
            None => TorrentStatus::WaitingFilesSelection,
            Some(_) if self.script.cached => TorrentStatus::Downloaded,
            Some(_) => self.script.pending_status,
        }
    }

    fn links(&self, id: &str) -> Vec<String> {
        let selected = match &self.selected {
            Some(selected) if self.script.cached || self.status_override == Some(TorrentStatus::Downloaded) => selected,
            _ => return Vec::new(),
        };
        if self.script.packed {
            return vec![format!("https://mock.rd/d/{}/archive", id)];
        }
        selected
            .iter()
            .map(|file_id| format!("https://mock.rd/d/{}/{}", id, file_id))
            .collect()
    }

    fn info(&self, id: &str) -> TorrentInfo {
        let selected = self.selected.clone().unwrap_or_default();
        TorrentInfo {
            id: id.to_string(),
            filename: self.script.filename.clone(),
            hash: self.hash.clone(),
            bytes: self.script.files.iter().map(|(_, s)| s).sum(),
            status: self.status(),
            files: self
                .script
                .files
                .iter()
                .enumerate()
                .map(|(idx, (path, bytes))| {
                    let file_id = idx as u64 + 1;
                    TorrentFileEntry {
                        id: file_id,
                        path: format!("/{}", path),
                        bytes: *bytes,
                        selected: u8::from(selected.contains(&file_id)),
                    }
                })
                .collect(),
            links: self.links(id),
        }
    }
}

/// Mock implementation of the DebridClient trait.
///
/// Provides controllable behavior for testing:
/// - Instant availability per hash, with batch or per-hash failures
/// - Scripted torrents keyed by hash for the add-magnet paths
/// - Recorded magnets, selections and deletions for assertions
///
/// # Example
///
/// ```rust,ignore
/// let client = MockDebridClient::new();
/// client.set_cached(&hash, &[("Show.S01E01.mkv", 1_000_000_000)]).await;
/// client.set_batch_failure(true).await;
///
/// resolver.check(&mut item, false).await?;
/// assert_eq!(client.availability_calls().await.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MockDebridClient {
    availability: Arc<RwLock<HashMap<String, Vec<CachedVariant>>>>,
    batch_failure: Arc<RwLock<bool>>,
    failing_hashes: Arc<RwLock<HashSet<String>>>,
    availability_calls: Arc<RwLock<Vec<Vec<String>>>>,
    scripts: Arc<RwLock<HashMap<String, MockTorrent>>>,
    torrents: Arc<RwLock<Vec<(String, MockEntry)>>>,
    added: Arc<RwLock<Vec<String>>>,
    selections: Arc<RwLock<Vec<FileSelection>>>,
    deleted: Arc<RwLock<Vec<String>>>,
    failing_links: Arc<RwLock<HashSet<String>>>,
    next_error: Arc<RwLock<Option<DebridError>>>,
    info_calls: Arc<RwLock<usize>>,
    failing_info_call: Arc<RwLock<Option<usize>>>,
    id_counter: Arc<RwLock<u32>>,
}

impl MockDebridClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cached variants reported for a hash.
    pub async fn set_variants(&self, hash: &str, variants: Vec<CachedVariant>) {
        self.availability
            .write()
            .await
            .insert(hash.to_lowercase(), variants);
    }

    /// Report a single cached variant holding the given files.
    pub async fn set_cached(&self, hash: &str, files: &[(&str, u64)]) {
        let variant = files
            .iter()
            .enumerate()
            .map(|(idx, (name, size))| CachedFile {
                id: (idx + 1).to_string(),
                filename: name.to_string(),
                filesize: *size,
            })
            .collect();
        self.set_variants(hash, vec![variant]).await;
    }

    /// Make every availability request covering more than one hash fail.
    pub async fn set_batch_failure(&self, fail: bool) {
        *self.batch_failure.write().await = fail;
    }

    /// Make every availability request including this hash fail.
    pub async fn fail_hash(&self, hash: &str) {
        self.failing_hashes.write().await.insert(hash.to_lowercase());
    }

    /// Hash lists of every availability request, in order.
    pub async fn availability_calls(&self) -> Vec<Vec<String>> {
        self.availability_calls.read().await.clone()
    }

    /// Script what adding the magnet for `hash` produces.
    pub async fn script_torrent(&self, hash: &str, torrent: MockTorrent) {
        self.scripts.write().await.insert(hash.to_lowercase(), torrent);
    }

    /// Put a torrent on the account as if added earlier, all files selected.
    pub async fn insert_existing(&self, torrent: MockTorrent, status: TorrentStatus) -> String {
        let id = self.next_id().await;
        let selected = (1..=torrent.files.len() as u64).collect();
        let entry = MockEntry {
            hash: String::new(),
            script: torrent,
            selected: Some(selected),
            status_override: Some(status),
        };
        self.torrents.write().await.push((id.clone(), entry));
        id
    }

    /// Make unrestricting this link fail.
    pub async fn fail_link(&self, link: &str) {
        self.failing_links.write().await.insert(link.to_string());
    }

    /// Set an error to be returned by the next provider call.
    pub async fn set_next_error(&self, error: DebridError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make the n-th torrent_info call (1-based) fail.
    pub async fn fail_torrent_info_call(&self, n: usize) {
        *self.failing_info_call.write().await = Some(n);
    }

    /// Name and status of every torrent still on the account.
    pub async fn account(&self) -> Vec<(String, TorrentStatus)> {
        self.torrents
            .read()
            .await
            .iter()
            .map(|(_, entry)| (entry.script.filename.clone(), entry.status()))
            .collect()
    }

    /// Magnet URIs passed to add_magnet.
    pub async fn added_magnets(&self) -> Vec<String> {
        self.added.read().await.clone()
    }

    /// File id lists of every explicit selection.
    pub async fn selections(&self) -> Vec<Vec<String>> {
        self.selections
            .read()
            .await
            .iter()
            .filter_map(|s| match s {
                FileSelection::Ids(ids) => Some(ids.clone()),
                FileSelection::All => None,
            })
            .collect()
    }

    /// Number of "select all" calls.
    pub async fn selected_all(&self) -> usize {
        self.selections
            .read()
            .await
            .iter()
            .filter(|s| matches!(s, FileSelection::All))
            .count()
    }

    /// Torrent ids passed to delete_torrent.
    pub async fn deleted(&self) -> Vec<String> {
        self.deleted.read().await.clone()
    }

    async fn take_error(&self) -> Result<(), DebridError> {
        match self.next_error.write().await.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn next_id(&self) -> String {
        let mut counter = self.id_counter.write().await;
        *counter += 1;
        format!("MOCK{:04}", *counter)
    }

    async fn entry(&self, id: &str) -> Result<MockEntry, DebridError> {
        self.torrents
            .read()
            .await
            .iter()
            .find(|(tid, _)| tid == id)
            .map(|(_, entry)| entry.clone())
            .ok_or_else(|| DebridError::NotFound(format!("torrent {}", id)))
    }
}

fn hash_from_magnet(magnet: &str) -> String {
    magnet
        .split("xt=urn:btih:")
        .nth(1)
        .map(|rest| rest.split('&').next().unwrap_or(rest))
        .unwrap_or_default()
        .to_lowercase()
}

#[async_trait]
impl DebridClient for MockDebridClient {
    fn name(&self) -> &str {
        "mock"
    }

    fn short(&self) -> &str {
        "RD"
    }

    async fn instant_availability(
        &self,
        hashes: &[String],
    ) -> Result<InstantAvailability, DebridError> {
        self.availability_calls.write().await.push(hashes.to_vec());
        self.take_error().await?;

        if hashes.len() > 1 && *self.batch_failure.read().await {
            return Err(DebridError::EmptyResponse);
        }
        let failing = self.failing_hashes.read().await;
        if hashes.iter().any(|h| failing.contains(&h.to_lowercase())) {
            return Err(DebridError::ConnectionFailed("mock failure".to_string()));
        }

        let known = self.availability.read().await;
        let mut availability = InstantAvailability::new();
        for hash in hashes {
            let variants = known.get(&hash.to_lowercase()).cloned().unwrap_or_default();
            availability.insert(hash, variants);
        }
        Ok(availability)
    }

    async fn add_magnet(&self, magnet: &str) -> Result<AddMagnetResult, DebridError> {
        self.take_error().await?;
        self.added.write().await.push(magnet.to_string());

        let hash = hash_from_magnet(magnet);
        let script = self
            .scripts
            .read()
            .await
            .get(&hash)
            .cloned()
            .unwrap_or_else(|| MockTorrent::uncached("", &[]));
        let id = self.next_id().await;
        let entry = MockEntry {
            hash,
            script,
            selected: None,
            status_override: None,
        };
        self.torrents.write().await.push((id.clone(), entry));
        Ok(AddMagnetResult {
            uri: format!("https://mock.rd/torrents/info/{}", id),
            id,
        })
    }

    async fn select_files(&self, id: &str, selection: &FileSelection) -> Result<(), DebridError> {
        self.take_error().await?;
        self.selections.write().await.push(selection.clone());

        let mut torrents = self.torrents.write().await;
        let (_, entry) = torrents
            .iter_mut()
            .find(|(tid, _)| tid == id)
            .ok_or_else(|| DebridError::NotFound(format!("torrent {}", id)))?;
        let ids: Vec<u64> = match selection {
            FileSelection::All => (1..=entry.script.files.len() as u64).collect(),
            FileSelection::Ids(ids) => ids.iter().filter_map(|i| i.parse().ok()).collect(),
        };
        entry.selected = Some(ids);
        Ok(())
    }

    async fn torrent_info(&self, id: &str) -> Result<TorrentInfo, DebridError> {
        self.take_error().await?;
        let call = {
            let mut calls = self.info_calls.write().await;
            *calls += 1;
            *calls
        };
        if *self.failing_info_call.read().await == Some(call) {
            return Err(DebridError::ConnectionFailed("mock failure".to_string()));
        }
        Ok(self.entry(id).await?.info(id))
    }

    async fn unrestrict_link(&self, link: &str) -> Result<UnrestrictedLink, DebridError> {
        self.take_error().await?;
        if self.failing_links.read().await.contains(link) {
            return Err(DebridError::Api {
                status: 503,
                message: "hoster_unavailable".to_string(),
            });
        }

        let mut parts = link.trim_start_matches("https://mock.rd/d/").split('/');
        let id = parts.next().unwrap_or_default();
        let file = parts.next().unwrap_or_default();
        let entry = self.entry(id).await?;
        let (filename, filesize) = match file.parse::<usize>() {
            Ok(file_id) if file_id >= 1 => entry
                .script
                .files
                .get(file_id - 1)
                .cloned()
                .unwrap_or_default(),
            _ => (
                format!("{}.rar", entry.script.filename),
                entry.script.files.iter().map(|(_, s)| s).sum(),
            ),
        };
        Ok(UnrestrictedLink {
            download: format!("https://download.mock/{}/{}", id, filename),
            filename,
            filesize,
        })
    }

    async fn delete_torrent(&self, id: &str) -> Result<(), DebridError> {
        self.take_error().await?;
        self.deleted.write().await.push(id.to_string());
        self.torrents.write().await.retain(|(tid, _)| tid != id);
        Ok(())
    }

    async fn list_torrents(&self, limit: u32) -> Result<Vec<TorrentSummary>, DebridError> {
        self.take_error().await?;
        Ok(self
            .torrents
            .read()
            .await
            .iter()
            .take(limit as usize)
            .map(|(id, entry)| TorrentSummary {
                id: id.clone(),
                filename: entry.script.filename.clone(),
                hash: entry.hash.clone(),
                bytes: entry.script.files.iter().map(|(_, s)| s).sum(),
                status: entry.status(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_cached_torrent_yields_links() {
        let client = MockDebridClient::new();
        let hash = "a".repeat(40);
        client
            .script_torrent(&hash, MockTorrent::cached("Pack", &[("a.mkv", 10), ("b.mkv", 20)]))
            .await;

        let added = client
            .add_magnet(&format!("magnet:?xt=urn:btih:{}", hash))
            .await
            .unwrap();
        let info = client.torrent_info(&added.id).await.unwrap();
        assert_eq!(info.status, TorrentStatus::WaitingFilesSelection);
        assert!(info.links.is_empty());

        client
            .select_files(&added.id, &FileSelection::Ids(vec!["2".to_string()]))
            .await
            .unwrap();
        let info = client.torrent_info(&added.id).await.unwrap();
        assert_eq!(info.links.len(), 1);

        let link = client.unrestrict_link(&info.links[0]).await.unwrap();
        assert_eq!(link.filename, "b.mkv");
        assert_eq!(link.filesize, 20);
    }

    #[tokio::test]
    async fn test_failing_info_call_only_hits_that_call() {
        let client = MockDebridClient::new();
        let id = client
            .insert_existing(MockTorrent::cached("Pack", &[("a.mkv", 10)]), TorrentStatus::Downloaded)
            .await;
        client.fail_torrent_info_call(2).await;

        assert!(client.torrent_info(&id).await.is_ok());
        assert!(client.torrent_info(&id).await.is_err());
        assert!(client.torrent_info(&id).await.is_ok());
        assert_eq!(client.account().await, vec![("Pack".to_string(), TorrentStatus::Downloaded)]);
    }

    #[tokio::test]
    async fn test_next_error_is_consumed_once() {
        let client = MockDebridClient::new();
        client.set_next_error(DebridError::EmptyResponse).await;

        assert!(client.list_torrents(10).await.is_err());
        assert!(client.list_torrents(10).await.is_ok());
    }
}
