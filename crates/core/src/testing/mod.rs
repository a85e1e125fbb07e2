//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of every collaborator trait,
//! so the whole resolution flow can be exercised without a debrid account,
//! a media server or network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use debridarr_core::testing::{MockDebridClient, MockFetcher, MockTorrent};
//!
//! let debrid = MockDebridClient::new();
//! debrid.set_cached(&hash, &[("Heat.1995.1080p.mkv", 8_000_000_000)]).await;
//! debrid.script_torrent(&hash, MockTorrent::cached("Heat.1995.1080p", &files)).await;
//!
//! let fetcher = MockFetcher::new("/library");
//! ```

mod mock_debrid;
mod mock_fetcher;
mod mock_notify;

pub use mock_debrid::{MockDebridClient, MockTorrent};
pub use mock_fetcher::MockFetcher;
pub use mock_notify::{MockLibraryRefresher, MockRequestTracker};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::debrid::CachedFile;
    use crate::item::RequestItem;
    use crate::release::ReleaseCandidate;

    /// A 40 character info-hash made of one repeated character.
    pub fn info_hash(c: char) -> String {
        std::iter::repeat(c).take(40).collect()
    }

    /// A torrent release from the mock scraper.
    pub fn torrent_release(title: &str, hash: &str, size_gb: f64) -> ReleaseCandidate {
        ReleaseCandidate::torrent("mock-scraper", title, hash, size_gb).with_seeders(50)
    }

    /// A direct-link release from the mock scraper.
    pub fn http_release(title: &str, url: &str) -> ReleaseCandidate {
        ReleaseCandidate::http("mock-scraper", title, url)
    }

    /// Cached files named `<show>.S<ss>E<ee>.1080p.mkv`, ids starting at 1.
    pub fn season_files(show: &str, season: u32, episodes: u32, size: u64) -> Vec<CachedFile> {
        (1..=episodes)
            .map(|e| CachedFile {
                id: e.to_string(),
                filename: format!("{}.S{:02}E{:02}.1080p.mkv", show, season, e),
                filesize: size,
            })
            .collect()
    }

    /// `(name, size)` pairs matching [`season_files`], for scripted torrents.
    pub fn season_file_pairs(files: &[CachedFile]) -> Vec<(&str, u64)> {
        files
            .iter()
            .map(|f| (f.filename.as_str(), f.filesize))
            .collect()
    }

    /// A season request for a show with the given episode numbers.
    pub fn season_item(title: &str, season: u32, episodes: u32) -> RequestItem {
        RequestItem::season(title, season).with_episodes((1..=episodes).collect())
    }
}
