//! Request item types.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::placer::ItemMetadata;
use crate::release::ReleaseCandidate;

/// Granularity of a requested item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Show,
    Season,
    Episode,
}

/// Cache requirement of a quality profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheRule {
    #[default]
    Any,
    PreferenceCached,
    RequirementCached,
}

/// Quality profile the item is requested in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionProfile {
    pub name: String,
    #[serde(default)]
    pub cache_status: CacheRule,
}

impl VersionProfile {
    pub fn new(name: impl Into<String>, cache_status: CacheRule) -> Self {
        Self {
            name: name.into(),
            cache_status,
        }
    }
}

/// Retry bookkeeping carried between polling cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetryState {
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub cooldown_until: Option<DateTime<Utc>>,
}

/// A movie, show, season or episode to resolve, with its scraped releases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestItem {
    pub kind: MediaKind,
    pub title: String,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub episode: Option<u32>,
    /// Episodes expected in a season pack.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub episodes: Vec<u32>,
    /// Identifier of the originating request in the request tracker.
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub version: Option<VersionProfile>,
    /// Explicit title pattern; replaces the derived one.
    #[serde(default)]
    pub deviation: Option<String>,
    #[serde(default)]
    pub releases: Vec<ReleaseCandidate>,
    #[serde(default)]
    pub retry: RetryState,
}

impl RequestItem {
    fn new(kind: MediaKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            year: None,
            season: None,
            episode: None,
            episodes: Vec::new(),
            request_id: None,
            version: None,
            deviation: None,
            releases: Vec::new(),
            retry: RetryState::default(),
        }
    }

    pub fn movie(title: impl Into<String>, year: Option<u16>) -> Self {
        Self {
            year,
            ..Self::new(MediaKind::Movie, title)
        }
    }

    pub fn show(title: impl Into<String>) -> Self {
        Self::new(MediaKind::Show, title)
    }

    pub fn season(title: impl Into<String>, season: u32) -> Self {
        Self {
            season: Some(season),
            ..Self::new(MediaKind::Season, title)
        }
    }

    pub fn episode(title: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            season: Some(season),
            episode: Some(episode),
            ..Self::new(MediaKind::Episode, title)
        }
    }

    pub fn with_episodes(mut self, episodes: Vec<u32>) -> Self {
        self.episodes = episodes;
        self
    }

    pub fn with_releases(mut self, releases: Vec<ReleaseCandidate>) -> Self {
        self.releases = releases;
        self
    }

    pub fn with_version(mut self, version: VersionProfile) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn with_deviation(mut self, pattern: impl Into<String>) -> Self {
        self.deviation = Some(pattern.into());
        self
    }

    pub fn is_show(&self) -> bool {
        self.kind != MediaKind::Movie
    }

    /// Human readable title used for logging and remote name matching.
    pub fn query(&self) -> String {
        match (self.kind, self.season, self.episode) {
            (MediaKind::Movie, ..) => match self.year {
                Some(year) => format!("{} {}", self.title, year),
                None => self.title.clone(),
            },
            (MediaKind::Season, Some(s), _) => format!("{} S{:02}", self.title, s),
            (MediaKind::Episode, Some(s), Some(e)) => {
                format!("{} S{:02}E{:02}", self.title, s, e)
            }
            _ => self.title.clone(),
        }
    }

    /// Wanted file-name patterns for this granularity.
    pub fn files(&self) -> Vec<String> {
        match (self.kind, self.season, self.episode) {
            (MediaKind::Episode, Some(s), Some(e)) => vec![format!("S{:02}E{:02}", s, e)],
            (MediaKind::Season, Some(s), _) if !self.episodes.is_empty() => self
                .episodes
                .iter()
                .map(|e| format!("S{:02}E{:02}", s, e))
                .collect(),
            (MediaKind::Season, Some(s), _) => vec![format!(r"S{:02}E\d+", s)],
            (MediaKind::Movie, ..) => vec![r"\.(mkv|mp4|avi|m4v|mov|wmv|webm|ts|m2ts)$".to_string()],
            _ => vec![r"S\d+E\d+".to_string()],
        }
    }

    /// Pattern a release title must match from its start.
    pub fn deviation(&self) -> String {
        if let Some(pattern) = &self.deviation {
            return pattern.clone();
        }
        let title = title_pattern(&self.title);
        match (self.kind, self.season, self.episode) {
            (MediaKind::Movie, ..) => match self.year {
                Some(year) => format!(r"{}.*{}", title, year),
                None => title,
            },
            (MediaKind::Season, Some(s), _) => format!(r"{}.*S{:02}", title, s),
            (MediaKind::Episode, Some(s), Some(e)) => {
                format!(r"{}.*S{:02}E{:02}", title, s, e)
            }
            _ => title,
        }
    }

    /// Whole-season marker accepted for single episodes (`S01`).
    pub fn alternative_season_pattern(&self) -> Option<String> {
        match (self.kind, self.season) {
            (MediaKind::Episode, Some(s)) => Some(format!("S{:02}", s)),
            _ => None,
        }
    }

    /// Identifier used in the in-flight downloading set.
    pub fn download_id(&self) -> String {
        match &self.version {
            Some(version) => format!("{} [{}]", self.query(), version.name),
            None => self.query(),
        }
    }

    /// Whether an uncached remote download may be kept pending.
    pub fn allows_uncached(&self) -> bool {
        self.version
            .as_ref()
            .map(|v| v.cache_status == CacheRule::Any)
            .unwrap_or(true)
    }

    pub fn metadata(&self) -> ItemMetadata {
        ItemMetadata {
            is_show: self.is_show(),
            title: Some(self.title.clone()),
            year: self.year,
            season: self.season,
        }
    }

    pub fn is_cooling_down(&self, now: DateTime<Utc>) -> bool {
        self.retry.cooldown_until.map(|t| t > now).unwrap_or(false)
    }

    pub fn record_failure(&mut self, now: DateTime<Utc>, cooldown: Duration) {
        self.retry.attempts += 1;
        let delta = TimeDelta::from_std(cooldown).unwrap_or(TimeDelta::zero());
        self.retry.cooldown_until = Some(now + delta);
    }

    pub fn record_success(&mut self) {
        self.retry = RetryState::default();
    }
}

/// Title words escaped and joined by any run of separators.
fn title_pattern(title: &str) -> String {
    let words: Vec<String> = title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(regex_lite::escape)
        .collect();
    words.join(r"[^A-Za-z0-9]*")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::compile_deviation;

    #[test]
    fn test_query_per_kind() {
        assert_eq!(RequestItem::movie("Heat", Some(1995)).query(), "Heat 1995");
        assert_eq!(RequestItem::season("The Show", 1).query(), "The Show S01");
        assert_eq!(
            RequestItem::episode("The Show", 1, 5).query(),
            "The Show S01E05"
        );
    }

    #[test]
    fn test_episode_deviation_matches_release_titles() {
        let item = RequestItem::episode("The Show", 1, 5);
        let re = compile_deviation(&item.deviation()).unwrap();
        assert!(re.is_match("The.Show.S01E05.1080p.WEB-DL"));
        assert!(re.is_match("the show s01e05 720p"));
        assert!(!re.is_match("The.Show.S01.COMPLETE.1080p"));
        assert!(!re.is_match("Other.Show.S01E05"));
    }

    #[test]
    fn test_deviation_escapes_title() {
        let item = RequestItem::movie("Mission: Impossible (Fallout)", Some(2018));
        let re = compile_deviation(&item.deviation()).unwrap();
        assert!(re.is_match("Mission.Impossible.Fallout.2018.2160p"));
    }

    #[test]
    fn test_deviation_override() {
        let item = RequestItem::season("The Show", 1).with_deviation(r"Test\.Show\.S01");
        assert_eq!(item.deviation(), r"Test\.Show\.S01");
    }

    #[test]
    fn test_files_per_granularity() {
        assert_eq!(RequestItem::episode("X", 2, 3).files(), vec!["S02E03"]);
        assert_eq!(
            RequestItem::season("X", 1).with_episodes(vec![1, 2]).files(),
            vec!["S01E01", "S01E02"]
        );
        assert_eq!(RequestItem::season("X", 1).files(), vec![r"S01E\d+"]);
    }

    #[test]
    fn test_alternative_season_pattern_only_for_episodes() {
        assert_eq!(
            RequestItem::episode("X", 1, 2).alternative_season_pattern(),
            Some("S01".to_string())
        );
        assert_eq!(RequestItem::season("X", 1).alternative_season_pattern(), None);
    }

    #[test]
    fn test_download_id_and_cache_rules() {
        let item = RequestItem::movie("Heat", Some(1995));
        assert_eq!(item.download_id(), "Heat 1995");
        assert!(item.allows_uncached());

        let item = item.with_version(VersionProfile::new("1080p", CacheRule::RequirementCached));
        assert_eq!(item.download_id(), "Heat 1995 [1080p]");
        assert!(!item.allows_uncached());
    }

    #[test]
    fn test_retry_bookkeeping() {
        let now = Utc::now();
        let mut item = RequestItem::movie("Heat", None);
        assert!(!item.is_cooling_down(now));

        item.record_failure(now, Duration::from_secs(600));
        assert_eq!(item.retry.attempts, 1);
        assert!(item.is_cooling_down(now));
        assert!(!item.is_cooling_down(now + TimeDelta::seconds(601)));

        item.record_success();
        assert_eq!(item.retry, RetryState::default());
    }

    #[test]
    fn test_deserialize_minimal_item() {
        let item: RequestItem = serde_json::from_str(
            r#"{"kind": "episode", "title": "The Show", "season": 1, "episode": 2}"#,
        )
        .unwrap();
        assert_eq!(item.kind, MediaKind::Episode);
        assert!(item.releases.is_empty());
        assert_eq!(item.retry.attempts, 0);
    }
}
