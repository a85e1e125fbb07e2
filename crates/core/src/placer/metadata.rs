//! Metadata extraction from release and file names.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

static SEASON_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)S(\d+)E(\d+)").expect("valid regex"));
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:19|20)\d{2}").expect("valid regex"));
static SHOW_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+?)[.\s]+S\d+E\d+").expect("valid regex"));
static MOVIE_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)[.\s]+(?:19|20)\d{2}").expect("valid regex"));
static MOVIE_TITLE_BY_QUALITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+?)[.\s]+(?:720p|1080p|2160p|4K)").expect("valid regex"));
static QUALITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(2160p|4K|1080p|720p|480p)").expect("valid regex"));

/// Normalized video quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "4K")]
    Uhd4k,
    #[serde(rename = "1080P")]
    P1080,
    #[serde(rename = "720P")]
    P720,
    #[serde(rename = "480P")]
    P480,
}

impl Quality {
    /// Parse a quality token; `2160p` normalizes to `4K`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_uppercase().as_str() {
            "4K" | "2160P" => Some(Quality::Uhd4k),
            "1080P" => Some(Quality::P1080),
            "720P" => Some(Quality::P720),
            "480P" => Some(Quality::P480),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Uhd4k => "4K",
            Quality::P1080 => "1080P",
            Quality::P720 => "720P",
            Quality::P480 => "480P",
        }
    }
}

/// Metadata parsed from a file name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Detected by an `SxxEyy` marker.
    pub is_show: bool,
    /// Title with separators turned into spaces, empty if not found.
    pub title: String,
    pub year: Option<u16>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub quality: Option<Quality>,
}

/// Parse show/movie metadata from a release or file name.
pub fn parse_metadata(name: &str) -> MediaMetadata {
    let mut info = MediaMetadata {
        year: YEAR.find(name).and_then(|m| m.as_str().parse().ok()),
        quality: QUALITY
            .captures(name)
            .and_then(|c| Quality::from_token(&c[1])),
        ..MediaMetadata::default()
    };

    if let Some(caps) = SEASON_EPISODE.captures(name) {
        info.is_show = true;
        info.season = caps[1].parse().ok();
        info.episode = caps[2].parse().ok();
        if let Some(t) = SHOW_TITLE.captures(name) {
            info.title = clean_title(&t[1]);
        }
    } else if let Some(t) = MOVIE_TITLE
        .captures(name)
        .or_else(|| MOVIE_TITLE_BY_QUALITY.captures(name))
    {
        info.title = clean_title(&t[1]);
    }

    info
}

fn clean_title(raw: &str) -> String {
    raw.replace(['.', '_'], " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_episode() {
        let info = parse_metadata("The.Show.S02E05.1080p.WEB-DL.mkv");
        assert!(info.is_show);
        assert_eq!(info.title, "The Show");
        assert_eq!(info.season, Some(2));
        assert_eq!(info.episode, Some(5));
        assert_eq!(info.quality, Some(Quality::P1080));
        assert_eq!(info.year, None);
    }

    #[test]
    fn test_parse_movie_with_year() {
        let info = parse_metadata("Some_Movie.2019.2160p.BluRay.mkv");
        assert!(!info.is_show);
        assert_eq!(info.title, "Some Movie");
        assert_eq!(info.year, Some(2019));
        assert_eq!(info.quality, Some(Quality::Uhd4k));
    }

    #[test]
    fn test_parse_movie_without_year_uses_quality_marker() {
        let info = parse_metadata("Another Movie 720p x264.mp4");
        assert_eq!(info.title, "Another Movie");
        assert_eq!(info.year, None);
        assert_eq!(info.quality, Some(Quality::P720));
    }

    #[test]
    fn test_parse_unknown() {
        let info = parse_metadata("random_file.mkv");
        assert!(!info.is_show);
        assert!(info.title.is_empty());
        assert!(info.quality.is_none());
    }

    #[test]
    fn test_quality_tokens() {
        assert_eq!(Quality::from_token("2160p"), Some(Quality::Uhd4k));
        assert_eq!(Quality::from_token("4k"), Some(Quality::Uhd4k));
        assert_eq!(Quality::from_token("576p"), None);
        assert_eq!(Quality::Uhd4k.as_str(), "4K");
    }
}
