//! Best-file selection among downloadable files of a release.

use std::cmp::Ordering;

use tracing::debug;

use crate::placer::{parse_metadata, Quality};

/// Extensions recognised as video containers.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    ".mkv", ".mp4", ".avi", ".mov", ".flv", ".wmv", ".webm", ".m4v", ".mpg", ".mpeg", ".3gp",
    ".ogv", ".ts", ".m2ts", ".mts", ".m2v", ".m4p", ".mxf", ".asf", ".rm", ".rmvb", ".vob",
    ".f4v", ".divx",
];

/// Archives and other files that must never be picked.
const REJECTED_EXTENSIONS: &[&str] = &[
    ".rar", ".zip", ".7z", ".tar", ".gz", ".iso", ".exe", ".bat", ".cmd", ".msi", ".scr", ".lnk",
    ".txt", ".nfo", ".srt", ".sub", ".idx", ".jpg", ".jpeg", ".png", ".url", ".html", ".htm",
];

/// Tokens that identify a video release when a link has no extension.
const VIDEO_TOKENS: &[&str] = &[
    "2160p", "1080p", "720p", "480p", "4k", "bluray", "blu-ray", "web-dl", "webdl", "webrip",
    "hdtv", "remux", "x264", "x265", "hevc",
];

/// A downloadable file of a release.
#[derive(Debug, Clone, PartialEq)]
pub struct FileCandidate {
    pub name: String,
    pub size_bytes: u64,
    /// Link to fetch this file from, when already resolved.
    pub url: Option<String>,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Whether the file has a known video extension.
pub fn has_video_extension(name: &str) -> bool {
    let lower = name.to_lowercase();
    VIDEO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Whether the file is an archive or other unsafe/non-media file.
pub fn is_rejected_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    REJECTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Video by extension, or by quality/source tokens for extensionless names.
pub fn looks_like_video(name: &str) -> bool {
    if has_video_extension(name) {
        return true;
    }
    let lower = name.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .filter(|t| !t.is_empty())
        .collect();
    VIDEO_TOKENS.iter().any(|vt| tokens.contains(vt))
}

/// Numeric score used to compare qualities.
pub fn quality_score(quality: Option<Quality>) -> u32 {
    match quality {
        Some(Quality::Uhd4k) => 4000,
        Some(Quality::P1080) => 1080,
        Some(Quality::P720) => 720,
        Some(Quality::P480) => 480,
        None => 0,
    }
}

/// Suitable files ordered best-first: quality, then size.
///
/// Archives and names that do not look like video are discarded.
pub fn rank_files(files: &[FileCandidate]) -> Vec<&FileCandidate> {
    let mut scored: Vec<(u32, &FileCandidate)> = files
        .iter()
        .filter(|f| !is_rejected_file(&f.name) && looks_like_video(&f.name))
        .map(|f| (quality_score(parse_metadata(&f.name).quality), f))
        .collect();

    scored.sort_by(|(qa, a), (qb, b)| match qb.cmp(qa) {
        Ordering::Equal => b.size_bytes.cmp(&a.size_bytes),
        other => other,
    });

    scored.into_iter().map(|(_, f)| f).collect()
}

/// Pick the file with the best quality, breaking ties by size.
///
/// Returns `None` when nothing suitable remains.
pub fn select_best_file(files: &[FileCandidate]) -> Option<&FileCandidate> {
    let best = rank_files(files).into_iter().next()?;
    debug!(
        file = %best.name,
        quality_score = quality_score(parse_metadata(&best.name).quality),
        size_gb = best.size_bytes as f64 / 1_073_741_824.0,
        "Selected best file"
    );
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_beats_size() {
        let files = vec![
            FileCandidate::new("Show.S01E01.1080p.mkv", 2_000_000_000),
            FileCandidate::new("Show.S01E01.720p.mkv", 2_500_000_000),
        ];
        let best = select_best_file(&files).unwrap();
        assert_eq!(best.name, "Show.S01E01.1080p.mkv");
    }

    #[test]
    fn test_size_breaks_quality_tie() {
        let files = vec![
            FileCandidate::new("Movie.2020.1080p.WEB.mkv", 3_000_000_000),
            FileCandidate::new("Movie.2020.1080p.BluRay.mkv", 9_000_000_000),
        ];
        let best = select_best_file(&files).unwrap();
        assert_eq!(best.name, "Movie.2020.1080p.BluRay.mkv");
    }

    #[test]
    fn test_2160p_scores_as_4k() {
        let files = vec![
            FileCandidate::new("Movie.2020.1080p.mkv", 20_000_000_000),
            FileCandidate::new("Movie.2020.2160p.mkv", 10_000_000_000),
        ];
        assert_eq!(select_best_file(&files).unwrap().name, "Movie.2020.2160p.mkv");
    }

    #[test]
    fn test_only_archives_yields_none() {
        let files = vec![
            FileCandidate::new("Movie.2020.1080p.rar", 5_000_000_000),
            FileCandidate::new("readme.txt", 1_000),
        ];
        assert!(select_best_file(&files).is_none());
    }

    #[test]
    fn test_empty_yields_none() {
        assert!(select_best_file(&[]).is_none());
    }

    #[test]
    fn test_extensionless_http_name_with_quality_token() {
        let files = vec![FileCandidate::new("Movie 2020 1080p WEB-DL", 4_000_000_000)];
        assert!(select_best_file(&files).is_some());

        let files = vec![FileCandidate::new("download", 4_000_000_000)];
        assert!(select_best_file(&files).is_none());
    }

    #[test]
    fn test_rank_files_orders_all_survivors() {
        let files = vec![
            FileCandidate::new("Show.S01E02.720p.mkv", 1_000),
            FileCandidate::new("Show.S01E01.1080p.mkv", 1_000),
            FileCandidate::new("Show.S01.nfo", 10),
            FileCandidate::new("Show.S01E03.1080p.mkv", 2_000),
        ];
        let ranked: Vec<&str> = rank_files(&files).iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            ranked,
            vec!["Show.S01E03.1080p.mkv", "Show.S01E01.1080p.mkv", "Show.S01E02.720p.mkv"]
        );
    }

    #[test]
    fn test_looks_like_video() {
        assert!(looks_like_video("a.MKV"));
        assert!(looks_like_video("Show S01E01 HDTV"));
        assert!(looks_like_video("Movie.WEBRip.x264"));
        assert!(!looks_like_video("cover.jpg"));
    }
}
