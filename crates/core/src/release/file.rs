//! Classification of single remote files.

use serde::{Deserialize, Serialize};

use crate::matcher::PatternSet;

const BYTES_PER_GB: f64 = 1_000_000_000.0;

/// Suffixes that are never media, whatever the configured patterns say.
const BLOCKED_SUFFIXES: &[&str] = &[".exe", ".txt"];

/// A file inside a remote torrent, classified against the wanted/unwanted patterns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Provider-assigned file id.
    pub id: String,
    pub name: String,
    pub size_gb: f64,
    pub wanted: bool,
    pub unwanted: bool,
    /// The wanted pattern that matched, empty otherwise.
    #[serde(default)]
    pub match_key: String,
}

impl RemoteFile {
    /// Classify a file. Wanted patterns are tried first, in order; the
    /// unwanted check only runs when nothing wanted matched.
    pub fn classify(
        id: impl Into<String>,
        name: impl Into<String>,
        size_bytes: u64,
        patterns: &PatternSet,
    ) -> Self {
        let name = name.into();
        let (wanted, match_key) = match patterns.wanted_match(&name) {
            Some(hit) => (true, hit.key().to_string()),
            None => (false, String::new()),
        };
        let unwanted = !wanted && (patterns.is_unwanted(&name) || has_blocked_suffix(&name));

        Self {
            id: id.into(),
            name,
            size_gb: size_bytes as f64 / BYTES_PER_GB,
            wanted,
            unwanted,
            match_key,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        (self.size_gb * BYTES_PER_GB).round() as u64
    }
}

impl PartialEq for RemoteFile {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RemoteFile {}

fn has_blocked_suffix(name: &str) -> bool {
    let lower = name.to_lowercase();
    BLOCKED_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> PatternSet {
        PatternSet::compile(&["S01E01"], &["sample"]).unwrap()
    }

    #[test]
    fn test_wanted_file() {
        let file = RemoteFile::classify("1", "Show.S01E01.1080p.mkv", 2_000_000_000, &patterns());
        assert!(file.wanted);
        assert!(!file.unwanted);
        assert_eq!(file.match_key, "S01E01");
        assert!((file.size_gb - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unwanted_by_pattern() {
        let file = RemoteFile::classify("2", "Show.S01E02.sample.mkv", 50_000_000, &patterns());
        assert!(!file.wanted);
        assert!(file.unwanted);
        assert!(file.match_key.is_empty());
    }

    #[test]
    fn test_unwanted_by_suffix() {
        let none = PatternSet::compile::<&str, &str>(&["S01E01"], &[]).unwrap();
        let file = RemoteFile::classify("3", "RARBG.txt", 100, &none);
        assert!(file.unwanted);

        let file = RemoteFile::classify("4", "setup.EXE", 100, &none);
        assert!(file.unwanted);
    }

    #[test]
    fn test_wanted_takes_priority_over_unwanted() {
        let file = RemoteFile::classify("5", "Show.S01E01.sample.txt", 100, &patterns());
        assert!(file.wanted);
        assert!(!file.unwanted);
    }

    #[test]
    fn test_neither() {
        let file = RemoteFile::classify("6", "Show.S01E03.mkv", 100, &patterns());
        assert!(!file.wanted);
        assert!(!file.unwanted);
    }

    #[test]
    fn test_equality_by_id() {
        let a = RemoteFile::classify("7", "a.mkv", 1, &patterns());
        let b = RemoteFile::classify("7", "b.mkv", 2, &patterns());
        let c = RemoteFile::classify("8", "a.mkv", 1, &patterns());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
