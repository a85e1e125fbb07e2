//! Aggregation of classified files into candidate versions.

use serde::{Deserialize, Serialize};

use super::RemoteFile;

/// One possible file-set ("take") of a release's content.
///
/// Aggregate counts are computed once at construction and never change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileVersion {
    files: Vec<RemoteFile>,
    wanted_count: usize,
    unwanted_count: usize,
    total_size_gb: f64,
}

impl FileVersion {
    /// Aggregate a provider file group. No filtering is applied.
    pub fn aggregate(files: Vec<RemoteFile>) -> Self {
        let wanted_count = files.iter().filter(|f| f.wanted).count();
        let unwanted_count = files.iter().filter(|f| f.unwanted).count();
        let total_size_gb = files.iter().map(|f| f.size_gb).sum();
        Self {
            files,
            wanted_count,
            unwanted_count,
            total_size_gb,
        }
    }

    pub fn files(&self) -> &[RemoteFile] {
        &self.files
    }

    pub fn wanted_count(&self) -> usize {
        self.wanted_count
    }

    pub fn unwanted_count(&self) -> usize {
        self.unwanted_count
    }

    pub fn total_size_gb(&self) -> f64 {
        self.total_size_gb
    }

    /// Provider ids of every file in this version.
    pub fn file_ids(&self) -> Vec<String> {
        self.files.iter().map(|f| f.id.clone()).collect()
    }

    /// More than half of the requested wanted patterns are covered.
    pub fn satisfies_majority(&self, requested_wanted: usize) -> bool {
        !self.files.is_empty() && self.wanted_count * 2 > requested_wanted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::PatternSet;

    fn files() -> Vec<RemoteFile> {
        let patterns = PatternSet::compile(&["S01E0[12]"], &["sample"]).unwrap();
        vec![
            RemoteFile::classify("1", "Show.S01E01.mkv", 1_000_000_000, &patterns),
            RemoteFile::classify("2", "Show.S01E02.mkv", 1_500_000_000, &patterns),
            RemoteFile::classify("3", "sample.mkv", 500_000_000, &patterns),
            RemoteFile::classify("4", "notes.nfo", 1_000, &patterns),
        ]
    }

    #[test]
    fn test_aggregate_counts() {
        let version = FileVersion::aggregate(files());
        assert_eq!(version.files().len(), 4);
        assert_eq!(version.wanted_count(), 2);
        assert_eq!(version.unwanted_count(), 1);
        assert!((version.total_size_gb() - 3.000001).abs() < 1e-9);
        assert_eq!(version.file_ids(), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_empty_version() {
        let version = FileVersion::aggregate(vec![]);
        assert_eq!(version.wanted_count(), 0);
        assert_eq!(version.total_size_gb(), 0.0);
        assert!(!version.satisfies_majority(0));
    }

    #[test]
    fn test_majority_rule() {
        let version = FileVersion::aggregate(files());
        assert!(version.satisfies_majority(1));
        assert!(version.satisfies_majority(3));
        assert!(!version.satisfies_majority(4));
    }
}
