//! Ordering of cached file versions.

use std::cmp::Ordering;

use crate::release::FileVersion;

/// Order versions best-first: most files, then largest total size, then
/// most wanted files, then fewest unwanted files.
pub fn compare_versions(a: &FileVersion, b: &FileVersion) -> Ordering {
    b.files()
        .len()
        .cmp(&a.files().len())
        .then_with(|| {
            b.total_size_gb()
                .partial_cmp(&a.total_size_gb())
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| b.wanted_count().cmp(&a.wanted_count()))
        .then_with(|| a.unwanted_count().cmp(&b.unwanted_count()))
}

/// Sort versions in place, best first. The sort is stable.
pub fn rank_versions(versions: &mut [FileVersion]) {
    versions.sort_by(compare_versions);
}

/// The best version after ranking, if any.
pub fn best_version(versions: &[FileVersion]) -> Option<&FileVersion> {
    versions.first()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::PatternSet;
    use crate::release::RemoteFile;

    fn version(files: &[(&str, u64)]) -> FileVersion {
        let patterns = PatternSet::compile(&["wanted"], &["junk"]).unwrap();
        FileVersion::aggregate(
            files
                .iter()
                .enumerate()
                .map(|(i, (name, size))| RemoteFile::classify(i.to_string(), *name, *size, &patterns))
                .collect(),
        )
    }

    #[test]
    fn test_more_files_wins() {
        let mut versions = vec![
            version(&[("wanted.a.mkv", 9_000_000_000)]),
            version(&[("wanted.b.mkv", 1_000_000_000), ("c.mkv", 1_000_000_000)]),
        ];
        rank_versions(&mut versions);
        assert_eq!(versions[0].files().len(), 2);
    }

    #[test]
    fn test_size_breaks_file_count_tie() {
        let mut versions = vec![
            version(&[("wanted.a.mkv", 1_000_000_000)]),
            version(&[("b.mkv", 3_000_000_000)]),
        ];
        rank_versions(&mut versions);
        assert_eq!(versions[0].files()[0].name, "b.mkv");
    }

    #[test]
    fn test_wanted_then_unwanted_break_ties() {
        let mut versions = vec![
            version(&[("junk.mkv", 1_000_000_000)]),
            version(&[("plain.mkv", 1_000_000_000)]),
            version(&[("wanted.mkv", 1_000_000_000)]),
        ];
        rank_versions(&mut versions);
        assert_eq!(versions[0].files()[0].name, "wanted.mkv");
        assert_eq!(versions[1].files()[0].name, "plain.mkv");
        assert_eq!(versions[2].files()[0].name, "junk.mkv");
    }

    #[test]
    fn test_best_version_of_empty() {
        assert!(best_version(&[]).is_none());
    }

    #[test]
    fn test_best_version_after_ranking() {
        let mut versions = vec![
            version(&[("wanted.a.mkv", 1_000_000_000)]),
            version(&[("wanted.a.mkv", 1_000_000_000), ("wanted.b.mkv", 1_000_000_000)]),
        ];
        rank_versions(&mut versions);
        assert_eq!(best_version(&versions).map(|v| v.files().len()), Some(2));
    }
}
