//! Selection and ranking.
//!
//! Two independent scorers: cached-version ranking for debrid releases and
//! best-file selection among the downloadable files of a release.

mod best_file;
mod ranking;

pub use best_file::{
    has_video_extension, is_rejected_file, looks_like_video, quality_score, rank_files,
    select_best_file, FileCandidate, VIDEO_EXTENSIONS,
};
pub use ranking::{best_version, compare_versions, rank_versions};
