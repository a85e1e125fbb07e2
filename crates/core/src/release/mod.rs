//! Release candidates and the files the debrid service reports for them.
//!
//! A `ReleaseCandidate` is created by a scraper, annotated with cached
//! `FileVersion`s by the availability resolver, and consumed by the
//! download orchestrator.

mod file;
mod types;
mod version;

pub use file::RemoteFile;
pub use types::{ReleaseCandidate, ReleaseKind, INFO_HASH_LEN};
pub(crate) use types::is_http_url;
pub use version::FileVersion;
