//! Requested media items.
//!
//! A `RequestItem` carries the scraped releases for one movie, show, season
//! or episode together with the patterns derived from its granularity.

mod types;

pub use types::{CacheRule, MediaKind, RequestItem, RetryState, VersionProfile};
