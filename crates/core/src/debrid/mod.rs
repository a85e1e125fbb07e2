//! Debrid service abstraction.
//!
//! This module provides a `DebridClient` trait for cache lookups and remote
//! torrent management, with a Real-Debrid backend.

mod realdebrid;
mod types;

pub use realdebrid::{parse_instant_availability, RealDebridClient};
pub use types::*;
