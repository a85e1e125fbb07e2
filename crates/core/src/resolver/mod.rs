//! Debrid cache availability resolution.
//!
//! One batch request covers every valid hash of an item. When the batch
//! fails (network error, empty body, error object) each hash is checked on
//! its own, with a fixed delay after every request, and a failing hash only
//! affects its own releases.

mod availability;
mod config;
mod types;

pub use availability::AvailabilityResolver;
pub use config::ResolverConfig;
pub use types::{AvailabilityReport, ResolverError};
