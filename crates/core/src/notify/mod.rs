//! Post-download notifications: library rescans and request fulfilment.

mod jellyfin;
mod jellyseerr;
mod types;

pub use jellyfin::JellyfinRefresher;
pub use jellyseerr::JellyseerrTracker;
pub use types::{LibraryRefresher, NotifyError, RequestTracker};
