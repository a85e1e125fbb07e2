//! Local placement of downloaded files.
//!
//! Turns a direct link into a file inside the media library:
//!
//! - file names are sanitized (illegal characters, separators, dot runs)
//! - show/movie metadata is parsed from names when the item carries none
//! - destinations follow `Shows/<Title>/Season NN/` and `Movies/<Title> (<Year>)/`
//! - transfers stream into a staging directory, are validated against the
//!   expected size, and are moved into place with a rename (copy fallback)
//!
//! # Example
//!
//! ```ignore
//! use debridarr_core::placer::{FetchRequest, Fetcher, HttpFetcher, ItemMetadata, LibraryLayout};
//!
//! let fetcher = HttpFetcher::new(FetcherConfig::default(), LibraryLayout::new(library));
//! let request = FetchRequest::new(url, "Heat.1995.1080p.mkv", ItemMetadata::movie("Heat", Some(1995)))
//!     .with_expected_size(Some(8_000_000_000));
//! let path = fetcher.fetch(request).await?;
//! ```

mod config;
mod error;
mod http_fetcher;
mod layout;
mod metadata;
mod sanitize;
mod traits;
mod types;

pub use config::FetcherConfig;
pub use error::FetchError;
pub use http_fetcher::{validate_size, HttpFetcher};
pub use layout::LibraryLayout;
pub use metadata::{parse_metadata, MediaMetadata, Quality};
pub use sanitize::{sanitize_filename, PLACEHOLDER_NAME};
pub use traits::Fetcher;
pub use types::{FetchRequest, ItemMetadata};
