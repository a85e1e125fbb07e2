//! Download orchestration for request items.
//!
//! The orchestrator walks an item's releases and drives each through one of
//! three paths:
//! - **HTTP direct**: the link is fetched as is
//! - **Add and inspect**: uncached torrents are added to learn their files,
//!   then downloaded or left pending on the provider
//! - **Cached**: a ranked cached version is selected, unrestricted and fetched
//!
//! The [`Engine`] wraps availability checks, the orchestrator and per-item
//! cooldowns into a single `process` call.

mod config;
mod engine;
mod runner;
mod state;
mod types;

pub use config::OrchestratorConfig;
pub use engine::Engine;
pub use runner::DownloadOrchestrator;
pub use state::DownloadingSet;
pub use types::{DownloadOptions, DownloadOutcome, OrchestratorError, ProcessOutcome, RejectReason};
