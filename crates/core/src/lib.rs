pub mod config;
pub mod debrid;
pub mod item;
pub mod matcher;
pub mod notify;
pub mod orchestrator;
pub mod placer;
pub mod release;
pub mod resolver;
pub mod selection;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use debrid::{DebridClient, DebridError, RealDebridClient};
pub use item::{CacheRule, MediaKind, RequestItem, VersionProfile};
pub use orchestrator::{
    DownloadOptions, DownloadOrchestrator, DownloadOutcome, DownloadingSet, Engine,
    OrchestratorConfig, OrchestratorError, ProcessOutcome,
};
pub use placer::{FetchError, Fetcher, HttpFetcher, LibraryLayout};
pub use release::{FileVersion, ReleaseCandidate, RemoteFile};
pub use resolver::{AvailabilityReport, AvailabilityResolver, ResolverConfig, ResolverError};
