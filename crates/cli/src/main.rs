use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use debridarr_core::{
    config::DebridBackend,
    notify::{JellyfinRefresher, JellyseerrTracker},
    load_config, validate_config, Config, DebridClient, Engine, Fetcher, HttpFetcher,
    LibraryLayout, ProcessOutcome, RealDebridClient, RequestItem, SanitizedConfig,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "debridarr", version, about = "Resolve scraped releases through a debrid provider")]
struct Cli {
    /// Configuration file
    #[arg(long, env = "DEBRIDARR_CONFIG", default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Emit logs and results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check availability and download every item in a JSON file
    Resolve {
        /// JSON array of request items with their scraped releases
        items: PathBuf,

        /// Only add releases to the provider, do not download locally
        #[arg(long)]
        no_stream: bool,

        /// Look for torrents already on the account before resolving
        #[arg(long)]
        existing: bool,

        /// Write items back with updated retry state
        #[arg(long)]
        save: bool,
    },
    /// Only check which releases are cached
    Check {
        /// JSON array of request items with their scraped releases
        items: PathBuf,
    },
    /// Print the configuration with secrets redacted
    Config,
}

#[derive(Debug, Serialize)]
struct ItemSummary {
    item: String,
    #[serde(flatten)]
    outcome: ProcessOutcome,
}

#[derive(Debug, Serialize)]
struct CachedSummary {
    item: String,
    release: String,
    size_gb: f64,
    wanted: usize,
    unwanted: usize,
    versions: usize,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.json);

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("debridarr {}", VERSION);
    info!("Loading configuration from {:?}", cli.config);
    let mut config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    validate_config(&config).context("Configuration validation failed")?;

    match cli.command {
        Command::Config => {
            let sanitized = SanitizedConfig::from(&config);
            println!("{}", serde_json::to_string_pretty(&sanitized)?);
            Ok(())
        }
        Command::Check { items } => {
            let mut items = read_items(&items)?;
            let engine = build_engine(&config)?;
            let mut cached = Vec::new();

            for item in items.iter_mut() {
                let report = match engine.check(item).await {
                    Ok(report) => report,
                    Err(e) => {
                        warn!(item = %item.query(), error = %e, "Availability check failed");
                        continue;
                    }
                };
                info!(item = %item.query(), cached = report.cached, hashes = report.hashes, "Checked item");
                cached.extend(item.releases.iter().filter(|r| r.is_cached()).map(|r| {
                    CachedSummary {
                        item: item.query(),
                        release: r.title.clone(),
                        size_gb: r.size_gb,
                        wanted: r.wanted,
                        unwanted: r.unwanted,
                        versions: r.file_versions.len(),
                    }
                }));
            }

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&cached)?);
            } else {
                for c in &cached {
                    println!(
                        "{}\t{}\t{:.2} GB\twanted={} unwanted={} versions={}",
                        c.item, c.release, c.size_gb, c.wanted, c.unwanted, c.versions
                    );
                }
            }
            Ok(())
        }
        Command::Resolve {
            items: path,
            no_stream,
            existing,
            save,
        } => {
            if no_stream {
                config.orchestrator.stream = false;
            }
            let mut items = read_items(&path)?;
            let engine = build_engine(&config)?;
            let mut summaries = Vec::with_capacity(items.len());

            for item in items.iter_mut() {
                if existing {
                    match engine.download_from_existing(item).await {
                        Ok(outcome) if outcome.is_success() => {
                            summaries.push(ItemSummary {
                                item: item.query(),
                                outcome: ProcessOutcome::Attempted { download: outcome },
                            });
                            continue;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(item = %item.query(), error = %e, "Could not scan existing torrents");
                        }
                    }
                }

                match engine.process(item).await {
                    Ok(outcome) => summaries.push(ItemSummary {
                        item: item.query(),
                        outcome,
                    }),
                    Err(e) => warn!(item = %item.query(), error = %e, "Item could not be processed"),
                }
            }

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                for s in &summaries {
                    println!("{}\t{}", s.item, describe(&s.outcome));
                }
            }

            if save {
                write_items(&path, &items)?;
                info!("Saved {} items to {:?}", items.len(), path);
            }
            Ok(())
        }
    }
}

fn build_engine(config: &Config) -> Result<Engine> {
    let debrid: Arc<dyn DebridClient> = match config.debrid.backend {
        DebridBackend::RealDebrid => {
            let rd_config = config
                .debrid
                .real_debrid
                .clone()
                .context("Real-Debrid backend selected but [debrid.real_debrid] is missing")?;
            info!("Initializing Real-Debrid client at {}", rd_config.url);
            Arc::new(RealDebridClient::new(rd_config))
        }
    };

    let layout = LibraryLayout::new(config.library.clone());
    info!("Library root: {:?}", layout.config().root);
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(config.downloader.clone(), layout));

    let mut engine = Engine::new(
        debrid,
        fetcher,
        config.resolver.clone(),
        config.orchestrator.clone(),
    );

    if let Some(jellyfin) = &config.jellyfin {
        info!("Jellyfin library refresh enabled at {}", jellyfin.url);
        engine = engine.with_refresher(Arc::new(JellyfinRefresher::new(jellyfin.clone())));
    }
    if let Some(jellyseerr) = &config.jellyseerr {
        info!("Jellyseerr request tracking enabled at {}", jellyseerr.url);
        engine = engine.with_tracker(Arc::new(JellyseerrTracker::new(jellyseerr.clone())));
    }

    Ok(engine)
}

fn read_items(path: &Path) -> Result<Vec<RequestItem>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read items from {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse items in {:?}", path))
}

fn write_items(path: &Path, items: &[RequestItem]) -> Result<()> {
    let json = serde_json::to_string_pretty(items)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write items to {:?}", path))
}

fn describe(outcome: &ProcessOutcome) -> String {
    use debridarr_core::DownloadOutcome;

    match outcome {
        ProcessOutcome::CoolingDown => "cooling down".to_string(),
        ProcessOutcome::InFlight => "already downloading".to_string(),
        ProcessOutcome::Attempted { download } => match download {
            DownloadOutcome::Downloaded { release, paths } => {
                format!("downloaded {} ({} files)", release, paths.len())
            }
            DownloadOutcome::Pending { release } => format!("pending {}", release),
            DownloadOutcome::Exhausted => "no usable release".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use debridarr_core::DownloadOutcome;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cli_parses_resolve() {
        let cli = Cli::try_parse_from([
            "debridarr",
            "--config",
            "/etc/debridarr.toml",
            "resolve",
            "items.json",
            "--no-stream",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/debridarr.toml"));
        match cli.command {
            Command::Resolve {
                items, no_stream, ..
            } => {
                assert_eq!(items, PathBuf::from("items.json"));
                assert!(no_stream);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_read_items() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"kind": "movie", "title": "Heat", "year": 1995, "releases": []}}]"#
        )
        .unwrap();

        let items = read_items(file.path()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].query(), "Heat 1995");
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            describe(&ProcessOutcome::Attempted {
                download: DownloadOutcome::Exhausted
            }),
            "no usable release"
        );
        assert_eq!(describe(&ProcessOutcome::CoolingDown), "cooling down");
    }
}
