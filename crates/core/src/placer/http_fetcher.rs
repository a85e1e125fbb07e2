//! HTTP fetcher: stream to staging, validate, move into the library.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, RANGE};
use reqwest::Client;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

use super::config::FetcherConfig;
use super::error::FetchError;
use super::layout::{ensure_dir, LibraryLayout};
use super::sanitize::sanitize_filename;
use super::traits::Fetcher;
use super::types::FetchRequest;

const MB: u64 = 1024 * 1024;

/// Content types that indicate an error page instead of media.
const TEXT_LIKE_TYPES: &[&str] = &["text/html", "text/plain", "application/json"];

/// Outcome of one streamed transfer.
#[derive(Debug)]
struct Transfer {
    bytes: u64,
    content_type: String,
}

/// Downloads direct links into the organized media library.
pub struct HttpFetcher {
    client: Client,
    config: FetcherConfig,
    layout: LibraryLayout,
}

impl HttpFetcher {
    /// Create a new fetcher.
    pub fn new(config: FetcherConfig, layout: LibraryLayout) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .expect("Failed to create HTTP client");
        Self::with_client(client, config, layout)
    }

    /// Create a fetcher using an existing HTTP client.
    pub fn with_client(client: Client, config: FetcherConfig, layout: LibraryLayout) -> Self {
        Self {
            client,
            config,
            layout,
        }
    }

    pub fn layout(&self) -> &LibraryLayout {
        &self.layout
    }

    /// Stream the body of `url` into `temp`.
    async fn stream_to(&self, url: &str, temp: &Path, ranged: bool) -> Result<Transfer, FetchError> {
        let mut request = self.client.get(url);
        if ranged {
            request = request.header(RANGE, "bytes=0-");
        }

        let mut response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let total = response.content_length();

        let file = File::create(temp).await?;
        let mut writer = BufWriter::with_capacity(self.config.buffer_size, file);
        let mut written = 0u64;
        let mut last_reported = 0u64;

        while let Some(chunk) = response.chunk().await? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;

            if written - last_reported >= self.config.progress_interval_bytes {
                last_reported = written;
                info!(
                    url = %url,
                    downloaded_mb = written / MB,
                    total_mb = total.map(|t| t / MB),
                    "Download progress"
                );
            }
        }
        writer.flush().await?;

        Ok(Transfer {
            bytes: written,
            content_type,
        })
    }

    fn is_suspicious(&self, transfer: &Transfer) -> bool {
        let content_type = transfer.content_type.to_lowercase();
        transfer.bytes < self.config.suspicious_size_bytes
            && TEXT_LIKE_TYPES.iter().any(|t| content_type.starts_with(t))
    }

    /// Download into `temp`, retrying a suspicious transfer once, then check its size.
    async fn download(&self, request: &FetchRequest, temp: &Path) -> Result<u64, FetchError> {
        let mut transfer = self.stream_to(&request.url, temp, false).await?;

        if self.is_suspicious(&transfer) {
            if !self.config.range_retry {
                return Err(FetchError::SuspiciousTransfer {
                    bytes: transfer.bytes,
                    content_type: transfer.content_type,
                });
            }
            warn!(
                url = %request.url,
                bytes = transfer.bytes,
                content_type = %transfer.content_type,
                "Suspicious transfer, retrying with byte-range request"
            );
            transfer = self.stream_to(&request.url, temp, true).await?;
            if self.is_suspicious(&transfer) {
                return Err(FetchError::SuspiciousTransfer {
                    bytes: transfer.bytes,
                    content_type: transfer.content_type,
                });
            }
        }

        if let Some(expected) = request.expected_size {
            validate_size(&self.config, expected, transfer.bytes)?;
        }

        Ok(transfer.bytes)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, request: FetchRequest) -> Result<PathBuf, FetchError> {
        let staging = self.layout.staging_dir();
        ensure_dir(&staging).await?;

        let temp = staging.join(sanitize_filename(&request.file_name));
        info!(file = %request.file_name, url = %request.url, "Starting download");

        let bytes = match self.download(&request, &temp).await {
            Ok(bytes) => bytes,
            Err(e) => {
                discard(&temp).await;
                return Err(e);
            }
        };

        let destination = match self
            .layout
            .organize_path(&request.file_name, &request.item)
            .await
        {
            Ok(path) => path,
            Err(e) => {
                discard(&temp).await;
                return Err(e);
            }
        };

        if let Err(e) = move_into_place(&temp, &destination).await {
            discard(&temp).await;
            return Err(e);
        }

        info!(
            destination = %destination.display(),
            size_mb = bytes / MB,
            "Download complete"
        );
        Ok(destination)
    }
}

/// Check `actual` against `expected` within `max(pct, floor)`.
pub fn validate_size(config: &FetcherConfig, expected: u64, actual: u64) -> Result<(), FetchError> {
    let tolerance = config.size_tolerance(expected);
    if expected.abs_diff(actual) > tolerance {
        return Err(FetchError::SizeMismatch {
            expected,
            actual,
            tolerance,
        });
    }
    Ok(())
}

async fn discard(temp: &Path) {
    match fs::remove_file(temp).await {
        Ok(()) => debug!(path = %temp.display(), "Removed partial download"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %temp.display(), error = %e, "Failed to remove partial download"),
    }
}

/// Attempts to move a file atomically (rename).
async fn try_atomic_move(source: &Path, destination: &Path) -> Result<bool, std::io::Error> {
    match fs::rename(source, destination).await {
        Ok(()) => Ok(true),
        Err(e) => {
            // EXDEV (18 on Linux) when crossing filesystems
            if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                Ok(false)
            } else {
                Err(e)
            }
        }
    }
}

/// Move a finished download into the library. Returns whether an existing
/// file at the destination was replaced.
async fn move_into_place(source: &Path, destination: &Path) -> Result<bool, FetchError> {
    let replaced = fs::try_exists(destination).await.unwrap_or(false);
    if replaced {
        warn!(destination = %destination.display(), "Replacing existing file in library");
    }

    let moved = try_atomic_move(source, destination)
        .await
        .map_err(|e| FetchError::move_failed(source.to_path_buf(), destination.to_path_buf(), e))?;

    if !moved {
        fs::copy(source, destination).await.map_err(|e| {
            FetchError::move_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;
        fs::remove_file(source).await?;
    }
    Ok(replaced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LibraryConfig;
    use crate::placer::ItemMetadata;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Serve every connection with the same response; returns the base URL.
    async fn serve(body: Vec<u8>, content_type: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let body = body.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let mut request = Vec::new();
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    let head = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        content_type,
                        body.len()
                    );
                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.write_all(&body).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{}/file", addr)
    }

    fn fetcher(root: &Path, config: FetcherConfig) -> HttpFetcher {
        let client = Client::builder().no_proxy().build().unwrap();
        HttpFetcher::with_client(
            client,
            config.with_buffer_size(64 * 1024),
            LibraryLayout::new(LibraryConfig::with_root(root)),
        )
    }

    fn staging_is_empty(root: &Path) -> bool {
        let staging = root.join(".downloading");
        !staging.exists() || std::fs::read_dir(staging).unwrap().next().is_none()
    }

    #[test]
    fn test_size_validation_rejects_half_download() {
        let config = FetcherConfig::default();
        let err = validate_size(&config, 1_000_000_000, 500_000_000).unwrap_err();
        assert!(matches!(
            err,
            FetchError::SizeMismatch {
                expected: 1_000_000_000,
                actual: 500_000_000,
                tolerance: 50_000_000
            }
        ));
    }

    #[test]
    fn test_size_validation_accepts_within_tolerance() {
        let config = FetcherConfig::default();
        assert!(validate_size(&config, 1_000_000_000, 960_000_000).is_ok());
        // Floor of 10 MB applies to small files.
        assert!(validate_size(&config, 2_000_000, 9_000_000).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_places_file_in_library() {
        let temp = TempDir::new().unwrap();
        let body = vec![7u8; 4096];
        let url = serve(body.clone(), "video/x-matroska").await;
        let fetcher = fetcher(temp.path(), FetcherConfig::default());

        let request = FetchRequest::new(
            url,
            "Heat.1995.1080p.mkv",
            ItemMetadata::movie("Heat", Some(1995)),
        )
        .with_expected_size(Some(4096));

        let path = fetcher.fetch(request).await.unwrap();

        assert_eq!(
            path,
            temp.path().join("Movies/Heat (1995)/Heat.1995.1080p.mkv")
        );
        assert_eq!(std::fs::read(&path).unwrap(), body);
        assert!(staging_is_empty(temp.path()));
    }

    #[tokio::test]
    async fn test_move_into_place_reports_replaced_file() {
        let temp = TempDir::new().unwrap();
        let destination = temp.path().join("Heat.1995.1080p.mkv");
        let first = temp.path().join("first.part");
        let second = temp.path().join("second.part");
        std::fs::write(&first, b"first").unwrap();
        std::fs::write(&second, b"second").unwrap();

        assert!(!move_into_place(&first, &destination).await.unwrap());
        assert!(move_into_place(&second, &destination).await.unwrap());

        assert_eq!(std::fs::read(&destination).unwrap(), b"second");
        assert!(!second.exists());
    }

    #[tokio::test]
    async fn test_size_mismatch_discards_partial_file() {
        let temp = TempDir::new().unwrap();
        let url = serve(vec![1u8; 1000], "application/octet-stream").await;
        let fetcher = fetcher(temp.path(), FetcherConfig::default());

        let request = FetchRequest::new(url, "Movie.2020.mkv", ItemMetadata::movie("Movie", None))
            .with_expected_size(Some(50 * MB));

        let err = fetcher.fetch(request).await.unwrap_err();

        assert!(matches!(err, FetchError::SizeMismatch { actual: 1000, .. }));
        assert!(staging_is_empty(temp.path()));
        assert!(!temp.path().join("Movies").exists());
    }

    #[tokio::test]
    async fn test_suspicious_html_transfer_fails_after_range_retry() {
        let temp = TempDir::new().unwrap();
        let url = serve(b"<html>limit reached</html>".to_vec(), "text/html").await;
        let fetcher = fetcher(temp.path(), FetcherConfig::default());

        let request = FetchRequest::new(url, "Movie.mkv", ItemMetadata::default());
        let err = fetcher.fetch(request).await.unwrap_err();

        assert!(matches!(err, FetchError::SuspiciousTransfer { .. }));
        assert!(staging_is_empty(temp.path()));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let temp = TempDir::new().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = vec![0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                    .await;
            }
        });

        let fetcher = fetcher(temp.path(), FetcherConfig::default());
        let request = FetchRequest::new(
            format!("http://{}/missing", addr),
            "Movie.mkv",
            ItemMetadata::default(),
        );
        let err = fetcher.fetch(request).await.unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus { status: 404, .. }));
    }
}
