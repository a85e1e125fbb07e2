//! Cache availability checks with per-hash fallback.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::debrid::{CachedVariant, DebridClient, InstantAvailability};
use crate::item::RequestItem;
use crate::matcher::PatternSet;
use crate::release::{FileVersion, ReleaseCandidate, RemoteFile};
use crate::selection::{best_version, rank_versions};

use super::config::ResolverConfig;
use super::types::{AvailabilityReport, ResolverError};

/// Annotates an item's releases with the provider's cached file versions.
pub struct AvailabilityResolver {
    client: Arc<dyn DebridClient>,
    config: ResolverConfig,
}

impl AvailabilityResolver {
    pub fn new(client: Arc<dyn DebridClient>, config: ResolverConfig) -> Self {
        Self { client, config }
    }

    /// Check every torrent release of `item` for instant availability.
    ///
    /// Releases with an invalid hash are dropped before any request. A failed
    /// batch request degrades to one request per hash; a failing hash only
    /// leaves its own releases uncached. Releases end sorted by size, largest
    /// first.
    pub async fn check(
        &self,
        item: &mut RequestItem,
        force: bool,
    ) -> Result<AvailabilityReport, ResolverError> {
        let patterns = if force {
            PatternSet::match_all(&self.config.unwanted_patterns)?
        } else {
            PatternSet::compile(&item.files(), &self.config.unwanted_patterns)?
        };

        let query = item.query();
        let mut report = AvailabilityReport::default();

        let total = item.releases.len();
        item.releases.retain(|release| {
            if release.is_http() {
                return true;
            }
            let valid = release.has_valid_hash();
            if !valid {
                warn!(release = %release.title, hash = %release.hash, item = %query, "Ignoring release with missing or invalid torrent hash");
            }
            valid
        });
        report.dropped = total - item.releases.len();

        let mut hashes: Vec<String> = Vec::new();
        for release in item.releases.iter_mut() {
            if release.is_http() {
                debug!(release = %release.title, "Skipping hash check for direct link release");
                report.skipped_http += 1;
                continue;
            }
            release.file_versions.clear();
            release.cached_on.remove(self.client.short());
            let hash = release.hash.to_lowercase();
            if !hashes.contains(&hash) {
                hashes.push(hash);
            }
        }
        report.hashes = hashes.len();

        if !hashes.is_empty() {
            let availability = self.fetch_availability(item, &hashes, &mut report).await;
            for release in item.releases.iter_mut().filter(|r| !r.is_http()) {
                if self.annotate(release, &availability, &patterns) {
                    report.cached += 1;
                }
            }
        }

        item.releases.sort_by(|a, b| {
            b.size_gb
                .partial_cmp(&a.size_gb)
                .unwrap_or(Ordering::Equal)
        });

        info!(
            item = %query,
            hashes = report.hashes,
            cached = report.cached,
            fallback = report.fallback_used,
            "Availability check complete"
        );
        Ok(report)
    }

    /// Batch request, or per-hash requests when the batch fails.
    async fn fetch_availability(
        &self,
        item: &RequestItem,
        hashes: &[String],
        report: &mut AvailabilityReport,
    ) -> InstantAvailability {
        let error = match self.client.instant_availability(hashes).await {
            Ok(availability) => return availability,
            Err(e) => e,
        };

        warn!(
            item = %item.query(),
            error = %error,
            hashes = hashes.len(),
            "Batch availability check failed, checking hashes individually"
        );
        report.fallback_used = true;

        let mut combined = InstantAvailability::new();
        let delay = self.config.individual_check_delay();
        for hash in hashes {
            report.individual_checks += 1;
            match self
                .client
                .instant_availability(std::slice::from_ref(hash))
                .await
            {
                Ok(single) => {
                    combined.insert(hash, single.variants(hash).to_vec());
                }
                Err(e) => {
                    report.failed += 1;
                    let titles: Vec<&str> = item
                        .releases
                        .iter()
                        .filter(|r| r.hash.eq_ignore_ascii_case(hash))
                        .map(|r| r.title.as_str())
                        .collect();
                    warn!(hash = %hash, releases = ?titles, error = %e, "Individual availability check failed");
                }
            }
            tokio::time::sleep(delay).await;
        }
        combined
    }

    /// Attach ranked versions to a release. Returns whether it is cached.
    fn annotate(
        &self,
        release: &mut ReleaseCandidate,
        availability: &InstantAvailability,
        patterns: &PatternSet,
    ) -> bool {
        let mut versions: Vec<FileVersion> = availability
            .variants(&release.hash)
            .iter()
            .map(|variant| classify_variant(variant, patterns))
            .filter(|v| !v.files().is_empty())
            .collect();

        rank_versions(&mut versions);
        let Some(best) = best_version(&versions) else {
            return false;
        };
        release.wanted = best.wanted_count();
        release.unwanted = best.unwanted_count();
        release.size_gb = best.total_size_gb();
        release.file_versions = versions;
        release.cached_on.insert(self.client.short().to_string());
        debug!(
            release = %release.title,
            wanted = release.wanted,
            unwanted = release.unwanted,
            size_gb = release.size_gb,
            "Release is cached"
        );
        true
    }
}

fn classify_variant(variant: &CachedVariant, patterns: &PatternSet) -> FileVersion {
    FileVersion::aggregate(
        variant
            .iter()
            .map(|f| RemoteFile::classify(f.id.clone(), f.filename.clone(), f.filesize, patterns))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debrid::CachedFile;
    use crate::testing::MockDebridClient;

    fn resolver(client: Arc<MockDebridClient>) -> AvailabilityResolver {
        AvailabilityResolver::new(
            client,
            ResolverConfig::default().with_individual_check_delay_ms(0),
        )
    }

    fn hash(c: char) -> String {
        std::iter::repeat(c).take(40).collect()
    }

    #[tokio::test]
    async fn test_invalid_hash_never_reaches_network() {
        let client = Arc::new(MockDebridClient::new());
        let mut item = RequestItem::season("The Show", 1).with_releases(vec![
            ReleaseCandidate::torrent("scraper", "The.Show.S01", "abc", 10.0),
            ReleaseCandidate::torrent("scraper", "The.Show.S01.x265", "", 5.0),
        ]);

        let report = resolver(client.clone()).check(&mut item, false).await.unwrap();

        assert!(item.releases.is_empty());
        assert_eq!(report.hashes, 0);
        assert!(client.availability_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_batch_success_marks_cached_and_ranks_versions() {
        let client = Arc::new(MockDebridClient::new());
        client
            .set_variants(
                &hash('a'),
                vec![
                    vec![CachedFile {
                        id: "1".into(),
                        filename: "The.Show.S01E01.mkv".into(),
                        filesize: 1_000_000_000,
                    }],
                    vec![
                        CachedFile {
                            id: "1".into(),
                            filename: "The.Show.S01E01.mkv".into(),
                            filesize: 1_000_000_000,
                        },
                        CachedFile {
                            id: "2".into(),
                            filename: "The.Show.S01E02.mkv".into(),
                            filesize: 1_000_000_000,
                        },
                    ],
                ],
            )
            .await;
        let mut item = RequestItem::season("The Show", 1).with_releases(vec![
            ReleaseCandidate::torrent("scraper", "The.Show.S01.A", hash('a'), 1.0),
            ReleaseCandidate::torrent("scraper", "The.Show.S01.B", hash('b'), 50.0),
        ]);

        let report = resolver(client.clone()).check(&mut item, false).await.unwrap();

        assert!(!report.fallback_used);
        assert_eq!(report.cached, 1);
        assert_eq!(client.availability_calls().await.len(), 1);

        let a = item.releases.iter().find(|r| r.hash == hash('a')).unwrap();
        assert!(a.cached_on.contains("RD"));
        assert_eq!(a.file_versions[0].files().len(), 2);
        assert_eq!(a.wanted, 2);
        assert!((a.size_gb - 2.0).abs() < 1e-9);

        let b = item.releases.iter().find(|r| r.hash == hash('b')).unwrap();
        assert!(b.cached_on.is_empty());
        assert!(b.file_versions.is_empty());

        // Sorted by size descending.
        assert_eq!(item.releases[0].hash, hash('b'));
    }

    #[tokio::test]
    async fn test_http_releases_skip_hash_check() {
        let client = Arc::new(MockDebridClient::new());
        let mut item = RequestItem::movie("Heat", Some(1995)).with_releases(vec![
            ReleaseCandidate::http("streams", "Heat.1995.1080p", "https://cdn.test/heat.mkv"),
        ]);

        let report = resolver(client.clone()).check(&mut item, false).await.unwrap();

        assert_eq!(item.releases.len(), 1);
        assert_eq!(report.skipped_http, 1);
        assert!(client.availability_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_all_individual_checks_failing_leaves_nothing_cached() {
        let client = Arc::new(MockDebridClient::new());
        client.set_batch_failure(true).await;
        for c in ['a', 'b'] {
            client.set_cached(&hash(c), &[("The.Show.S01E01.mkv", 1_000_000)]).await;
            client.fail_hash(&hash(c)).await;
        }
        let mut item = RequestItem::season("The Show", 1).with_releases(vec![
            ReleaseCandidate::torrent("scraper", "The.Show.S01.A", hash('a'), 1.0),
            ReleaseCandidate::torrent("scraper", "The.Show.S01.B", hash('b'), 1.0),
        ]);

        let report = resolver(client.clone()).check(&mut item, false).await.unwrap();

        assert!(report.fallback_used);
        assert_eq!(report.individual_checks, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(report.cached, 0);
        assert!(item.releases.iter().all(|r| r.cached_on.is_empty()));
        assert!(item.releases.iter().all(|r| r.file_versions.is_empty()));
    }

    #[tokio::test]
    async fn test_force_accepts_every_file() {
        let client = Arc::new(MockDebridClient::new());
        client
            .set_cached(&hash('a'), &[("random.name.mkv", 2_000_000_000)])
            .await;
        let mut item = RequestItem::episode("The Show", 1, 1).with_releases(vec![
            ReleaseCandidate::torrent("scraper", "Whatever", hash('a'), 1.0),
        ]);

        resolver(client).check(&mut item, true).await.unwrap();

        assert_eq!(item.releases[0].wanted, 1);
    }
}
