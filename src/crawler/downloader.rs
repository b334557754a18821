//! Image download queue
//!
//! A producer task feeds discovered image URLs into a bounded channel and
//! closes it. The consumer drains the channel and dispatches every URL as
//! its own task, limited by a semaphore of `max-in-flight` permits and an
//! optional minimum interval between dispatches. `run` awaits every task
//! handle before returning.

use crate::config::DownloadConfig;
use crate::crawler::PageFetcher;
use crate::output::FailedUnit;
use crate::state::CrawlState;
use crate::storage::{ContentCache, PathResolver};
use crate::url::ReferenceKind;
use crate::MirrorError;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::MissedTickBehavior;

/// Outcome of one successful image unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Fetched from the network and stored
    Downloaded,
    /// Already present in the cache
    Cached,
}

/// Totals of one queue run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub downloaded: usize,
    pub cached: usize,
    pub failed: Vec<FailedUnit>,

    /// URLs dropped because an earlier URL resolves to the same file
    pub duplicates: usize,
}

impl DownloadReport {
    /// Number of URLs the queue handled
    pub fn total(&self) -> usize {
        self.downloaded + self.cached + self.failed.len()
    }
}

/// Cache-checked image downloads for one entry
pub struct ImageDownloadQueue {
    fetcher: Arc<dyn PageFetcher>,
    cache: Arc<ContentCache>,
    resolver: Arc<PathResolver>,
    config: DownloadConfig,
}

impl ImageDownloadQueue {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        cache: Arc<ContentCache>,
        resolver: Arc<PathResolver>,
        config: DownloadConfig,
    ) -> Self {
        Self {
            fetcher,
            cache,
            resolver,
            config,
        }
    }

    /// Downloads every URL not yet cached
    ///
    /// URLs resolving to a local path already claimed by an earlier URL are
    /// dropped, so no two downloads ever write the same file. A failing URL
    /// is logged and recorded in the report; the queue keeps draining.
    /// Returns after the last dispatched download has finished.
    pub async fn run(&self, urls: Vec<String>) -> DownloadReport {
        let mut report = DownloadReport::default();
        let urls = self.distinct_targets(urls, &mut report);
        if urls.is_empty() {
            return report;
        }

        let max_in_flight = self.config.max_in_flight.max(1);
        tracing::info!(
            "Downloading {} images with up to {} in flight",
            urls.len(),
            max_in_flight
        );

        let (tx, mut rx) = mpsc::channel::<String>(self.config.queue_capacity.max(1));
        let producer = tokio::spawn(async move {
            for url in urls {
                if tx.send(url).await.is_err() {
                    tracing::warn!("Image queue closed before every URL was enqueued");
                    break;
                }
            }
        });

        let semaphore = Arc::new(Semaphore::new(max_in_flight));
        let mut ticker = (self.config.request_interval > 0).then(|| {
            let mut ticker =
                tokio::time::interval(Duration::from_millis(self.config.request_interval));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        let mut handles = Vec::new();

        while let Some(url) = rx.recv().await {
            if let Some(ticker) = ticker.as_mut() {
                ticker.tick().await;
            }

            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::error!("Download semaphore closed, stopping dispatch");
                    break;
                }
            };

            let fetcher = Arc::clone(&self.fetcher);
            let cache = Arc::clone(&self.cache);
            let resolver = Arc::clone(&self.resolver);
            let task_url = url.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                download_image(fetcher.as_ref(), &cache, &resolver, &task_url).await
            });
            handles.push((url, handle));
        }
        drop(rx);

        for (url, handle) in handles {
            let reason = match handle.await {
                Ok(Ok(DownloadOutcome::Downloaded)) => {
                    report.downloaded += 1;
                    continue;
                }
                Ok(Ok(DownloadOutcome::Cached)) => {
                    report.cached += 1;
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(e) => format!("download task failed: {}", e),
            };

            tracing::warn!(
                "Skipping image {} ({}): {}",
                url,
                CrawlState::DownloadingImages,
                reason
            );
            report
                .failed
                .push(FailedUnit::new(url, CrawlState::DownloadingImages, reason));
        }

        if let Err(e) = producer.await {
            tracing::error!("Image producer task failed: {}", e);
        }

        tracing::info!(
            "Images: {} downloaded, {} cached, {} failed, {} sharing a path",
            report.downloaded,
            report.cached,
            report.failed.len(),
            report.duplicates
        );
        report
    }

    /// Keeps the first URL for every local image path
    ///
    /// URLs that cannot be resolved are kept; they fail in their own task.
    fn distinct_targets(&self, urls: Vec<String>, report: &mut DownloadReport) -> Vec<String> {
        let mut claimed = HashSet::new();

        urls.into_iter()
            .filter(|url| {
                let Ok(path) = self.resolver.image_path(url) else {
                    return true;
                };
                if claimed.insert(path) {
                    return true;
                }
                tracing::debug!("Image {} shares its local path with an earlier URL", url);
                report.duplicates += 1;
                false
            })
            .collect()
    }
}

/// Resolves, cache-checks and on a miss fetches and stores one image
pub async fn download_image(
    fetcher: &dyn PageFetcher,
    cache: &ContentCache,
    resolver: &PathResolver,
    url: &str,
) -> Result<DownloadOutcome, MirrorError> {
    let path = resolver.image_path(url)?;

    if let Some(artifact) = cache.lookup(&path).await? {
        tracing::debug!("Image {} cached ({} bytes)", url, artifact.size);
        return Ok(DownloadOutcome::Cached);
    }

    let bytes = fetcher
        .fetch(url, ReferenceKind::Image)
        .await
        .map_err(|source| MirrorError::Fetch {
            url: url.to_string(),
            source,
        })?;

    cache.store(&path, &bytes).await?;
    tracing::debug!("Downloaded image {} to {}", url, path.display());
    Ok(DownloadOutcome::Downloaded)
}
