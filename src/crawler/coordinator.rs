//! Crawler coordinator - main crawl orchestration logic
//!
//! This module sequences one crawl of a comic entry:
//! - Validating the main URL before any network access
//! - Reading the main page (from an earlier mirror when there is one) and
//!   extracting its metadata
//! - Discovering and fetching the sub-pages (cache first)
//! - Discovering images and writing the manifests
//! - Draining the image download queue
//!
//! Failures before `FetchingPages` abort the crawl; from there on a failing
//! page or image is logged, recorded in the report and skipped.

use crate::config::Config;
use crate::crawler::{
    build_fetcher, discover_image_urls, discover_page_urls, extract_metadata, parse_document,
    ImageDownloadQueue, Metadata, PageFetcher,
};
use crate::output::{CrawlReport, FailedUnit};
use crate::state::{ComicEntry, CrawlState};
use crate::storage::{
    find_mirrored_slug, format_metadata, format_page_line, page_basename, page_stem, write_lines,
    write_text, CacheStats, ContentCache, PathResolver, MAIN_MANIFEST,
};
use crate::url::ReferenceKind;
use crate::MirrorError;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    cache: Arc<ContentCache>,
    state: CrawlState,
}

/// A page body held between fetching and image discovery
struct FetchedPage {
    url: String,
    body: Vec<u8>,
}

impl Coordinator {
    /// Creates a coordinator with the fetcher the configuration asks for
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(MirrorError)` - The HTTP client could not be built
    pub fn new(config: Config) -> Result<Self, MirrorError> {
        let fetcher = build_fetcher(&config.fetch)?;
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Creates a coordinator around an existing fetcher
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
            cache: Arc::new(ContentCache::new()),
            state: CrawlState::Validating,
        }
    }

    /// Current stage of the crawl
    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Cache counters accumulated so far
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Runs the crawl to completion
    ///
    /// Returns the run report once every stage has run, even if some pages
    /// or images were skipped. Errors are returned only for failures of the
    /// entry stages, in which case the coordinator ends in `Failed`.
    pub async fn run(&mut self) -> Result<CrawlReport, MirrorError> {
        if self.state != CrawlState::Validating {
            return Err(MirrorError::InvalidTransition {
                from: self.state,
                to: CrawlState::Validating,
            });
        }

        let entry = match ComicEntry::new(&self.config.target.url) {
            Ok(entry) => entry,
            Err(e) => return Err(self.fail(e)),
        };

        let span = tracing::info_span!("crawl", entry = entry.number);
        match self.run_stages(entry).instrument(span).await {
            Ok(report) => Ok(report),
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn run_stages(&mut self, mut entry: ComicEntry) -> Result<CrawlReport, MirrorError> {
        let start_time = Instant::now();
        let mut report = CrawlReport {
            entry_number: entry.number,
            ..CrawlReport::default()
        };
        tracing::info!("Starting crawl of {}", entry.main_url);

        // Main page
        self.advance(CrawlState::FetchingMain)?;
        let (main_body, main_cached) = match self.load_mirrored_main(&entry.main_url).await {
            Some(body) => {
                report.pages_cached += 1;
                (body, true)
            }
            None => {
                let body = self
                    .fetcher
                    .fetch(&entry.main_url, ReferenceKind::Page)
                    .await
                    .map_err(|source| MirrorError::Fetch {
                        url: entry.main_url.clone(),
                        source,
                    })?;
                report.pages_fetched += 1;
                (body, false)
            }
        };

        // Metadata
        self.advance(CrawlState::ExtractingMetadata)?;
        let (metadata, page_urls) = read_main_page(&entry.main_url, &main_body)?;
        entry.apply_metadata(metadata);
        let resolver = PathResolver::new(&self.config.output.root_path, &entry.slug_title)?;
        write_text(&resolver.metadata_path(), &format_metadata(&entry)).await?;
        tracing::info!(
            "Mirroring \"{}\" into {}",
            entry.title,
            resolver.entry_root().display()
        );
        report.title = entry.title.clone();
        report.entry_root = resolver.entry_root().to_path_buf();

        // Page list
        self.advance(CrawlState::DiscoveringPages)?;
        entry.set_page_urls(page_urls);
        let mut main_manifest = Vec::with_capacity(entry.page_urls().len());
        for url in entry.page_urls() {
            let path = resolver.page_path(url)?;
            main_manifest.push(format_page_line(&path, &page_basename(url)?));
        }
        write_lines(&resolver.manifest_path(MAIN_MANIFEST), &main_manifest).await?;
        report.pages_total = entry.page_urls().len();
        tracing::info!("Found {} pages", report.pages_total);

        // Pages
        self.advance(CrawlState::FetchingPages)?;
        let mut pages = Vec::with_capacity(entry.page_urls().len());
        pages.push(FetchedPage {
            url: entry.main_url.clone(),
            body: main_body,
        });
        if !main_cached {
            if let Err(e) = self.store_page(&resolver, &pages[0]).await {
                tracing::warn!("Could not cache main page {}: {}", entry.main_url, e);
                report
                    .failures
                    .push(FailedUnit::new(&entry.main_url, self.state, e));
            }
        }

        for url in entry.page_urls().iter().skip(1) {
            match self.load_page(&resolver, url).await {
                Ok((page, cached)) => {
                    if cached {
                        report.pages_cached += 1;
                    } else {
                        report.pages_fetched += 1;
                    }
                    pages.push(page);
                }
                Err(e) => {
                    tracing::warn!("Skipping page {} ({}): {}", url, self.state, e);
                    report.failures.push(FailedUnit::new(url, self.state, e));
                }
            }
        }

        // Images
        self.advance(CrawlState::DiscoveringImages)?;
        for page in &pages {
            match self.record_page_images(&resolver, page).await {
                Ok(images) => {
                    let added = entry.add_image_urls(images);
                    tracing::debug!("{} new images on {}", added, page.url);
                }
                Err(e) => {
                    tracing::warn!("Skipping images of {} ({}): {}", page.url, self.state, e);
                    report.failures.push(FailedUnit::new(&page.url, self.state, e));
                }
            }
        }
        report.images_total = entry.image_urls().len();
        drop(pages);

        // Downloads
        self.advance(CrawlState::DownloadingImages)?;
        let queue = ImageDownloadQueue::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.cache),
            Arc::new(resolver),
            self.config.download.clone(),
        );
        let downloads = queue.run(entry.image_urls().iter().cloned().collect()).await;
        report.images_downloaded = downloads.downloaded;
        report.images_cached = downloads.cached;
        report.failures.extend(downloads.failed);

        self.advance(CrawlState::Done)?;
        report.cache = self.cache_stats();
        report.elapsed = start_time.elapsed();

        tracing::info!(
            "Crawl complete in {:.2}s: {} pages, {} images, {} failures",
            report.elapsed.as_secs_f64(),
            report.pages_total,
            report.images_total,
            report.failures.len()
        );
        Ok(report)
    }

    /// Moves to `next`, rejecting anything off the legal path
    fn advance(&mut self, next: CrawlState) -> Result<(), MirrorError> {
        if !self.state.can_transition_to(next) {
            return Err(MirrorError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!("Crawl state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Logs a fatal error and moves to `Failed` when the current stage allows it
    fn fail(&mut self, error: MirrorError) -> MirrorError {
        tracing::error!("Crawl failed while {}: {}", self.state, error);
        if self.state.can_transition_to(CrawlState::Failed) {
            self.state = CrawlState::Failed;
        }
        error
    }

    /// Reads the main page from an earlier mirror of the same entry
    ///
    /// The entry directory is named after the title, which is only known
    /// once the main page is read, so it is looked up by the URL recorded in
    /// its metadata file. Any miss falls back to the network.
    async fn load_mirrored_main(&self, main_url: &str) -> Option<Vec<u8>> {
        let root = Path::new(&self.config.output.root_path);
        let slug = find_mirrored_slug(root, main_url).await?;
        let path = PathResolver::new(root, &slug)
            .and_then(|resolver| resolver.page_path(main_url))
            .ok()?;

        match self.cache.load(&path).await {
            Ok(Some(body)) => {
                tracing::info!("Main page {} served from {}", main_url, path.display());
                Some(body)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Ignoring cached main page {}: {}", path.display(), e);
                None
            }
        }
    }

    async fn store_page(
        &self,
        resolver: &PathResolver,
        page: &FetchedPage,
    ) -> Result<(), MirrorError> {
        let path = resolver.page_path(&page.url)?;
        self.cache.store(&path, &page.body).await
    }

    /// Reads a sub-page from the cache, fetching and storing it on a miss
    ///
    /// The flag is true when the body came from the cache.
    async fn load_page(
        &self,
        resolver: &PathResolver,
        url: &str,
    ) -> Result<(FetchedPage, bool), MirrorError> {
        let path = resolver.page_path(url)?;

        if let Some(body) = self.cache.load(&path).await? {
            tracing::debug!("Page {} served from cache", url);
            return Ok((
                FetchedPage {
                    url: url.to_string(),
                    body,
                },
                true,
            ));
        }

        let body = self
            .fetcher
            .fetch(url, ReferenceKind::Page)
            .await
            .map_err(|source| MirrorError::Fetch {
                url: url.to_string(),
                source,
            })?;
        let page = FetchedPage {
            url: url.to_string(),
            body,
        };
        self.store_page(resolver, &page).await?;
        tracing::debug!("Page {} fetched", url);
        Ok((page, false))
    }

    /// Discovers the images of one page and writes its manifest
    async fn record_page_images(
        &self,
        resolver: &PathResolver,
        page: &FetchedPage,
    ) -> Result<Vec<String>, MirrorError> {
        let images = read_page_images(&page.url, &page.body)?;

        let mut lines = Vec::with_capacity(images.len());
        let mut kept = Vec::with_capacity(images.len());
        for url in images {
            match resolver.image_path(&url) {
                Ok(path) => {
                    lines.push(path.display().to_string());
                    kept.push(url);
                }
                Err(e) => tracing::warn!("Skipping image {} on {}: {}", url, page.url, e),
            }
        }

        let manifest = resolver.manifest_path(&page_stem(&page.url)?);
        write_lines(&manifest, &lines).await?;
        Ok(kept)
    }
}

/// Parses the main page into its metadata and page list
///
/// The parsed document never outlives this call.
fn read_main_page(url: &str, body: &[u8]) -> Result<(Metadata, Vec<String>), MirrorError> {
    let document = parse_document(url, body)?;
    let metadata = extract_metadata(url, &document)?;
    let pages = discover_page_urls(url, &document);
    Ok((metadata, pages))
}

fn read_page_images(url: &str, body: &[u8]) -> Result<Vec<String>, MirrorError> {
    let document = parse_document(url, body)?;
    Ok(discover_image_urls(url, &document))
}

/// Runs one crawl with the fetcher selected by the configuration
pub async fn run_crawl(config: Config) -> Result<CrawlReport, MirrorError> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
