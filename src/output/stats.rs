//! Run statistics for one crawl
//!
//! This module provides the report a crawl returns and its console
//! rendering.

use crate::state::CrawlState;
use crate::storage::CacheStats;
use std::path::PathBuf;
use std::time::Duration;

/// A page or image that was skipped, with the stage it failed in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUnit {
    pub url: String,
    pub stage: CrawlState,
    pub reason: String,
}

impl FailedUnit {
    pub fn new(url: impl Into<String>, stage: CrawlState, reason: impl ToString) -> Self {
        Self {
            url: url.into(),
            stage,
            reason: reason.to_string(),
        }
    }
}

/// Crawl statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Number of the mirrored entry
    pub entry_number: u64,

    /// Title as published
    pub title: String,

    /// Directory every artifact was written under
    pub entry_root: PathBuf,

    /// Pages of the entry, main page included
    pub pages_total: usize,

    /// Pages fetched from the network during this run
    pub pages_fetched: usize,

    /// Pages served from the local cache
    pub pages_cached: usize,

    /// Distinct images discovered across all pages
    pub images_total: usize,

    /// Images fetched from the network during this run
    pub images_downloaded: usize,

    /// Images already present in the local cache
    pub images_cached: usize,

    /// Every unit that was skipped, in the order it failed
    pub failures: Vec<FailedUnit>,

    /// Cache counters at the end of the run
    pub cache: CacheStats,

    /// Wall time of the run
    pub elapsed: Duration,
}

impl CrawlReport {
    /// Returns true if no page or image was skipped
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failures recorded while fetching or reading pages
    pub fn failed_pages(&self) -> impl Iterator<Item = &FailedUnit> {
        self.failures
            .iter()
            .filter(|f| f.stage != CrawlState::DownloadingImages)
    }

    /// Failures recorded while downloading images
    pub fn failed_images(&self) -> impl Iterator<Item = &FailedUnit> {
        self.failures
            .iter()
            .filter(|f| f.stage == CrawlState::DownloadingImages)
    }
}

/// Prints the report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Entry:");
    println!("  Number: {}", report.entry_number);
    println!("  Title: {}", report.title);
    println!("  Directory: {}", report.entry_root.display());
    println!("  Elapsed: {:.2}s", report.elapsed.as_secs_f64());
    println!();

    println!("Pages:");
    println!("  Total: {}", report.pages_total);
    println!("  Fetched: {}", report.pages_fetched);
    println!("  Cached: {}", report.pages_cached);
    println!("  Failed: {}", report.failed_pages().count());
    println!();

    println!("Images:");
    println!("  Total: {}", report.images_total);
    println!("  Downloaded: {}", report.images_downloaded);
    println!("  Cached: {}", report.images_cached);
    println!("  Failed: {}", report.failed_images().count());
    println!();

    println!("Cache:");
    println!("  Hits: {}", report.cache.hits);
    println!("  Misses: {}", report.cache.misses);
    if report.cache.repaired > 0 {
        println!("  Repaired zero-byte files: {}", report.cache.repaired);
    }
    println!();

    if !report.failures.is_empty() {
        println!("Failures ({}):", report.failures.len());
        for failure in &report.failures {
            println!("  - [{}] {}: {}", failure.stage, failure.url, failure.reason);
        }
        println!();
    }

    let units = report.pages_total + report.images_total;
    let success_rate = if units > 0 {
        ((units - report.failures.len().min(units)) as f64 / units as f64) * 100.0
    } else {
        100.0
    };
    println!("Success Rate: {:.1}%", success_rate);
}
