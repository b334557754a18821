//! Crawler module for mirroring one comic entry
//!
//! This module contains the core crawling logic, including:
//! - The fetcher contract, its HTTP and canned implementations
//! - Retry with exponential backoff for transient failures
//! - Metadata extraction and page/image discovery from parsed documents
//! - The bounded image download queue
//! - Overall crawl coordination

mod coordinator;
mod downloader;
mod fetcher;
mod metadata;
mod parser;
mod retry;

pub use coordinator::{run_crawl, Coordinator};
pub use downloader::{download_image, DownloadOutcome, DownloadReport, ImageDownloadQueue};
pub use fetcher::{
    build_fetcher, build_http_client, CannedFetcher, FetchError, HttpFetcher, PageFetcher,
    BROWSER_USER_AGENT, CANNED_IMAGE, CANNED_PAGE,
};
pub use metadata::{extract_metadata, transliterate, Metadata, ARTICLE_HEADER};
pub use parser::{
    discover_image_urls, discover_page_urls, parse_document, IMAGE_SELECTOR, PAGING_SELECTOR,
};
pub use retry::RetryPolicy;
