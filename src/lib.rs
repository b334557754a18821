//! Comic-Mirror: an idempotent mirror for paginated comic entries
//!
//! This crate fetches one comic entry (a numbered main page, its paginated
//! sub-pages and every embedded image) and mirrors it onto local disk,
//! skipping artifacts that an earlier run already stored.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Comic-Mirror operations
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Invalid entry URL {url}: {reason}")]
    Validation { url: String, reason: String },

    #[error("Fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: crawler::FetchError,
    },

    #[error("HTML parse error for {url}: {message}")]
    HtmlParse { url: String, message: String },

    #[error("Missing required field `{field}` on {url}")]
    MissingField { field: &'static str, url: String },

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlState,
        to: state::CrawlState,
    },

    #[error("IO error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl MirrorError {
    /// Wraps an IO error with the path it happened on
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Returns true if this error is a validation failure of the entry URL
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Comic-Mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, Coordinator, PageFetcher};
pub use output::CrawlReport;
pub use state::{ComicEntry, CrawlState};
pub use self::url::{is_image_reference, is_page_reference};
