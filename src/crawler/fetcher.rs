//! HTTP fetcher implementation
//!
//! This module handles every network request of a crawl, including:
//! - The `PageFetcher` contract the rest of the crawler depends on
//! - Building the HTTP client with the browser-like header set the target
//!   site expects
//! - Retry with exponential backoff for transient failures
//! - The canned offline fetcher used in debug mode

use crate::config::FetchConfig;
use crate::crawler::retry::RetryPolicy;
use crate::url::ReferenceKind;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// User agent of the browser the header set imitates
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/112.0";

const ACCEPT_LANGUAGE_VALUE: &str =
    "zh-CN,zh;q=0.8,zh-TW;q=0.7,zh-HK;q=0.5,en-US;q=0.3,en;q=0.2";

const IMAGE_ACCEPT_VALUE: &str = "image/avif,image/webp,*/*";

/// Upper bound for the connection phase of a request
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Page served by the canned fetcher
pub const CANNED_PAGE: &str = include_str!("canned_page.html");

/// Image served by the canned fetcher (a 1x1 transparent PNG)
pub const CANNED_IMAGE: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

/// Transport-level failure of a single fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP status {status}")]
    Status { status: u16 },

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("empty response body")]
    EmptyBody,

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Returns true if the same request may succeed when tried again
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status } => *status == 429 || (500..600).contains(status),
            Self::Timeout | Self::Connect(_) => true,
            Self::Network(_) | Self::EmptyBody | Self::InvalidUrl(_) => false,
        }
    }

    /// Classifies a reqwest error
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_builder() {
            Self::InvalidUrl(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Retrieves the raw bytes behind a URL
///
/// The crawler only depends on this contract; transport details (headers,
/// TLS, timeouts, retries) belong to the implementation.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url`, which the caller expects to be of the given kind
    async fn fetch(&self, url: &str, kind: ReferenceKind) -> Result<Vec<u8>, FetchError>;
}

/// Builds an HTTP client with the configured per-request timeout
///
/// # Example
///
/// ```no_run
/// use comic_mirror::config::FetchConfig;
/// use comic_mirror::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.timeout);

    Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .timeout(timeout)
        .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher that performs real GET requests
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    referer: String,
    retry: RetryPolicy,
}

impl HttpFetcher {
    /// Creates a fetcher from the fetch configuration
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            referer: config.referer.clone(),
            retry: RetryPolicy::from_config(config),
        })
    }

    /// Replaces the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Header set sent with every request of the given kind
    fn headers(&self, kind: ReferenceKind) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE),
        );
        if let Ok(referer) = HeaderValue::from_str(&self.referer) {
            if !self.referer.is_empty() {
                headers.insert(REFERER, referer);
            }
        }
        headers.insert("sec-fetch-mode", HeaderValue::from_static("no-cors"));
        headers.insert("sec-fetch-site", HeaderValue::from_static("cross-site"));

        if kind == ReferenceKind::Image {
            headers.insert(ACCEPT, HeaderValue::from_static(IMAGE_ACCEPT_VALUE));
            headers.insert("sec-fetch-dest", HeaderValue::from_static("image"));
        }

        headers
    }

    /// Performs a single GET without retrying
    async fn fetch_once(&self, url: &str, kind: ReferenceKind) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .headers(self.headers(kind))
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(FetchError::from_reqwest)?;
        if body.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        tracing::debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(body.to_vec())
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, kind: ReferenceKind) -> Result<Vec<u8>, FetchError> {
        self.retry.run(url, || self.fetch_once(url, kind)).await
    }
}

/// Offline fetcher that serves fixed payloads without network access
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedFetcher;

#[async_trait]
impl PageFetcher for CannedFetcher {
    async fn fetch(&self, url: &str, kind: ReferenceKind) -> Result<Vec<u8>, FetchError> {
        tracing::debug!("Serving canned {:?} payload for {}", kind, url);
        Ok(match kind {
            ReferenceKind::Page => CANNED_PAGE.as_bytes().to_vec(),
            ReferenceKind::Image => CANNED_IMAGE.to_vec(),
        })
    }
}

/// Picks the fetcher the configuration asks for
pub fn build_fetcher(config: &FetchConfig) -> Result<Arc<dyn PageFetcher>, reqwest::Error> {
    if config.debug {
        tracing::info!("Debug mode: serving canned payloads, no network access");
        Ok(Arc::new(CannedFetcher))
    } else {
        Ok(Arc::new(HttpFetcher::new(config)?))
    }
}
