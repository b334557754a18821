use serde::Deserialize;

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default root directory for mirrored entries
pub const DEFAULT_ROOT_PATH: &str = "./data";

/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRY_TIMES: u32 = 3;

/// Referer the target site expects on every request
pub const DEFAULT_REFERER: &str = "https://www.san499.com/";

/// Main configuration structure for Comic-Mirror
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub target: TargetConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Builds a configuration for `url` with every other setting at its default
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            target: TargetConfig { url: url.into() },
            fetch: FetchConfig::default(),
            download: DownloadConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// The entry to mirror
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Main page URL, e.g. `https://www.example.com/123.html`
    pub url: String,
}

/// Network behaviour of the page fetcher
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Timeout for a single request (seconds)
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Retries after the first attempt for transient failures
    #[serde(rename = "max-retry-times", default = "default_max_retry_times")]
    pub max_retry_times: u32,

    /// Base delay of the exponential backoff (milliseconds)
    #[serde(rename = "retry-base-delay", default = "default_retry_base_delay")]
    pub retry_base_delay: u64,

    /// Serve canned payloads instead of touching the network
    #[serde(default)]
    pub debug: bool,

    /// Referer header sent with every request
    #[serde(default = "default_referer")]
    pub referer: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_SECS,
            max_retry_times: DEFAULT_MAX_RETRY_TIMES,
            retry_base_delay: default_retry_base_delay(),
            debug: false,
            referer: default_referer(),
        }
    }
}

/// Image download stage settings
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    /// Maximum number of image downloads in flight at once
    #[serde(rename = "max-in-flight", default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Capacity of the bounded image queue
    #[serde(rename = "queue-capacity", default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Minimum time between two image dispatches (milliseconds, 0 disables)
    #[serde(rename = "request-interval", default)]
    pub request_interval: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            queue_capacity: default_queue_capacity(),
            request_interval: 0,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory every entry is mirrored under
    #[serde(rename = "root-path", default = "default_root_path")]
    pub root_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_retry_times() -> u32 {
    DEFAULT_MAX_RETRY_TIMES
}

fn default_retry_base_delay() -> u64 {
    500
}

fn default_referer() -> String {
    DEFAULT_REFERER.to_string()
}

fn default_max_in_flight() -> usize {
    1
}

fn default_queue_capacity() -> usize {
    256
}

fn default_root_path() -> String {
    DEFAULT_ROOT_PATH.to_string()
}
