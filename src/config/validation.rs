use crate::config::types::{Config, DownloadConfig, FetchConfig, OutputConfig, TargetConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound for the per-request timeout (seconds)
const MAX_TIMEOUT_SECS: u64 = 600;

/// Upper bound for retries after the first attempt
const MAX_RETRY_TIMES: u32 = 20;

/// Upper bound for concurrent image downloads
const MAX_IN_FLIGHT: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_target_config(&config.target)?;
    validate_fetch_config(&config.fetch)?;
    validate_download_config(&config.download)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the target entry
///
/// Only checks that the URL is a usable http(s) URL; the numeric `.html`
/// naming rule is enforced when the crawl validates its entry.
fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    if config.url.trim().is_empty() {
        return Err(ConfigError::Validation("url cannot be empty".to_string()));
    }

    let url = Url::parse(config.url.trim())
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid url '{}': {}", config.url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "url '{}' must use http or https",
            config.url
        )));
    }

    Ok(())
}

/// Validates fetcher settings
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout < 1 || config.timeout > MAX_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "timeout must be between 1 and {} seconds, got {}",
            MAX_TIMEOUT_SECS, config.timeout
        )));
    }

    if config.max_retry_times > MAX_RETRY_TIMES {
        return Err(ConfigError::Validation(format!(
            "max_retry_times must be <= {}, got {}",
            MAX_RETRY_TIMES, config.max_retry_times
        )));
    }

    if !config.referer.is_empty() {
        Url::parse(&config.referer)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid referer: {}", e)))?;
    }

    Ok(())
}

/// Validates the image download stage
fn validate_download_config(config: &DownloadConfig) -> Result<(), ConfigError> {
    if config.max_in_flight < 1 || config.max_in_flight > MAX_IN_FLIGHT {
        return Err(ConfigError::Validation(format!(
            "max_in_flight must be between 1 and {}, got {}",
            MAX_IN_FLIGHT, config.max_in_flight
        )));
    }

    if config.queue_capacity < 1 {
        return Err(ConfigError::Validation(format!(
            "queue_capacity must be >= 1, got {}",
            config.queue_capacity
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.root_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "root_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
