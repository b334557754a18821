use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use comic_mirror::config::load_config;
///
/// let config = load_config(Path::new("mirror.toml")).unwrap();
/// println!("Mirroring into: {}", config.output.root_path);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs made with different settings can be told apart.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[target]
url = "https://www.example.com/123.html"

[fetch]
timeout = 20
max-retry-times = 5
retry-base-delay = 100
debug = true

[download]
max-in-flight = 4
queue-capacity = 64
request-interval = 250

[output]
root-path = "/srv/mirror"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.target.url, "https://www.example.com/123.html");
        assert_eq!(config.fetch.timeout, 20);
        assert_eq!(config.fetch.max_retry_times, 5);
        assert_eq!(config.fetch.retry_base_delay, 100);
        assert!(config.fetch.debug);
        assert_eq!(config.download.max_in_flight, 4);
        assert_eq!(config.download.queue_capacity, 64);
        assert_eq!(config.download.request_interval, 250);
        assert_eq!(config.output.root_path, "/srv/mirror");
    }

    #[test]
    fn test_sections_default_when_missing() {
        let file = create_temp_config(
            r#"
[target]
url = "https://www.example.com/7.html"
"#,
        );
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.fetch.timeout, 10);
        assert_eq!(config.fetch.max_retry_times, 3);
        assert!(!config.fetch.debug);
        assert_eq!(config.fetch.referer, "https://www.san499.com/");
        assert_eq!(config.download.max_in_flight, 1);
        assert_eq!(config.download.queue_capacity, 256);
        assert_eq!(config.output.root_path, "./data");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/mirror.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config(
            r#"
[target]
url = "https://www.example.com/1.html"

[download]
max-in-flight = 0
"#,
        );
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
