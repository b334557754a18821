//! Configuration module for Comic-Mirror
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use comic_mirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mirror.toml")).unwrap();
//! println!("Per-request timeout: {}s", config.fetch.timeout);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DownloadConfig, FetchConfig, OutputConfig, TargetConfig, DEFAULT_MAX_RETRY_TIMES,
    DEFAULT_REFERER, DEFAULT_ROOT_PATH, DEFAULT_TIMEOUT_SECS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
