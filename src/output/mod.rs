//! Output module for crawl reports
//!
//! This module handles:
//! - The per-run report a crawl returns
//! - Printing that report at the end of a run

pub mod stats;

pub use stats::{print_report, CrawlReport, FailedUnit};
