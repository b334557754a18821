//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the stage a crawl is in (validating, fetching, downloading, ...)
//! - `ComicEntry`: the entry being mirrored, filled in by each stage

mod crawl_state;
mod entry;

// Re-export main types
pub use crawl_state::CrawlState;
pub use entry::ComicEntry;
