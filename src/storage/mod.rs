//! Storage module for the on-disk mirror
//!
//! This module handles everything written under the entry root, including:
//! - Deterministic URL → local path resolution
//! - The existence-based artifact cache with zero-byte self-healing
//! - Metadata and manifest file formats, and lookup of earlier mirrors

mod cache;
mod layout;
mod manifest;

pub use cache::{CacheStats, CachedArtifact, ContentCache};
pub use layout::{
    page_basename, page_stem, PathResolver, CONTENT_DIR, IMAGES_DIR, MAIN_MANIFEST, META_DIR,
    METADATA_FILE, PAGES_DIR,
};
pub use manifest::{
    find_mirrored_slug, format_metadata, format_page_line, write_lines, write_text,
    METADATA_LABELS,
};
