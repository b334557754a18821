//! Existence-based cache of fetched artifacts
//!
//! A cached artifact is any regular file at a resolved path. Zero-byte files
//! are left behind by interrupted writes; they are deleted on sight and
//! reported as misses so the artifact is fetched again.

use crate::MirrorError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// A previously fetched artifact found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArtifact {
    /// Local path of the artifact
    pub path: PathBuf,

    /// Size in bytes, never zero
    pub size: u64,
}

/// Snapshot of the cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub repaired: u64,
}

/// Filesystem cache shared by the page loop and the image workers
#[derive(Debug, Default)]
pub struct ContentCache {
    hits: AtomicU64,
    misses: AtomicU64,
    repaired: AtomicU64,
}

impl ContentCache {
    /// Creates a cache with zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the artifact at `path` without reading it
    ///
    /// # Returns
    ///
    /// * `Ok(Some(CachedArtifact))` - A non-empty file exists
    /// * `Ok(None)` - Nothing usable is cached (a zero-byte file is removed)
    /// * `Err(MirrorError)` - The path could not be inspected
    pub async fn lookup(&self, path: &Path) -> Result<Option<CachedArtifact>, MirrorError> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return Ok(None);
            }
            Err(e) => return Err(MirrorError::storage(path, e)),
        };

        if !metadata.is_file() {
            return Err(MirrorError::storage(
                path,
                std::io::Error::new(ErrorKind::Other, "cached artifact is not a regular file"),
            ));
        }

        if metadata.len() == 0 {
            tracing::warn!(
                "Removing zero-byte cached artifact {}, it will be fetched again",
                path.display()
            );
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(MirrorError::storage(path, e)),
            }
            self.repaired.fetch_add(1, Ordering::Relaxed);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        Ok(Some(CachedArtifact {
            path: path.to_path_buf(),
            size: metadata.len(),
        }))
    }

    /// Returns true if a non-empty artifact exists at `path`
    pub async fn exists(&self, path: &Path) -> Result<bool, MirrorError> {
        Ok(self.lookup(path).await?.is_some())
    }

    /// Reads the artifact at `path` if a non-empty one is cached
    pub async fn load(&self, path: &Path) -> Result<Option<Vec<u8>>, MirrorError> {
        if self.lookup(path).await?.is_none() {
            return Ok(None);
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| MirrorError::storage(path, e))?;
        Ok(Some(bytes))
    }

    /// Writes `bytes` to `path`, creating parent directories as needed
    ///
    /// Existing content is overwritten. An empty payload is refused so a
    /// store never produces an artifact the next lookup would discard.
    pub async fn store(&self, path: &Path, bytes: &[u8]) -> Result<(), MirrorError> {
        if bytes.is_empty() {
            return Err(MirrorError::storage(
                path,
                std::io::Error::new(ErrorKind::InvalidData, "refusing to cache an empty payload"),
            ));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MirrorError::storage(parent, e))?;
        }

        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| MirrorError::storage(path, e))?;

        tracing::debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(())
    }

    /// Returns the current counter values
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            repaired: self.repaired.load(Ordering::Relaxed),
        }
    }
}
