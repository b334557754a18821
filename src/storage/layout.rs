use crate::MirrorError;
use std::path::{Path, PathBuf};
use url::Url;

/// Directory holding the metadata file
pub const META_DIR: &str = "meta";

/// Directory holding the manifest files
pub const CONTENT_DIR: &str = "content";

/// Directory holding cached page HTML
pub const PAGES_DIR: &str = "pages";

/// Directory holding cached image bytes
pub const IMAGES_DIR: &str = "images";

/// File name of the metadata file inside [`META_DIR`]
pub const METADATA_FILE: &str = "base";

/// Name of the manifest listing every page of the entry
pub const MAIN_MANIFEST: &str = "main";

/// Maps remote URLs of one entry to deterministic local paths
///
/// Every artifact lives under `<root>/<slug>/`:
///
/// | Artifact | Path |
/// |----------|------|
/// | metadata | `meta/base` |
/// | manifest | `content/<name>` |
/// | page     | `pages/<basename-of-url>` |
/// | image    | `images/<url-path>` |
#[derive(Debug, Clone)]
pub struct PathResolver {
    entry_root: PathBuf,
}

impl PathResolver {
    /// Creates a resolver for the entry whose slug title is `slug`
    ///
    /// Fails with [`MirrorError::InvalidReference`] if the slug is empty or
    /// is not a single plain path component.
    pub fn new(root: impl AsRef<Path>, slug: &str) -> Result<Self, MirrorError> {
        if slug.is_empty() || slug == "." || slug == ".." || slug.contains(['/', '\\']) {
            return Err(MirrorError::InvalidReference(format!(
                "'{}' cannot be used as an entry directory",
                slug
            )));
        }

        Ok(Self {
            entry_root: root.as_ref().join(slug),
        })
    }

    /// Directory every artifact of this entry lives under
    pub fn entry_root(&self) -> &Path {
        &self.entry_root
    }

    /// Path of the metadata file
    pub fn metadata_path(&self) -> PathBuf {
        self.entry_root.join(META_DIR).join(METADATA_FILE)
    }

    /// Path of a named manifest file
    pub fn manifest_path(&self, name: &str) -> PathBuf {
        self.entry_root.join(CONTENT_DIR).join(name)
    }

    /// Path of the cached HTML for a page URL
    pub fn page_path(&self, url: &str) -> Result<PathBuf, MirrorError> {
        let basename = page_basename(url)?;
        Ok(self.entry_root.join(PAGES_DIR).join(basename))
    }

    /// Path of the cached bytes for an image URL
    ///
    /// The remote path hierarchy is kept below the image root so two images
    /// sharing a file name in different remote directories never collide.
    pub fn image_path(&self, url: &str) -> Result<PathBuf, MirrorError> {
        let parsed = Url::parse(url.trim()).map_err(|e| {
            MirrorError::InvalidReference(format!("image {} is not an absolute URL: {}", url, e))
        })?;

        let segments: Vec<&str> = parsed
            .path_segments()
            .ok_or_else(|| {
                MirrorError::InvalidReference(format!("image {} has no path", url))
            })?
            .filter(|segment| !segment.is_empty())
            .collect();

        if segments.is_empty() {
            return Err(MirrorError::InvalidReference(format!(
                "image {} has an empty path",
                url
            )));
        }

        if segments.iter().any(|s| *s == "." || *s == ".." || s.contains('\\')) {
            return Err(MirrorError::InvalidReference(format!(
                "image {} escapes the image directory",
                url
            )));
        }

        let mut path = self.entry_root.join(IMAGES_DIR);
        path.extend(segments);
        Ok(path)
    }
}

/// Returns the last path component of a page URL, without query or fragment
pub fn page_basename(url: &str) -> Result<String, MirrorError> {
    let trimmed = url.trim();
    let without_query = trimmed
        .split(['?', '#'])
        .next()
        .unwrap_or(trimmed);

    let (_, basename) = without_query.rsplit_once('/').ok_or_else(|| {
        MirrorError::InvalidReference(format!("page {} has no path separator", url))
    })?;

    if basename.is_empty() || basename == "." || basename == ".." {
        return Err(MirrorError::InvalidReference(format!(
            "page {} has no file name",
            url
        )));
    }

    Ok(basename.to_string())
}

/// Returns the manifest name of a page: its basename without the extension
///
/// `https://site/123.html` becomes `123`, `https://site/page2.html` becomes `page2`.
pub fn page_stem(url: &str) -> Result<String, MirrorError> {
    let basename = page_basename(url)?;
    let stem = match basename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => basename.as_str(),
    };
    Ok(stem.to_string())
}
