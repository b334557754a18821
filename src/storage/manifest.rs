//! Metadata and manifest file formats
//!
//! - `meta/base`: exactly five labelled lines (title, url, cover,
//!   description, last-modified)
//! - `content/main`: `<local-page-path> <remote-basename>` per page
//! - `content/<page-stem>`: one resolved image path per line

use super::layout::{METADATA_FILE, META_DIR};
use crate::state::ComicEntry;
use crate::MirrorError;
use std::path::Path;

/// Labels of the metadata file, in file order
pub const METADATA_LABELS: [&str; 5] = ["title", "url", "cover", "description", "last-modified"];

/// Renders the metadata file of an entry
pub fn format_metadata(entry: &ComicEntry) -> String {
    let values = [
        single_line(&entry.title),
        single_line(&entry.main_url),
        single_line(&entry.cover_url),
        single_line(&entry.description),
        entry.last_modified_string(),
    ];

    METADATA_LABELS
        .iter()
        .zip(values.iter())
        .map(|(label, value)| format!("{}: {}\n", label, value))
        .collect()
}

/// Renders one line of the main manifest
pub fn format_page_line(local_path: &Path, remote_basename: &str) -> String {
    format!("{} {}", local_path.display(), remote_basename)
}

/// Writes newline-terminated lines to `path`, replacing any previous file
///
/// Parent directories are created as needed. An empty `lines` slice produces
/// an empty manifest, which is a valid "nothing found" record.
pub async fn write_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> Result<(), MirrorError> {
    let mut content = String::new();
    for line in lines {
        content.push_str(line.as_ref());
        content.push('\n');
    }
    write_text(path, &content).await
}

/// Writes `content` to `path`, creating parent directories as needed
pub async fn write_text(path: &Path, content: &str) -> Result<(), MirrorError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| MirrorError::storage(parent, e))?;
    }

    tokio::fs::write(path, content.as_bytes())
        .await
        .map_err(|e| MirrorError::storage(path, e))
}

/// Finds the entry directory under `root` whose metadata file records `main_url`
///
/// Returns the directory name. Unreadable directories and metadata files are
/// treated as "not mirrored".
pub async fn find_mirrored_slug(root: &Path, main_url: &str) -> Option<String> {
    let mut dirs = match tokio::fs::read_dir(root).await {
        Ok(dirs) => dirs,
        Err(e) => {
            tracing::debug!("No earlier mirror under {}: {}", root.display(), e);
            return None;
        }
    };
    let wanted = format!("{}: {}", METADATA_LABELS[1], single_line(main_url));

    loop {
        let dir = match dirs.next_entry().await {
            Ok(Some(dir)) => dir,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Stopped scanning {}: {}", root.display(), e);
                return None;
            }
        };

        let metadata = dir.path().join(META_DIR).join(METADATA_FILE);
        let Ok(content) = tokio::fs::read_to_string(&metadata).await else {
            continue;
        };
        if content.lines().any(|line| line == wanted) {
            tracing::debug!("{} is mirrored in {}", main_url, dir.path().display());
            return dir.file_name().to_str().map(str::to_string);
        }
    }
}

/// Collapses line breaks so a value always fits on one line
fn single_line(value: &str) -> String {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
