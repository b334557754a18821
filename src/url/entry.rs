use crate::MirrorError;
use url::Url;

/// Extracts the entry number from a main page URL
///
/// The main URL must be absolute, its path must end in `.html`, and the file
/// stem in front of `.html` must be an unsigned integer.
///
/// # Examples
///
/// ```
/// use comic_mirror::url::parse_entry_number;
///
/// assert_eq!(parse_entry_number("https://site/123.html").unwrap(), 123);
/// assert!(parse_entry_number("https://site/abc.html").is_err());
/// ```
pub fn parse_entry_number(main_url: &str) -> Result<u64, MirrorError> {
    let invalid = |reason: String| MirrorError::Validation {
        url: main_url.to_string(),
        reason,
    };

    let url = Url::parse(main_url.trim())
        .map_err(|e| invalid(format!("not an absolute URL ({})", e)))?;

    let file = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .ok_or_else(|| invalid("URL has no path".to_string()))?;

    let stem = file
        .strip_suffix(".html")
        .ok_or_else(|| invalid("path must end in .html".to_string()))?;

    stem.parse::<u64>()
        .map_err(|_| invalid(format!("file name '{}' is not numeric", stem)))
}
