use url::Url;

/// Image extensions the mirror accepts (lowercase, without the dot)
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Returns the final path segment of an absolute URL
///
/// Returns None if the string is not an absolute URL or the URL cannot carry
/// a hierarchical path (`mailto:` and friends).
pub(crate) fn final_segment(url_str: &str) -> Option<String> {
    let url = Url::parse(url_str.trim()).ok()?;
    let segment = url.path_segments()?.last()?.to_string();
    Some(segment)
}

/// Checks whether a URL references a paginated sub-page
///
/// A page reference is an absolute URL whose last path segment starts with
/// `page` and ends with `.html`, compared case-insensitively.
///
/// # Examples
///
/// ```
/// use comic_mirror::url::is_page_reference;
///
/// assert!(is_page_reference("https://x.com/a/page3.html"));
/// assert!(is_page_reference("https://x.com/a/Page3.HTML"));
/// assert!(!is_page_reference("https://x.com/a/chapter3.html"));
/// ```
pub fn is_page_reference(url_str: &str) -> bool {
    let Some(file) = final_segment(url_str) else {
        tracing::debug!("Rejecting page reference {}: not an absolute URL", url_str);
        return false;
    };

    let file = file.to_lowercase();
    if !file.starts_with("page") {
        tracing::debug!("Rejecting page reference {}: no `page` prefix", url_str);
        return false;
    }

    if !file.ends_with(".html") {
        tracing::debug!("Rejecting page reference {}: no `.html` suffix", url_str);
        return false;
    }

    true
}

/// Checks whether a URL references a supported image
///
/// # Examples
///
/// ```
/// use comic_mirror::url::is_image_reference;
///
/// assert!(is_image_reference("https://x.com/img/1.webp"));
/// assert!(!is_image_reference("https://x.com/img/1.bmp"));
/// ```
pub fn is_image_reference(url_str: &str) -> bool {
    let Some(file) = final_segment(url_str) else {
        tracing::debug!("Rejecting image reference {}: not an absolute URL", url_str);
        return false;
    };

    let file = file.to_lowercase();
    let Some((_, extension)) = file.rsplit_once('.') else {
        tracing::debug!("Rejecting image reference {}: no extension", url_str);
        return false;
    };

    if !SUPPORTED_IMAGE_EXTENSIONS.contains(&extension) {
        tracing::debug!(
            "Rejecting image reference {}: unsupported extension [{}]",
            url_str,
            extension
        );
        return false;
    }

    true
}
