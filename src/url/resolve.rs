use url::Url;

/// Resolves an `href`/`src` attribute against the document it was found in
///
/// Returns None if the reference should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// # Examples
///
/// ```
/// use comic_mirror::url::resolve_reference;
/// use url::Url;
///
/// let base = Url::parse("https://site/123.html").unwrap();
/// assert_eq!(
///     resolve_reference(&base, "page2.html"),
///     Some("https://site/page2.html".to_string())
/// );
/// assert_eq!(resolve_reference(&base, "javascript:void(0)"), None);
/// ```
pub fn resolve_reference(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    match base.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        _ => None,
    }
}
