//! HTML parser for discovering sub-pages and images
//!
//! Every function here is a pure function of an already parsed document:
//! - `discover_page_urls`: pagination links of the main page
//! - `discover_image_urls`: images inside the article body of any page
//!
//! Discovered references are resolved against the page they were found on,
//! deduplicated in document order, and filtered by the URL classifier.

use crate::url::{resolve_reference, ReferenceKind};
use crate::MirrorError;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Pagination markers of the main page
pub const PAGING_SELECTOR: &str =
    ".container .content-wrap .content .article-content .article-paging .post-page-numbers";

/// Images embedded in the article body
pub const IMAGE_SELECTOR: &str = ".container .content-wrap .content .article-content p img";

/// Decodes a fetched body and parses it as an HTML document
///
/// Fails with [`MirrorError::HtmlParse`] if the body is not UTF-8.
pub fn parse_document(url: &str, body: &[u8]) -> Result<Html, MirrorError> {
    let text = std::str::from_utf8(body).map_err(|e| MirrorError::HtmlParse {
        url: url.to_string(),
        message: format!("body is not valid UTF-8: {}", e),
    })?;
    Ok(Html::parse_document(text))
}

/// Enumerates every page of an entry from its main page
///
/// The main URL always comes first. Pagination links follow in document
/// order, first occurrence kept, each one a valid page reference.
///
/// # Example
///
/// ```
/// use comic_mirror::crawler::discover_page_urls;
/// use scraper::Html;
///
/// let html = r#"<div class="container"><div class="content-wrap"><div class="content">
///     <div class="article-content"><div class="article-paging">
///         <a class="post-page-numbers" href="page2.html">2</a>
///     </div></div></div></div></div>"#;
/// let document = Html::parse_document(html);
/// let pages = discover_page_urls("https://site/123.html", &document);
/// assert_eq!(pages, vec!["https://site/123.html", "https://site/page2.html"]);
/// ```
pub fn discover_page_urls(main_url: &str, document: &Html) -> Vec<String> {
    let mut pages = vec![main_url.to_string()];

    let Ok(base) = Url::parse(main_url) else {
        return pages;
    };

    for url in collect_references(document, PAGING_SELECTOR, "href", &base) {
        if url == main_url || url == base.as_str() {
            continue;
        }
        if !ReferenceKind::Page.accepts(&url) {
            continue;
        }
        if !pages.contains(&url) {
            pages.push(url);
        }
    }

    pages
}

/// Enumerates the images of one page in document order, without duplicates
pub fn discover_image_urls(page_url: &str, document: &Html) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };

    collect_references(document, IMAGE_SELECTOR, "src", &base)
        .into_iter()
        .filter(|url| ReferenceKind::Image.accepts(url))
        .collect()
}

/// Resolves the `attr` of every element matching `css`, deduplicated in order
fn collect_references(document: &Html, css: &str, attr: &str, base: &Url) -> Vec<String> {
    let selector = match Selector::parse(css) {
        Ok(selector) => selector,
        Err(e) => {
            tracing::error!("Invalid selector {}: {:?}", css, e);
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut references = Vec::new();

    for element in document.select(&selector) {
        let Some(value) = element.value().attr(attr) else {
            tracing::debug!("Element without {} attribute under {}", attr, css);
            continue;
        };

        let Some(absolute) = resolve_reference(base, value) else {
            tracing::debug!("Skipping unusable reference {:?}", value);
            continue;
        };

        if seen.insert(absolute.clone()) {
            references.push(absolute);
        } else {
            tracing::debug!("Reference {} already seen", absolute);
        }
    }

    references
}
