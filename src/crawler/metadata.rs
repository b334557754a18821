//! Metadata extraction from the main page
//!
//! All values live under the article header of the main page. When a
//! selector matches several elements the last match wins.

use crate::url::resolve_reference;
use crate::MirrorError;
use chrono::NaiveDate;
use pinyin::ToPinyin;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Root of every metadata selector
pub const ARTICLE_HEADER: &str = ".container .content-wrap .content .article-header";

const TITLE_SELECTOR: &str = ".article-title";
const DESCRIPTION_SELECTOR: &str = ".dis";
const COVER_SELECTOR: &str = ".c-img img";
const META_SELECTOR: &str = ".article-meta li";

/// Fields extracted from the main page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub slug_title: String,
    pub description: String,
    pub cover_url: String,
    pub last_modified: Option<NaiveDate>,
}

/// Extracts the entry metadata from the parsed main page
///
/// Title and cover are required; the crawl cannot place any artifact
/// without a title. Description and last-modified date are optional.
pub fn extract_metadata(main_url: &str, document: &Html) -> Result<Metadata, MirrorError> {
    let missing = |field: &'static str| MirrorError::MissingField {
        field,
        url: main_url.to_string(),
    };

    let title = select_all(document, TITLE_SELECTOR)
        .last()
        .map(|element| element_text(&element))
        .filter(|text| !text.is_empty())
        .ok_or_else(|| missing("title"))?;

    let slug_title = transliterate(&title);
    if slug_title.is_empty() {
        tracing::error!("Title {:?} has no usable transliteration", title);
        return Err(missing("title"));
    }

    let description = select_all(document, DESCRIPTION_SELECTOR)
        .last()
        .map(|element| element_text(&element))
        .unwrap_or_default();

    let base = Url::parse(main_url).ok();
    let cover_url = select_all(document, COVER_SELECTOR)
        .filter_map(|element| {
            let src = element.value().attr("src")?;
            match &base {
                Some(base) => resolve_reference(base, src),
                None => Some(src.trim().to_string()).filter(|s| !s.is_empty()),
            }
        })
        .last()
        .ok_or_else(|| missing("cover"))?;

    let last_modified = select_all(document, META_SELECTOR)
        .filter_map(|element| parse_labelled_date(&element_text(&element)))
        .last();

    tracing::debug!(
        "Extracted metadata: title={:?}, slug={}, cover={}, last_modified={:?}",
        title,
        slug_title,
        cover_url,
        last_modified
    );

    Ok(Metadata {
        title,
        slug_title,
        description,
        cover_url,
        last_modified,
    })
}

/// Converts a title into a filesystem-safe ASCII slug
///
/// Han characters become toneless pinyin, other non-ASCII letters their
/// closest ASCII spelling. Whitespace disappears without a separator and
/// only `[A-Za-z0-9_-]` survives.
///
/// # Examples
///
/// ```
/// use comic_mirror::crawler::transliterate;
///
/// assert_eq!(transliterate("示例"), "shili");
/// assert_eq!(transliterate("第 1 话"), "di1hua");
/// ```
pub fn transliterate(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());

    for c in title.chars() {
        if c.is_whitespace() {
            continue;
        }

        if c.is_ascii() {
            if is_slug_char(c) {
                slug.push(c);
            }
            continue;
        }

        if let Some(pinyin) = c.to_pinyin() {
            slug.push_str(pinyin.plain());
        } else if let Some(ascii) = deunicode::deunicode_char(c) {
            slug.extend(ascii.chars().filter(|c| is_slug_char(*c)));
        }
    }

    slug
}

/// Parses `<label>:<YYYY-MM-DD>`; anything else yields None
fn parse_labelled_date(text: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = text.split([':', '：']).collect();
    if parts.len() != 2 {
        return None;
    }

    let value = parts[1].trim();
    if value.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn is_slug_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn select_all<'a>(document: &'a Html, css: &str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    let selector = Selector::parse(&format!("{} {}", ARTICLE_HEADER, css)).ok();
    if selector.is_none() {
        tracing::error!("Invalid metadata selector {}", css);
    }

    selector
        .into_iter()
        .flat_map(move |selector| document.select(&selector).collect::<Vec<_>>())
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
