//! The comic entry a crawl builds up stage by stage

use crate::crawler::Metadata;
use crate::url::parse_entry_number;
use crate::MirrorError;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// One comic entry: a numbered main page, its sub-pages and their images
///
/// Created once per crawl from the main URL and filled in place by each
/// stage. Only its on-disk effects outlive the run.
#[derive(Debug, Clone)]
pub struct ComicEntry {
    /// URL of the main page
    pub main_url: String,

    /// Identity taken from the main page file name (`<number>.html`)
    pub number: u64,

    /// Title as published
    pub title: String,

    /// ASCII transliteration of the title; root directory of every artifact
    pub slug_title: String,

    /// Free-form description, empty when the page has none
    pub description: String,

    /// Absolute URL of the cover image
    pub cover_url: String,

    /// Last modification date, when the page states a valid one
    pub last_modified: Option<NaiveDate>,

    page_urls: Vec<String>,
    image_urls: BTreeSet<String>,
}

impl ComicEntry {
    /// Validates the main URL and creates an empty entry for it
    ///
    /// Fails with [`MirrorError::Validation`] unless the URL names a
    /// `<number>.html` resource.
    pub fn new(main_url: &str) -> Result<Self, MirrorError> {
        let main_url = main_url.trim().to_string();
        let number = parse_entry_number(&main_url)?;

        Ok(Self {
            page_urls: vec![main_url.clone()],
            main_url,
            number,
            title: String::new(),
            slug_title: String::new(),
            description: String::new(),
            cover_url: String::new(),
            last_modified: None,
            image_urls: BTreeSet::new(),
        })
    }

    /// Copies extracted metadata into the entry
    pub fn apply_metadata(&mut self, metadata: Metadata) {
        self.title = metadata.title;
        self.slug_title = metadata.slug_title;
        self.description = metadata.description;
        self.cover_url = metadata.cover_url;
        self.last_modified = metadata.last_modified;
    }

    /// Replaces the page list, keeping the main URL first and dropping duplicates
    pub fn set_page_urls(&mut self, urls: Vec<String>) {
        let mut page_urls = vec![self.main_url.clone()];
        for url in urls {
            if !page_urls.contains(&url) {
                page_urls.push(url);
            }
        }
        self.page_urls = page_urls;
    }

    /// Pages of the entry in fetch order; the first one is always the main URL
    pub fn page_urls(&self) -> &[String] {
        &self.page_urls
    }

    /// Adds image URLs found on one page, returns how many were new
    pub fn add_image_urls<I>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        urls.into_iter()
            .filter(|url| self.image_urls.insert(url.clone()))
            .count()
    }

    /// Every distinct image URL discovered across all pages
    pub fn image_urls(&self) -> &BTreeSet<String> {
        &self.image_urls
    }

    /// Formats the last-modified date as `YYYY-MM-DD`, empty when unknown
    pub fn last_modified_string(&self) -> String {
        self.last_modified
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}
