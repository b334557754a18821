//! URL handling module for Comic-Mirror
//!
//! This module provides the reference classifier (page vs image), entry URL
//! validation, and resolution of relative references found in documents.

mod classify;
mod entry;
mod resolve;

pub use classify::{is_image_reference, is_page_reference, SUPPORTED_IMAGE_EXTENSIONS};
pub use entry::parse_entry_number;
pub use resolve::resolve_reference;

/// Kind of reference a discovered URL is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// A paginated sub-page of the entry
    Page,
    /// An embedded image
    Image,
}

impl ReferenceKind {
    /// Runs the classifier matching this kind
    pub fn accepts(&self, url: &str) -> bool {
        match self {
            Self::Page => is_page_reference(url),
            Self::Image => is_image_reference(url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_kind_dispatch() {
        assert!(ReferenceKind::Page.accepts("https://x.com/a/page3.html"));
        assert!(!ReferenceKind::Page.accepts("https://x.com/img/1.jpg"));
        assert!(ReferenceKind::Image.accepts("https://x.com/img/1.jpg"));
        assert!(!ReferenceKind::Image.accepts("https://x.com/a/page3.html"));
    }
}
