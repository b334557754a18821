/// Crawl state definitions for one mirror run
///
/// This module defines the stages a crawl passes through and which
/// transitions between them are legal.
use std::fmt;

/// Represents the current stage of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    // ===== Entry Stages (failures abort the crawl) =====
    /// Checking the main URL before any network access
    Validating,

    /// Fetching the main page
    FetchingMain,

    /// Extracting title, cover, description and date from the main page
    ExtractingMetadata,

    /// Enumerating the paginated sub-pages
    DiscoveringPages,

    // ===== Per-Unit Stages (failures skip one unit) =====
    /// Fetching every page, cache first
    FetchingPages,

    /// Enumerating the images of every fetched page
    DiscoveringImages,

    /// Draining the image download queue
    DownloadingImages,

    // ===== Terminal States =====
    /// Every stage ran; individual units may still have failed
    Done,

    /// An entry stage failed and the crawl was aborted
    Failed,
}

impl CrawlState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if an error in this state aborts the whole crawl
    pub fn is_fatal_on_error(&self) -> bool {
        matches!(
            self,
            Self::Validating
                | Self::FetchingMain
                | Self::ExtractingMetadata
                | Self::DiscoveringPages
        )
    }

    /// Returns the stage that follows this one on the success path
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Validating => Some(Self::FetchingMain),
            Self::FetchingMain => Some(Self::ExtractingMetadata),
            Self::ExtractingMetadata => Some(Self::DiscoveringPages),
            Self::DiscoveringPages => Some(Self::FetchingPages),
            Self::FetchingPages => Some(Self::DiscoveringImages),
            Self::DiscoveringImages => Some(Self::DownloadingImages),
            Self::DownloadingImages => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    /// Checks whether moving from this state to `to` is legal
    ///
    /// The success path advances one stage at a time; `Failed` is only
    /// reachable from the entry stages.
    pub fn can_transition_to(&self, to: CrawlState) -> bool {
        if to == Self::Failed {
            return self.is_fatal_on_error();
        }
        self.next() == Some(to)
    }

    /// Short name used in log lines and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::FetchingMain => "fetching_main",
            Self::ExtractingMetadata => "extracting_metadata",
            Self::DiscoveringPages => "discovering_pages",
            Self::FetchingPages => "fetching_pages",
            Self::DiscoveringImages => "discovering_images",
            Self::DownloadingImages => "downloading_images",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible crawl states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Validating,
            Self::FetchingMain,
            Self::ExtractingMetadata,
            Self::DiscoveringPages,
            Self::FetchingPages,
            Self::DiscoveringImages,
            Self::DownloadingImages,
            Self::Done,
            Self::Failed,
        ]
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_path_reaches_done() {
        let mut state = CrawlState::Validating;
        let mut steps = 0;
        while let Some(next) = state.next() {
            assert!(state.can_transition_to(next));
            state = next;
            steps += 1;
        }
        assert_eq!(state, CrawlState::Done);
        assert_eq!(steps, 7);
    }

    #[test]
    fn test_failed_only_from_entry_stages() {
        assert!(CrawlState::Validating.can_transition_to(CrawlState::Failed));
        assert!(CrawlState::FetchingMain.can_transition_to(CrawlState::Failed));
        assert!(CrawlState::ExtractingMetadata.can_transition_to(CrawlState::Failed));
        assert!(CrawlState::DiscoveringPages.can_transition_to(CrawlState::Failed));

        assert!(!CrawlState::FetchingPages.can_transition_to(CrawlState::Failed));
        assert!(!CrawlState::DiscoveringImages.can_transition_to(CrawlState::Failed));
        assert!(!CrawlState::DownloadingImages.can_transition_to(CrawlState::Failed));
        assert!(!CrawlState::Done.can_transition_to(CrawlState::Failed));
    }

    #[test]
    fn test_stages_cannot_be_skipped() {
        assert!(!CrawlState::Validating.can_transition_to(CrawlState::ExtractingMetadata));
        assert!(!CrawlState::FetchingPages.can_transition_to(CrawlState::Done));
        assert!(!CrawlState::Done.can_transition_to(CrawlState::Validating));
    }

    #[test]
    fn test_terminal_states() {
        for state in CrawlState::all_states() {
            assert_eq!(
                state.is_terminal(),
                matches!(state, CrawlState::Done | CrawlState::Failed)
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(CrawlState::FetchingMain.to_string(), "fetching_main");
        assert_eq!(CrawlState::Done.to_string(), "done");
    }
}
