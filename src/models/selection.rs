use serde::{Deserialize, Serialize};

/// One chosen URL with the score it was chosen on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedUrl {
    pub url: String,
    /// Raw ranker score for the role, 0-100.
    pub score: u8,
    /// Derived trust in [0, 1], two decimals.
    pub confidence: f64,
    pub reason: String,
}

/// Final decision for one reference. This is the only artifact the engine
/// hands downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlSelection {
    pub primary: Option<SelectedUrl>,
    pub secondary: Option<SelectedUrl>,
    pub high_confidence: bool,
    pub needs_review: bool,
}

impl UrlSelection {
    /// Nothing selected; always flagged for review.
    pub fn empty() -> Self {
        Self {
            primary: None,
            secondary: None,
            high_confidence: false,
            needs_review: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.secondary.is_none()
    }
}

impl Default for UrlSelection {
    fn default() -> Self {
        Self::empty()
    }
}
