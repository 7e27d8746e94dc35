use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use super::{RankingResult, RefineStats, UrlSelection, UsageStats};

/// Result of one refinement: the selection plus the enriched rankings it was
/// made from, so callers can audit or persist the decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineOutcome {
    pub selection: UrlSelection,
    pub rankings: Vec<RankingResult>,
    pub stats: RefineStats,
    pub usage: UsageStats,
    pub refined_at: DateTime<Utc>,
}

impl RefineOutcome {
    /// Outcome for an empty candidate list.
    pub fn empty() -> Self {
        Self {
            selection: UrlSelection::empty(),
            rankings: Vec::new(),
            stats: RefineStats::default(),
            usage: UsageStats::default(),
            refined_at: Utc::now(),
        }
    }
}
