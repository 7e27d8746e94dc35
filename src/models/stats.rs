use serde::{Deserialize, Serialize};

/// Token and cost usage of one or more calls to the reasoning service.
///
/// Returned by value from every ranking call. Callers that want running
/// totals fold these together with [`UsageStats::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub calls: u32,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
}

impl UsageStats {
    pub fn merge(&mut self, other: &UsageStats) {
        self.calls += other.calls;
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.cost_usd += other.cost_usd;
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Summary counts for one refinement call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefineStats {
    pub total_candidates: usize,
    pub ranked_candidates: usize,
    pub validated_candidates: usize,
    pub valid_candidates: usize,
    pub invalid_candidates: usize,
    /// Transport errors and status >= 400.
    pub hard_failures: usize,
    /// Type mismatches, soft-404 pages and rejected paywalls.
    pub soft_failures: usize,
    /// Extra search rounds the ranker ran on the service's request.
    pub search_rounds: u32,
}
