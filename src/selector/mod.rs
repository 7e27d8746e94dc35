//! Deterministic choice of at most one Primary and one Secondary URL.

use crate::config::{SelectionConfig, MIN_EXCLUSIVITY_THRESHOLD};
use crate::models::{RankingResult, SelectedUrl, UrlSelection};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Primary,
    Secondary,
}

pub struct UrlSelector {
    config: SelectionConfig,
}

impl UrlSelector {
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    /// Pure function of `rankings` and the config; calling it twice on the
    /// same input gives the same selection.
    pub fn select_urls(&self, rankings: &[RankingResult]) -> UrlSelection {
        let pool: Vec<&RankingResult> = rankings
            .iter()
            .filter(|r| !self.config.require_validation || r.valid() == Some(true))
            .collect();
        if pool.is_empty() {
            debug!(rankings = rankings.len(), "No eligible candidates for selection");
            return UrlSelection::empty();
        }

        let primary = self.pick(&pool, Role::Primary, None);
        let secondary = self.pick(&pool, Role::Secondary, primary.map(|r| r.url.as_str()));

        let primary = primary.map(|r| self.selected(r, Role::Primary));
        let secondary = secondary.map(|r| self.selected(r, Role::Secondary));
        let high_confidence = self.is_high_confidence(primary.as_ref(), secondary.as_ref());
        let needs_review = !high_confidence || (primary.is_none() && secondary.is_none());

        UrlSelection { primary, secondary, high_confidence, needs_review }
    }

    /// Highest role score among eligible rows. On ties the earlier row wins.
    fn pick<'a>(&self, pool: &[&'a RankingResult], role: Role, exclude: Option<&str>) -> Option<&'a RankingResult> {
        let mut best: Option<&'a RankingResult> = None;
        for r in pool.iter().copied() {
            if exclude == Some(r.url.as_str()) || !self.eligible(r, role) {
                continue;
            }
            if best.map_or(true, |b| score(r, role) > score(b, role)) {
                best = Some(r);
            }
        }
        best
    }

    fn eligible(&self, r: &RankingResult, role: Role) -> bool {
        // Unchecked configs still get the 70-point guard
        let bound = self.config.exclusivity_threshold.max(MIN_EXCLUSIVITY_THRESHOLD);
        match role {
            Role::Primary => {
                r.primary_score >= self.config.primary_threshold
                    && !(r.secondary_score >= bound && r.primary_score < bound)
            }
            Role::Secondary => {
                r.secondary_score >= self.config.secondary_threshold
                    && !(r.primary_score >= bound && r.secondary_score < bound)
            }
        }
    }

    fn selected(&self, r: &RankingResult, role: Role) -> SelectedUrl {
        let score = score(r, role);
        let reason = match role {
            Role::Primary => r.primary_reason.clone(),
            Role::Secondary => r.secondary_reason.clone(),
        };
        SelectedUrl {
            url: r.url.clone(),
            score,
            confidence: confidence(score, r.valid() == Some(true)),
            reason,
        }
    }

    fn is_high_confidence(&self, primary: Option<&SelectedUrl>, secondary: Option<&SelectedUrl>) -> bool {
        let threshold = self.config.confidence_threshold;
        match (primary, secondary) {
            (Some(p), _) if p.confidence >= 0.9 => true,
            (Some(p), Some(s)) if p.confidence >= threshold && s.confidence >= threshold => true,
            (Some(p), _) => p.confidence >= threshold,
            (None, _) => false,
        }
    }
}

fn score(r: &RankingResult, role: Role) -> u8 {
    match role {
        Role::Primary => r.primary_score,
        Role::Secondary => r.secondary_score,
    }
}

/// `score / 100` with bonuses for a validated URL and for a score of 90 or
/// more, clamped to `[0, 1]` and rounded to two decimals.
pub fn confidence(score: u8, validated: bool) -> f64 {
    let mut c = f64::from(score) / 100.0;
    if validated {
        c += 0.1;
    }
    if score >= 90 {
        c += 0.1;
    }
    (c.clamp(0.0, 1.0) * 100.0).round() / 100.0
}
