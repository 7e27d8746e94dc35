use serde::{Deserialize, Serialize};
use super::validation::ValidationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Primary,
    Secondary,
    Neither,
}

impl Recommendation {
    /// Lenient parse of the ranker's `recommend` column.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "primary" | "p" => Some(Self::Primary),
            "secondary" | "s" => Some(Self::Secondary),
            "neither" | "none" | "n" | "-" => Some(Self::Neither),
            _ => None,
        }
    }

    /// Fallback when the service omits the column.
    pub fn from_scores(primary: u8, secondary: u8) -> Self {
        if primary >= 75 && primary >= secondary {
            Self::Primary
        } else if secondary >= 75 {
            Self::Secondary
        } else {
            Self::Neither
        }
    }
}

/// Validation status attached to a ranking entry by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ValidationState {
    /// Outside the validated top N.
    #[default]
    NotValidated,
    Valid,
    Invalid { reason: String },
}

/// The ranker's judgment of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingResult {
    pub url: String,
    pub title: String,
    pub primary_score: u8,
    pub secondary_score: u8,
    pub primary_reason: String,
    pub secondary_reason: String,
    pub recommendation: Recommendation,
    pub title_match: Option<String>,
    pub author_match: Option<String>,
    #[serde(default)]
    pub validation: ValidationState,
}

impl RankingResult {
    /// `None` until the engine has validated this URL.
    pub fn valid(&self) -> Option<bool> {
        match self.validation {
            ValidationState::NotValidated => None,
            ValidationState::Valid => Some(true),
            ValidationState::Invalid { .. } => Some(false),
        }
    }

    pub fn validation_reason(&self) -> Option<&str> {
        match &self.validation {
            ValidationState::Invalid { reason } => Some(reason),
            _ => None,
        }
    }

    /// Attach a validation outcome. Scores and reasons are left untouched.
    pub fn apply_validation(&mut self, result: &ValidationResult) {
        self.validation = if result.valid {
            ValidationState::Valid
        } else {
            let reason = match (&result.failure_reason, &result.transport_error) {
                (Some(reason), Some(err)) => format!("{}: {}", reason, err),
                (Some(reason), None) => reason.clone(),
                (None, Some(err)) => err.clone(),
                (None, None) => "invalid".to_string(),
            };
            ValidationState::Invalid { reason }
        };
    }

    /// The stronger of the two role scores.
    pub fn best_score(&self) -> u8 {
        self.primary_score.max(self.secondary_score)
    }
}
