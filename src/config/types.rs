use std::path::PathBuf;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::errors::{RefineError, RetryConfig};

/// Lowest accepted exclusivity bound. A smaller value would let a review
/// scoring 70+ become Primary on a weak primary score.
pub const MIN_EXCLUSIVITY_THRESHOLD: u8 = 70;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RefineConfig {
    pub llm: LLMConfig,
    pub ranking: RankingConfig,
    pub validation: ValidationConfig,
    pub selection: SelectionConfig,
    pub engine: EngineConfig,
}

impl RefineConfig {
    /// Range checks run once at startup. Components assume a checked config.
    pub fn validate(&self) -> Result<(), RefineError> {
        let s = &self.selection;
        for (name, value) in [
            ("selection.primary_threshold", s.primary_threshold),
            ("selection.secondary_threshold", s.secondary_threshold),
            ("selection.exclusivity_threshold", s.exclusivity_threshold),
        ] {
            if value > 100 {
                return Err(RefineError::Config(format!("{} must be within 0..=100, got {}", name, value)));
            }
        }
        if s.exclusivity_threshold < MIN_EXCLUSIVITY_THRESHOLD {
            return Err(RefineError::Config(format!(
                "selection.exclusivity_threshold must be at least {}, got {}",
                MIN_EXCLUSIVITY_THRESHOLD, s.exclusivity_threshold
            )));
        }
        if !(0.0..=1.0).contains(&s.confidence_threshold) {
            return Err(RefineError::Config(format!(
                "selection.confidence_threshold must be within 0..=1, got {}",
                s.confidence_threshold
            )));
        }

        let v = &self.validation;
        if v.max_concurrent == 0 {
            return Err(RefineError::Config("validation.max_concurrent must be at least 1".into()));
        }
        if v.timeout_secs == 0 {
            return Err(RefineError::Config("validation.timeout_secs must be at least 1".into()));
        }
        if v.content_scan && v.scan_prefix_bytes == 0 {
            return Err(RefineError::Config("validation.scan_prefix_bytes must be non-zero when content_scan is on".into()));
        }

        if self.llm.timeout_secs == 0 {
            return Err(RefineError::Config("llm.timeout_secs must be at least 1".into()));
        }
        if self.engine.validate_top_n == 0 {
            return Err(RefineError::Config("engine.validate_top_n must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LLMConfig {
    pub provider: String,
    pub model: Option<String>,
    /// Literal key or `$ENV_VAR` reference.
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Per-request bound. Shorter than the validation timeout budget to stay
    /// inside upstream execution limits.
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub pricing: Option<Pricing>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: None,
            api_key: None,
            base_url: None,
            timeout_secs: 25,
            max_tokens: 4096,
            pricing: None,
        }
    }
}

impl LLMConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// USD per million tokens, used when the provider reports no cost.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct Pricing {
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
}

impl Pricing {
    pub fn estimate(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 * self.input_per_mtok / 1_000_000.0)
            + (output_tokens as f64 * self.output_per_mtok / 1_000_000.0)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RankingConfig {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Extra search rounds honored when the service asks for one.
    pub max_search_rounds: u32,
    /// At or above this many candidates the search tool is not offered.
    pub tool_disable_threshold: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay_ms: 2000,
            max_search_rounds: 3,
            tool_disable_threshold: 15,
        }
    }
}

impl RankingConfig {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub timeout_secs: u64,
    pub max_concurrent: usize,
    /// Pause each worker takes after finishing a URL.
    pub request_delay_ms: u64,
    pub content_scan: bool,
    pub scan_prefix_bytes: usize,
    pub user_agent: String,
    /// YAML pattern library replacing or extending the built-in one.
    pub pattern_file: Option<PathBuf>,
    pub reject_paywalls: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_concurrent: 5,
            request_delay_ms: 200,
            content_scan: true,
            scan_prefix_bytes: 50 * 1024,
            user_agent: concat!("refurl/", env!("CARGO_PKG_VERSION")).to_string(),
            pattern_file: None,
            reject_paywalls: false,
        }
    }
}

impl ValidationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub primary_threshold: u8,
    pub secondary_threshold: u8,
    /// Role-exclusivity bound: a URL strong in one role and below this in
    /// the other is barred from the other role.
    pub exclusivity_threshold: u8,
    pub confidence_threshold: f64,
    pub require_validation: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            primary_threshold: 75,
            secondary_threshold: 75,
            exclusivity_threshold: 70,
            confidence_threshold: 0.8,
            require_validation: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub validate_top_n: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { validate_top_n: 20 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(RefineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_selection_defaults() {
        let s = SelectionConfig::default();
        assert_eq!(s.primary_threshold, 75);
        assert_eq!(s.secondary_threshold, 75);
        assert_eq!(s.exclusivity_threshold, 70);
        assert!((s.confidence_threshold - 0.8).abs() < f64::EPSILON);
        assert!(s.require_validation);
    }

    #[test]
    fn test_validation_defaults() {
        let v = ValidationConfig::default();
        assert_eq!(v.max_concurrent, 5);
        assert_eq!(v.timeout(), Duration::from_secs(10));
        assert!(v.content_scan);
        assert!(!v.reject_paywalls);
    }

    #[test]
    fn test_llm_timeout_shorter_than_validation_bound() {
        assert_eq!(LLMConfig::default().timeout(), Duration::from_secs(25));
        assert_eq!(EngineConfig::default().validate_top_n, 20);
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let mut config = RefineConfig::default();
        config.selection.primary_threshold = 120;
        assert!(matches!(config.validate(), Err(RefineError::Config(_))));
    }

    #[test]
    fn test_low_exclusivity_threshold_rejected() {
        let mut config = RefineConfig::default();
        config.selection.primary_threshold = 60;
        config.selection.exclusivity_threshold = 50;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("exclusivity_threshold"));

        config.selection.exclusivity_threshold = 85;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_confidence_threshold_out_of_range_rejected() {
        let mut config = RefineConfig::default();
        config.selection.confidence_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = RefineConfig::default();
        config.validation.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: RefineConfig = serde_yaml::from_str("selection:\n  primary_threshold: 80\n").unwrap();
        assert_eq!(config.selection.primary_threshold, 80);
        assert_eq!(config.selection.secondary_threshold, 75);
        assert_eq!(config.validation.max_concurrent, 5);
        assert_eq!(config.llm.provider, "anthropic");
    }

    #[test]
    fn test_pricing_estimate() {
        let p = Pricing { input_per_mtok: 3.0, output_per_mtok: 15.0 };
        let cost = p.estimate(1_000_000, 100_000);
        assert!((cost - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_retry_config_from_ranking() {
        let r = RankingConfig::default().retry_config();
        assert_eq!(r.max_retries, 2);
        assert_eq!(r.delay, Duration::from_secs(2));
    }
}
