//! Rank, validate, select: one refinement per reference.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use crate::config::{EngineConfig, RefineConfig};
use crate::errors::RefineError;
use crate::llm::LLMProvider;
use crate::models::{RankingResult, RefineOutcome, RefineStats, Reference, SearchCandidate, ValidationResult};
use crate::ranker::{Ranker, SearchProvider};
use crate::selector::UrlSelector;
use crate::validator::UrlValidator;
use tracing::{debug, info};

pub struct RefinementEngine {
    ranker: Ranker,
    validator: UrlValidator,
    selector: UrlSelector,
    config: EngineConfig,
}

impl RefinementEngine {
    pub fn new(ranker: Ranker, validator: UrlValidator, selector: UrlSelector, config: EngineConfig) -> Self {
        Self { ranker, validator, selector, config }
    }

    /// Build every component from one checked config.
    pub fn from_config(config: &RefineConfig, llm: Arc<dyn LLMProvider>) -> Result<Self, RefineError> {
        let ranker = Ranker::new(llm, config.ranking.clone(), config.llm.timeout())
            .with_pricing(config.llm.pricing);
        let validator = UrlValidator::new(config.validation.clone())?;
        let selector = UrlSelector::new(config.selection.clone());
        Ok(Self::new(ranker, validator, selector, config.engine.clone()))
    }

    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.ranker = self.ranker.with_search(search);
        self
    }

    pub async fn refine_urls(
        &self,
        reference: &Reference,
        candidates: &[SearchCandidate],
    ) -> Result<RefineOutcome, RefineError> {
        self.refine_urls_with_cancel(reference, candidates, &CancellationToken::new()).await
    }

    pub async fn refine_urls_with_cancel(
        &self,
        reference: &Reference,
        candidates: &[SearchCandidate],
        token: &CancellationToken,
    ) -> Result<RefineOutcome, RefineError> {
        if candidates.is_empty() {
            debug!(reference = %reference.label(), "No candidates to refine");
            return Ok(RefineOutcome::empty());
        }
        if token.is_cancelled() {
            return Err(RefineError::Cancelled);
        }

        let ranking = tokio::select! {
            outcome = self.ranker.rank_candidates(reference, candidates) => outcome?,
            _ = token.cancelled() => return Err(RefineError::Cancelled),
        };
        let usage = ranking.usage;
        let search_rounds = ranking.search_rounds;
        let mut rankings = ranking.into_results()?;

        let urls = validation_set(&rankings, self.config.validate_top_n);
        let results = self
            .validator
            .validate_batch_with_cancel(&urls, self.validator.config().max_concurrent, token)
            .await?;
        merge_validation(&mut rankings, &results);

        let checked: Vec<RankingResult> = rankings.iter().filter(|r| r.valid().is_some()).cloned().collect();
        let selection = self.selector.select_urls(&checked);

        let stats = RefineStats {
            total_candidates: candidates.len(),
            ranked_candidates: rankings.len(),
            validated_candidates: results.len(),
            valid_candidates: results.iter().filter(|r| r.valid).count(),
            invalid_candidates: results.iter().filter(|r| !r.valid).count(),
            hard_failures: results.iter().filter(|r| r.is_hard_failure()).count(),
            soft_failures: results.iter().filter(|r| r.is_soft_failure()).count(),
            search_rounds,
        };

        info!(
            reference = %reference.label(),
            candidates = stats.total_candidates,
            validated = stats.validated_candidates,
            valid = stats.valid_candidates,
            primary = selection.primary.as_ref().map(|s| s.url.as_str()).unwrap_or("-"),
            secondary = selection.secondary.as_ref().map(|s| s.url.as_str()).unwrap_or("-"),
            needs_review = selection.needs_review,
            cost_usd = usage.cost_usd,
            "Refinement complete"
        );

        Ok(RefineOutcome { selection, rankings, stats, usage, refined_at: Utc::now() })
    }
}

/// Distinct URLs of the `top_n` rankings by their stronger role score, so a
/// strong Secondary is validated even when its primary score is low.
fn validation_set(rankings: &[RankingResult], top_n: usize) -> Vec<String> {
    let mut order: Vec<&RankingResult> = rankings.iter().collect();
    order.sort_by(|a, b| b.best_score().cmp(&a.best_score()));

    let mut seen = HashSet::new();
    order
        .into_iter()
        .filter(|r| seen.insert(r.url.as_str()))
        .take(top_n)
        .map(|r| r.url.clone())
        .collect()
}

/// Rankings outside the validated set keep `NotValidated`.
fn merge_validation(rankings: &mut [RankingResult], results: &[ValidationResult]) {
    let by_url: HashMap<&str, &ValidationResult> = results.iter().map(|r| (r.url.as_str(), r)).collect();
    for ranking in rankings.iter_mut() {
        if let Some(result) = by_url.get(ranking.url.as_str()) {
            ranking.apply_validation(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use crate::config::{RankingConfig, ValidationConfig};
    use crate::llm::{LLMResponse, ToolSpec};
    use mockito::Server;

    struct FixedLLM {
        reply: Mutex<Option<String>>,
        calls: AtomicUsize,
    }

    impl FixedLLM {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self { reply: Mutex::new(Some(reply.to_string())), calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl LLMProvider for FixedLLM {
        async fn complete_with_tools(&self, _prompt: &str, _system: Option<&str>, _tools: &[ToolSpec]) -> Result<LLMResponse, RefineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.reply.lock().unwrap().clone().unwrap_or_default();
            Ok(LLMResponse::text(&reply, "fixed-1"))
        }
        fn provider_name(&self) -> &str { "fixed" }
        fn model_name(&self) -> &str { "fixed-1" }
    }

    fn config() -> RefineConfig {
        RefineConfig {
            ranking: RankingConfig { retry_delay_ms: 0, ..Default::default() },
            validation: ValidationConfig { request_delay_ms: 0, content_scan: false, ..Default::default() },
            ..Default::default()
        }
    }

    fn reference() -> Reference {
        Reference::new("Ursula K. Le Guin", "The Carrier Bag Theory of Fiction", Some("1986"))
    }

    #[tokio::test]
    async fn test_empty_candidates_makes_no_calls() {
        let llm = FixedLLM::new("1|90|10|a|b|yes|yes|primary");
        let engine = RefinementEngine::from_config(&config(), llm.clone()).unwrap();
        let outcome = engine.refine_urls(&reference(), &[]).await.unwrap();

        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
        assert!(outcome.selection.needs_review);
        assert!(!outcome.selection.high_confidence);
        assert_eq!(outcome.stats, RefineStats::default());
        assert_eq!(outcome.usage.calls, 0);
    }

    #[tokio::test]
    async fn test_dead_best_primary_falls_to_next() {
        let mut server = Server::new_async().await;
        let _dead = server.mock("HEAD", "/dead").with_status(404).create_async().await;
        let _live = server.mock("HEAD", "/live").with_status(200).create_async().await;
        let _review = server.mock("HEAD", "/review").with_status(200).create_async().await;

        let candidates = vec![
            SearchCandidate::new(&format!("{}/dead", server.url()), "Full text", "", "q"),
            SearchCandidate::new(&format!("{}/live", server.url()), "Author copy", "", "q"),
            SearchCandidate::new(&format!("{}/review", server.url()), "Review", "", "q"),
        ];
        let llm = FixedLLM::new("1|97|5|publisher|no|yes|yes|primary\n2|82|10|author copy|no|yes|yes|primary\n3|15|88|no|review|yes|yes|secondary");
        let engine = RefinementEngine::from_config(&config(), llm).unwrap();
        let outcome = engine.refine_urls(&reference(), &candidates).await.unwrap();

        let primary = outcome.selection.primary.as_ref().unwrap();
        assert!(primary.url.ends_with("/live"));
        assert!(outcome.selection.secondary.as_ref().unwrap().url.ends_with("/review"));

        assert_eq!(outcome.rankings[0].valid(), Some(false));
        assert_eq!(outcome.rankings[0].validation_reason(), Some("HTTP 404"));
        assert_eq!(outcome.stats.total_candidates, 3);
        assert_eq!(outcome.stats.validated_candidates, 3);
        assert_eq!(outcome.stats.valid_candidates, 2);
        assert_eq!(outcome.stats.hard_failures, 1);
        assert_eq!(outcome.stats.soft_failures, 0);
        assert_eq!(outcome.usage.calls, 1);
    }

    #[tokio::test]
    async fn test_only_top_n_validated() {
        let mut server = Server::new_async().await;
        let mock = server.mock("HEAD", mockito::Matcher::Any).with_status(200).expect(2).create_async().await;

        let candidates: Vec<SearchCandidate> = (1..=4)
            .map(|i| SearchCandidate::new(&format!("{}/c{}", server.url(), i), "t", "", "q"))
            .collect();
        // Candidate 4 is a strong secondary with a weak primary score.
        let llm = FixedLLM::new("1|80|5|a|b|yes|yes|primary\n2|30|5|a|b|no|no|neither\n3|20|5|a|b|no|no|neither\n4|10|90|a|b|yes|yes|secondary");
        let mut cfg = config();
        cfg.engine.validate_top_n = 2;
        let engine = RefinementEngine::from_config(&cfg, llm).unwrap();
        let outcome = engine.refine_urls(&reference(), &candidates).await.unwrap();

        mock.assert_async().await;
        let validated: Vec<&str> = outcome
            .rankings
            .iter()
            .filter(|r| r.valid().is_some())
            .map(|r| r.url.as_str())
            .collect();
        assert_eq!(validated.len(), 2);
        assert!(validated.iter().any(|u| u.ends_with("/c1")));
        assert!(validated.iter().any(|u| u.ends_with("/c4")));
        assert_eq!(outcome.stats.ranked_candidates, 4);
        assert_eq!(outcome.stats.validated_candidates, 2);
    }

    #[tokio::test]
    async fn test_unvalidated_candidate_never_selected() {
        let mut server = Server::new_async().await;
        let mock = server.mock("HEAD", "/review").with_status(200).expect(1).create_async().await;

        let candidates = vec![
            SearchCandidate::new(&format!("{}/review", server.url()), "Review", "", "q"),
            SearchCandidate::new(&format!("{}/full", server.url()), "Full text", "", "q"),
        ];
        let llm = FixedLLM::new("1|20|90|no|review|yes|yes|secondary\n2|85|5|full text|no|yes|yes|primary");
        let mut cfg = config();
        cfg.engine.validate_top_n = 1;
        cfg.selection.require_validation = false;
        let engine = RefinementEngine::from_config(&cfg, llm).unwrap();
        let outcome = engine.refine_urls(&reference(), &candidates).await.unwrap();

        mock.assert_async().await;
        assert!(outcome.selection.primary.is_none());
        assert!(outcome.selection.secondary.unwrap().url.ends_with("/review"));
        assert_eq!(outcome.rankings.len(), 2);
    }

    #[tokio::test]
    async fn test_unparseable_ranking_is_error() {
        let llm = FixedLLM::new("I am not able to assess these links.");
        let engine = RefinementEngine::from_config(&config(), llm).unwrap();
        let candidates = vec![SearchCandidate::new("http://127.0.0.1:1/x", "x", "", "q")];
        let err = engine.refine_urls(&reference(), &candidates).await.unwrap_err();
        match err {
            RefineError::UnparseableRanking { raw } => assert!(raw.contains("not able")),
            other => panic!("expected unparseable ranking, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let llm = FixedLLM::new("1|90|10|a|b|yes|yes|primary");
        let engine = RefinementEngine::from_config(&config(), llm.clone()).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let candidates = vec![SearchCandidate::new("http://127.0.0.1:1/x", "x", "", "q")];

        let err = engine.refine_urls_with_cancel(&reference(), &candidates, &token).await.unwrap_err();
        assert!(matches!(err, RefineError::Cancelled));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_validation_set_dedupes_urls() {
        let make = |url: &str, p: u8, s: u8| RankingResult {
            url: url.into(),
            title: String::new(),
            primary_score: p,
            secondary_score: s,
            primary_reason: String::new(),
            secondary_reason: String::new(),
            recommendation: crate::models::Recommendation::from_scores(p, s),
            title_match: None,
            author_match: None,
            validation: Default::default(),
        };
        let rankings = vec![make("a", 90, 0), make("a", 85, 0), make("b", 10, 80), make("c", 5, 5)];
        assert_eq!(validation_set(&rankings, 3), vec!["a", "b", "c"]);
        assert_eq!(validation_set(&rankings, 1), vec!["a"]);
    }
}
