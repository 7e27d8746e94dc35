//! AI ranking of candidate URLs for the Primary and Secondary roles.

pub mod parser;
pub mod prompt;
pub mod search;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use crate::config::{Pricing, RankingConfig};
use crate::errors::{with_retry, RefineError, RetryConfig};
use crate::llm::{LLMProvider, LLMResponse, ToolCall, ToolSpec};
use crate::models::{
    RankingResult, Recommendation, Reference, SearchCandidate, UsageStats, ValidationState,
};
use crate::utils::truncation::truncate_chars;
pub use parser::{parse_response, ParsedResponse, ResponseFormat, ScoreRow};
pub use search::SearchProvider;
use tracing::{debug, info, warn};

const NO_SCORE_REASON: &str = "no score returned";

#[derive(Debug, Clone)]
pub enum RankingStatus {
    Ranked {
        results: Vec<RankingResult>,
        format: ResponseFormat,
    },
    /// The service answered, but in neither supported representation.
    Unparseable { raw: String },
    /// The service kept asking for searches past the allowed rounds.
    Exhausted,
}

/// Everything one `rank_candidates` call produced, including its usage.
#[derive(Debug, Clone)]
pub struct RankingOutcome {
    pub status: RankingStatus,
    pub usage: UsageStats,
    /// Candidate list as last shown to the service, including any added by
    /// search rounds.
    pub candidates: Vec<SearchCandidate>,
    pub search_rounds: u32,
}

impl RankingOutcome {
    /// Ranked results, or the structured error for the other outcomes.
    pub fn into_results(self) -> Result<Vec<RankingResult>, RefineError> {
        match self.status {
            RankingStatus::Ranked { results, .. } => Ok(results),
            RankingStatus::Unparseable { raw } => Err(RefineError::UnparseableRanking { raw }),
            RankingStatus::Exhausted => Err(RefineError::SearchRoundsExhausted { rounds: self.search_rounds }),
        }
    }
}

pub struct Ranker {
    llm: Arc<dyn LLMProvider>,
    search: Option<Arc<dyn SearchProvider>>,
    config: RankingConfig,
    retry: RetryConfig,
    timeout: Duration,
    pricing: Option<Pricing>,
}

impl Ranker {
    pub fn new(llm: Arc<dyn LLMProvider>, config: RankingConfig, timeout: Duration) -> Self {
        let retry = config.retry_config();
        Self {
            llm,
            search: None,
            config,
            retry,
            timeout,
            pricing: None,
        }
    }

    /// Attach the collaborator used for tool-requested searches.
    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    /// Per-token pricing for providers that report no cost.
    pub fn with_pricing(mut self, pricing: Option<Pricing>) -> Self {
        self.pricing = pricing;
        self
    }

    /// Score every candidate. Service failures that survive the retry bound
    /// are returned as errors; judgment failures are reported in the outcome.
    pub async fn rank_candidates(
        &self,
        reference: &Reference,
        candidates: &[SearchCandidate],
    ) -> Result<RankingOutcome, RefineError> {
        let mut candidates = candidates.to_vec();
        let mut usage = UsageStats::default();
        let mut rounds = 0u32;

        let search_enabled = self.search.is_some()
            && self.config.max_search_rounds > 0
            && candidates.len() < self.config.tool_disable_threshold;
        let tools = if search_enabled { vec![prompt::search_tool()] } else { Vec::new() };

        loop {
            let request = prompt::build_prompt(reference, &candidates, search_enabled);
            let response = self.call(&request, &tools).await?;
            self.record_usage(&mut usage, &response);

            let queries = if response.wants_tool() { search_queries(&response.tool_calls) } else { Vec::new() };
            if search_enabled && !queries.is_empty() {
                if rounds >= self.config.max_search_rounds {
                    warn!(reference = %reference.label(), rounds, "Search rounds exhausted");
                    return Ok(RankingOutcome {
                        status: RankingStatus::Exhausted,
                        usage,
                        candidates,
                        search_rounds: rounds,
                    });
                }
                rounds += 1;
                let added = self.run_searches(&queries, &mut candidates).await;
                info!(reference = %reference.label(), round = rounds, added, total = candidates.len(), "Search round");
                continue;
            }

            let parsed = parse_response(&response.content);
            let status = match parsed.format() {
                Some(format) => RankingStatus::Ranked { results: merge_rows(&candidates, parsed.into_rows()), format },
                None => {
                    warn!(
                        reference = %reference.label(),
                        raw = %truncate_chars(&response.content, 500),
                        "Ranking response unparseable"
                    );
                    RankingStatus::Unparseable { raw: response.content }
                }
            };

            return Ok(RankingOutcome { status, usage, candidates, search_rounds: rounds });
        }
    }

    async fn call(&self, request: &str, tools: &[ToolSpec]) -> Result<LLMResponse, RefineError> {
        let llm = &self.llm;
        let timeout = self.timeout;
        with_retry("rank_candidates", &self.retry, || async move {
            match tokio::time::timeout(timeout, llm.complete_with_tools(request, Some(prompt::SYSTEM_PROMPT), tools)).await {
                Ok(result) => result,
                Err(_) => Err(RefineError::Timeout(format!(
                    "{} ranking call exceeded {}s", llm.provider_name(), timeout.as_secs()
                ))),
            }
        }).await
    }

    fn record_usage(&self, usage: &mut UsageStats, response: &LLMResponse) {
        let input = response.input_tokens.unwrap_or(0);
        let output = response.output_tokens.unwrap_or(0);
        let cost = match (response.cost_usd, &self.pricing) {
            (Some(cost), _) => cost,
            (None, Some(pricing)) => pricing.estimate(input, output),
            (None, None) => 0.0,
        };
        usage.merge(&UsageStats { calls: 1, input_tokens: input, output_tokens: output, cost_usd: cost });
        debug!(model = %response.model, input_tokens = input, output_tokens = output, cost_usd = cost, "Ranking call");
    }

    /// Run each query and append unseen URLs. Search errors only cost the
    /// round; ranking proceeds with what is already known.
    async fn run_searches(&self, queries: &[String], candidates: &mut Vec<SearchCandidate>) -> usize {
        let Some(search) = &self.search else {
            return 0;
        };
        let mut seen: HashSet<String> = candidates.iter().map(|c| c.url.clone()).collect();
        let mut added = 0;
        for query in queries {
            match search.search(query).await {
                Ok(found) => {
                    for c in found {
                        if seen.insert(c.url.clone()) {
                            candidates.push(c);
                            added += 1;
                        }
                    }
                }
                Err(e) => warn!(query = %query, error = %e, "Tool search failed"),
            }
        }
        added
    }
}

fn search_queries(calls: &[ToolCall]) -> Vec<String> {
    calls
        .iter()
        .filter(|c| c.name == prompt::SEARCH_TOOL_NAME)
        .filter_map(|c| c.input["query"].as_str())
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .collect()
}

/// Attach rows to candidates by 1-based index. Candidates without a row are
/// kept with zero scores so nothing disappears from the audit trail.
fn merge_rows(candidates: &[SearchCandidate], rows: Vec<ScoreRow>) -> Vec<RankingResult> {
    let mut by_index: HashMap<usize, ScoreRow> = HashMap::new();
    for row in rows {
        if row.index == 0 || row.index > candidates.len() {
            warn!(index = row.index, candidates = candidates.len(), "Ignoring score row for unknown candidate");
            continue;
        }
        by_index.entry(row.index).or_insert(row);
    }

    let mut results: Vec<RankingResult> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| match by_index.remove(&(i + 1)) {
            Some(row) => RankingResult {
                url: c.url.clone(),
                title: c.title.clone(),
                primary_score: row.primary,
                secondary_score: row.secondary,
                recommendation: row
                    .recommendation
                    .unwrap_or_else(|| Recommendation::from_scores(row.primary, row.secondary)),
                primary_reason: row.primary_reason,
                secondary_reason: row.secondary_reason,
                title_match: row.title_match,
                author_match: row.author_match,
                validation: ValidationState::NotValidated,
            },
            None => {
                debug!(url = %c.url, "Candidate missing from ranking response");
                RankingResult {
                    url: c.url.clone(),
                    title: c.title.clone(),
                    primary_score: 0,
                    secondary_score: 0,
                    primary_reason: NO_SCORE_REASON.to_string(),
                    secondary_reason: NO_SCORE_REASON.to_string(),
                    recommendation: Recommendation::Neither,
                    title_match: None,
                    author_match: None,
                    validation: ValidationState::NotValidated,
                }
            }
        })
        .collect();

    results.sort_by(|a, b| b.primary_score.cmp(&a.primary_score));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Replays scripted replies; records prompts and whether tools were offered.
    struct ScriptedLLM {
        replies: Mutex<VecDeque<Result<LLMResponse, RefineError>>>,
        prompts: Mutex<Vec<(String, bool)>>,
    }

    impl ScriptedLLM {
        fn new(replies: Vec<Result<LLMResponse, RefineError>>) -> Arc<Self> {
            Arc::new(Self { replies: Mutex::new(replies.into()), prompts: Mutex::new(Vec::new()) })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedLLM {
        async fn complete_with_tools(&self, prompt: &str, _system: Option<&str>, tools: &[ToolSpec]) -> Result<LLMResponse, RefineError> {
            self.prompts.lock().unwrap().push((prompt.to_string(), !tools.is_empty()));
            self.replies.lock().unwrap().pop_front()
                .unwrap_or_else(|| Err(RefineError::Internal("script exhausted".into())))
        }
        fn provider_name(&self) -> &str { "scripted" }
        fn model_name(&self) -> &str { "scripted-1" }
    }

    struct FixedSearch {
        results: Vec<SearchCandidate>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl SearchProvider for FixedSearch {
        async fn search(&self, _query: &str) -> Result<Vec<SearchCandidate>, RefineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.results.clone())
        }
    }

    fn text(content: &str) -> Result<LLMResponse, RefineError> {
        let mut r = LLMResponse::text(content, "scripted-1");
        r.input_tokens = Some(100);
        r.output_tokens = Some(20);
        r.cost_usd = Some(0.001);
        Ok(r)
    }

    fn tool_request(query: &str) -> Result<LLMResponse, RefineError> {
        let mut r = LLMResponse::text("", "scripted-1");
        r.tool_calls.push(ToolCall { id: "t1".into(), name: "web_search".into(), input: json!({"query": query}) });
        Ok(r)
    }

    fn config() -> RankingConfig {
        RankingConfig { max_retries: 2, retry_delay_ms: 0, max_search_rounds: 2, tool_disable_threshold: 15 }
    }

    fn reference() -> Reference {
        Reference::new("Walter J. Ong", "Orality and Literacy", Some("1982"))
    }

    fn candidates() -> Vec<SearchCandidate> {
        vec![
            SearchCandidate::new("https://a.test/review", "A review", "", "q"),
            SearchCandidate::new("https://b.test/ong.pdf", "Orality and Literacy", "", "q"),
            SearchCandidate::new("https://c.test/other", "Unrelated", "", "q"),
        ]
    }

    #[tokio::test]
    async fn test_table_response_sorted_by_primary() {
        let llm = ScriptedLLM::new(vec![text("1|20|90|review|scholarly review|yes|yes|secondary\n2|95|10|full text|not review|yes|yes|primary\n3|5|5|wrong|wrong|no|no|neither")]);
        let ranker = Ranker::new(llm.clone(), config(), Duration::from_secs(5));
        let outcome = ranker.rank_candidates(&reference(), &candidates()).await.unwrap();

        assert_eq!(outcome.usage.calls, 1);
        assert_eq!(outcome.usage.input_tokens, 100);
        assert!((outcome.usage.cost_usd - 0.001).abs() < 1e-12);
        let RankingStatus::Ranked { results, format } = outcome.status else { panic!("expected ranked") };
        assert_eq!(format, ResponseFormat::Table);
        let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://b.test/ong.pdf", "https://a.test/review", "https://c.test/other"]);
        assert!(results.iter().all(|r| r.valid().is_none()));
    }

    #[tokio::test]
    async fn test_missing_rows_kept_with_zero_scores() {
        let llm = ScriptedLLM::new(vec![text(r#"[{"index": 2, "primary": 88, "secondary": 12}, {"index": 9, "primary": 99, "secondary": 1}]"#)]);
        let ranker = Ranker::new(llm, config(), Duration::from_secs(5));
        let results = ranker.rank_candidates(&reference(), &candidates()).await.unwrap().into_results().unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].url, "https://b.test/ong.pdf");
        assert_eq!(results[0].recommendation, Recommendation::Primary);
        let missing: Vec<&RankingResult> = results.iter().filter(|r| r.primary_reason == NO_SCORE_REASON).collect();
        assert_eq!(missing.len(), 2);
        assert!(missing.iter().all(|r| r.primary_score == 0 && r.recommendation == Recommendation::Neither));
    }

    #[tokio::test]
    async fn test_unparseable_carries_raw_response() {
        let llm = ScriptedLLM::new(vec![text("Sorry, I cannot judge these.")]);
        let ranker = Ranker::new(llm, config(), Duration::from_secs(5));
        let outcome = ranker.rank_candidates(&reference(), &candidates()).await.unwrap();
        assert_eq!(outcome.usage.calls, 1);
        match outcome.into_results() {
            Err(RefineError::UnparseableRanking { raw }) => assert_eq!(raw, "Sorry, I cannot judge these."),
            other => panic!("expected unparseable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_failures_retried_with_same_prompt() {
        let llm = ScriptedLLM::new(vec![
            Err(RefineError::Network("reset".into())),
            Err(RefineError::Timeout("slow".into())),
            text("1|90|10|a|b|yes|yes|primary"),
        ]);
        let ranker = Ranker::new(llm.clone(), config(), Duration::from_secs(5));
        let outcome = ranker.rank_candidates(&reference(), &candidates()).await.unwrap();
        assert!(matches!(outcome.status, RankingStatus::Ranked { .. }));

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 3);
        assert_eq!(prompts[0].0, prompts[2].0);
        assert_eq!(outcome.usage.calls, 1);
    }

    #[tokio::test]
    async fn test_retries_exhausted_surface_error() {
        let llm = ScriptedLLM::new(vec![
            Err(RefineError::Network("down".into())),
            Err(RefineError::Network("down".into())),
            Err(RefineError::Network("down".into())),
        ]);
        let ranker = Ranker::new(llm.clone(), config(), Duration::from_secs(5));
        let err = ranker.rank_candidates(&reference(), &candidates()).await.unwrap_err();
        assert!(matches!(err, RefineError::Network(_)));
        assert_eq!(llm.calls(), 3);
    }

    #[tokio::test]
    async fn test_search_round_appends_candidates_and_reprompts() {
        let llm = ScriptedLLM::new(vec![
            tool_request("Ong Orality and Literacy full text"),
            text("4|93|5|full text|not review|yes|yes|primary"),
        ]);
        let search = Arc::new(FixedSearch {
            results: vec![
                SearchCandidate::new("https://b.test/ong.pdf", "duplicate", "", "tool"),
                SearchCandidate::new("https://d.test/ong", "Orality and Literacy - archive", "", "tool"),
            ],
            calls: AtomicU32::new(0),
        });
        let ranker = Ranker::new(llm.clone(), config(), Duration::from_secs(5)).with_search(search.clone());
        let outcome = ranker.rank_candidates(&reference(), &candidates()).await.unwrap();

        assert_eq!(outcome.search_rounds, 1);
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.candidates.len(), 4);
        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].1, "tools offered");
        assert!(prompts[1].0.contains("CANDIDATES (4)"));
        drop(prompts);

        let results = outcome.into_results().unwrap();
        assert_eq!(results[0].url, "https://d.test/ong");
    }

    #[tokio::test]
    async fn test_search_rounds_bounded() {
        let llm = ScriptedLLM::new(vec![tool_request("q1"), tool_request("q2"), tool_request("q3")]);
        let search = Arc::new(FixedSearch { results: vec![], calls: AtomicU32::new(0) });
        let ranker = Ranker::new(llm.clone(), config(), Duration::from_secs(5)).with_search(search);
        let outcome = ranker.rank_candidates(&reference(), &candidates()).await.unwrap();

        assert!(matches!(outcome.status, RankingStatus::Exhausted));
        assert_eq!(outcome.search_rounds, 2);
        assert_eq!(outcome.usage.calls, 3);
        assert!(matches!(outcome.into_results(), Err(RefineError::SearchRoundsExhausted { rounds: 2 })));
    }

    #[tokio::test]
    async fn test_tools_disabled_for_large_candidate_sets() {
        let many: Vec<SearchCandidate> = (0..15)
            .map(|i| SearchCandidate::new(&format!("https://x.test/{}", i), "t", "", "q"))
            .collect();
        let llm = ScriptedLLM::new(vec![text("1|80|10|a|b|yes|yes|primary")]);
        let search = Arc::new(FixedSearch { results: vec![], calls: AtomicU32::new(0) });
        let ranker = Ranker::new(llm.clone(), config(), Duration::from_secs(5)).with_search(search);
        ranker.rank_candidates(&reference(), &many).await.unwrap();

        let prompts = llm.prompts.lock().unwrap();
        assert!(!prompts[0].1, "tools must not be offered");
    }

    #[tokio::test]
    async fn test_configured_pricing_used_when_provider_reports_no_cost() {
        let mut unpriced = LLMResponse::text("1|80|10|a|b|yes|yes|primary", "scripted-1");
        unpriced.input_tokens = Some(100);
        let llm = ScriptedLLM::new(vec![Ok(unpriced)]);
        let pricing = Pricing { input_per_mtok: 1_000_000.0, output_per_mtok: 0.0 };
        let ranker = Ranker::new(llm, config(), Duration::from_secs(5)).with_pricing(Some(pricing));
        let outcome = ranker.rank_candidates(&reference(), &candidates()).await.unwrap();
        assert!((outcome.usage.cost_usd - 100.0).abs() < 1e-9);

        // Provider-reported cost wins over configured pricing.
        let llm = ScriptedLLM::new(vec![text("1|80|10|a|b|yes|yes|primary")]);
        let ranker = Ranker::new(llm, config(), Duration::from_secs(5)).with_pricing(Some(pricing));
        let outcome = ranker.rank_candidates(&reference(), &candidates()).await.unwrap();
        assert!((outcome.usage.cost_usd - 0.001).abs() < 1e-12);
    }
}
