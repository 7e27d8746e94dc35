use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("LLM API error: {0}")]
    LLMApi(String),

    #[error("Rate limited: {0}")]
    RateLimit(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Ranking response could not be parsed ({} bytes of raw output)", raw.len())]
    UnparseableRanking { raw: String },

    #[error("Ranking gave up after {rounds} search rounds")]
    SearchRoundsExhausted { rounds: u32 },

    #[error("Search error: {0}")]
    Search(String),

    #[error("Refinement cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
