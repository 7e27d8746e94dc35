use super::types::RefineError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub retryable: bool,
}

impl RefineError {
    /// Classify this error to determine its type and whether it can be retried.
    ///
    /// Only transient service conditions are retryable. A response that came
    /// back but could not be parsed is a judgment failure, not a transport
    /// failure, and is surfaced immediately.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Retryable errors
            RefineError::RateLimit(_) => ErrorClassification {
                error_type: "RateLimitError",
                retryable: true,
            },
            RefineError::Network(_) => ErrorClassification {
                error_type: "NetworkError",
                retryable: true,
            },
            RefineError::Timeout(_) => ErrorClassification {
                error_type: "TimeoutError",
                retryable: true,
            },
            RefineError::LLMApi(_) => ErrorClassification {
                error_type: "LLMApiError",
                retryable: true,
            },

            // Non-retryable errors
            RefineError::Authentication(_) => ErrorClassification {
                error_type: "AuthenticationError",
                retryable: false,
            },
            RefineError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                retryable: false,
            },
            RefineError::UnparseableRanking { .. } => ErrorClassification {
                error_type: "UnparseableRankingError",
                retryable: false,
            },
            RefineError::SearchRoundsExhausted { .. } => ErrorClassification {
                error_type: "SearchRoundsExhaustedError",
                retryable: false,
            },
            RefineError::Search(_) => ErrorClassification {
                error_type: "SearchError",
                retryable: false,
            },
            RefineError::Cancelled => ErrorClassification {
                error_type: "CancelledError",
                retryable: false,
            },
            RefineError::Io(_) => ErrorClassification {
                error_type: "IoError",
                retryable: false,
            },
            RefineError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                retryable: false,
            },
            RefineError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                retryable: false,
            },
            RefineError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                retryable: false,
            },
        }
    }
}
