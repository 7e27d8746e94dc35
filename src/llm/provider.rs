use async_trait::async_trait;
use crate::errors::RefineError;
use super::types::{LLMResponse, ToolSpec};

#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Free-form text completion
    async fn complete(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<LLMResponse, RefineError> {
        self.complete_with_tools(prompt, system, &[]).await
    }

    /// Completion that may answer with tool calls. An empty `tools` slice
    /// must behave exactly like `complete`.
    async fn complete_with_tools(
        &self,
        prompt: &str,
        system: Option<&str>,
        tools: &[ToolSpec],
    ) -> Result<LLMResponse, RefineError>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;

    /// Model identifier
    fn model_name(&self) -> &str;
}

/// Map a failed send into the retry taxonomy.
pub(crate) fn send_error(provider: &str, e: reqwest::Error) -> RefineError {
    if e.is_timeout() {
        RefineError::Timeout(format!("{} request timed out: {}", provider, e))
    } else {
        RefineError::Network(format!("{} request failed: {}", provider, e))
    }
}

/// Map a non-success status into the retry taxonomy. `None` means the body
/// should be inspected as usual.
pub(crate) fn status_error(provider: &str, status: reqwest::StatusCode) -> Option<RefineError> {
    match status.as_u16() {
        429 => Some(RefineError::RateLimit(format!("{} rate limit exceeded", provider))),
        401 | 403 => Some(RefineError::Authentication(format!("Invalid {} API key", provider))),
        s if s >= 500 => Some(RefineError::LLMApi(format!("{} returned HTTP {}", provider, s))),
        _ => None,
    }
}
