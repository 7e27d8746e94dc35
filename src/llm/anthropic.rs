use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use crate::errors::RefineError;
use super::provider::{send_error, status_error, LLMProvider};
use super::types::{LLMResponse, ToolCall, ToolSpec};
use tracing::debug;

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
}

impl AnthropicProvider {
    pub fn new(api_key: &str, model: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.unwrap_or("claude-sonnet-4-5-20250929").to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 4096,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    async fn complete_with_tools(
        &self,
        prompt: &str,
        system: Option<&str>,
        tools: &[ToolSpec],
    ) -> Result<LLMResponse, RefineError> {
        let mut body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{"role": "user", "content": prompt}]
        });

        if let Some(sys) = system {
            body["system"] = json!(sys);
        }
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools.iter().map(|t| json!({
                "name": t.name,
                "description": t.description,
                "input_schema": t.input_schema,
            })).collect());
        }

        let resp = self.client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error("Anthropic", e))?;

        if let Some(err) = status_error("Anthropic", resp.status()) {
            return Err(err);
        }

        let data: Value = resp.json().await
            .map_err(|e| RefineError::LLMApi(format!("Failed to parse Anthropic response: {}", e)))?;

        if let Some(error) = data.get("error") {
            let msg = error["message"].as_str().unwrap_or("Unknown error");
            return Err(RefineError::LLMApi(msg.to_string()));
        }

        let blocks = data["content"].as_array()
            .ok_or_else(|| RefineError::LLMApi("No content in Anthropic response".into()))?;

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        for block in blocks {
            match block["type"].as_str() {
                Some("text") => content.push_str(block["text"].as_str().unwrap_or_default()),
                Some("tool_use") => tool_calls.push(ToolCall {
                    id: block["id"].as_str().unwrap_or_default().to_string(),
                    name: block["name"].as_str().unwrap_or_default().to_string(),
                    input: block["input"].clone(),
                }),
                _ => {}
            }
        }

        let input_tokens = data["usage"]["input_tokens"].as_u64();
        let output_tokens = data["usage"]["output_tokens"].as_u64();

        let cost_usd = match (input_tokens, output_tokens) {
            (Some(inp), Some(out)) => {
                // Claude Sonnet pricing approximation
                Some((inp as f64 * 3.0 / 1_000_000.0) + (out as f64 * 15.0 / 1_000_000.0))
            }
            _ => None,
        };

        debug!(model = %self.model, input_tokens, output_tokens, tool_calls = tool_calls.len(), "Anthropic completion");

        Ok(LLMResponse {
            content,
            input_tokens,
            output_tokens,
            cost_usd,
            model: self.model.clone(),
            tool_calls,
        })
    }

    fn provider_name(&self) -> &str { "anthropic" }
    fn model_name(&self) -> &str { &self.model }
}
