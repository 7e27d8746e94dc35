use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use crate::errors::RefineError;
use super::provider::{send_error, status_error, LLMProvider};
use super::types::{LLMResponse, ToolCall, ToolSpec};
use tracing::debug;

/// Chat Completions client. Also serves any OpenAI-compatible endpoint
/// (local servers, gateways) through `with_base_url`.
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
}

impl OpenAIProvider {
    pub fn new(api_key: &str, model: Option<&str>) -> Self {
        Self::with_base_url(api_key, model, "https://api.openai.com/v1")
    }

    pub fn with_base_url(api_key: &str, model: Option<&str>, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.unwrap_or("gpt-4o").to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            max_tokens: 4096,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn complete_with_tools(
        &self,
        prompt: &str,
        system: Option<&str>,
        tools: &[ToolSpec],
    ) -> Result<LLMResponse, RefineError> {
        let mut messages = Vec::new();
        if let Some(sys) = system {
            messages.push(json!({"role": "system", "content": sys}));
        }
        messages.push(json!({"role": "user", "content": prompt}));

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": self.max_tokens,
        });
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools.iter().map(|t| json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.input_schema,
                }
            })).collect());
        }

        let mut request = self.client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if !self.api_key.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.api_key));
        }
        let resp = request.send().await.map_err(|e| send_error("OpenAI", e))?;

        if let Some(err) = status_error("OpenAI", resp.status()) {
            return Err(err);
        }

        let data: Value = resp.json().await
            .map_err(|e| RefineError::LLMApi(format!("Failed to parse OpenAI response: {}", e)))?;

        if let Some(error) = data.get("error") {
            return Err(RefineError::LLMApi(error["message"].as_str().unwrap_or("Unknown").to_string()));
        }

        let message = &data["choices"][0]["message"];
        if message.is_null() {
            return Err(RefineError::LLMApi("No choices in OpenAI response".into()));
        }
        let content = message["content"].as_str().unwrap_or_default().to_string();

        let tool_calls = message["tool_calls"].as_array()
            .map(|calls| calls.iter().map(|call| {
                let arguments = call["function"]["arguments"].as_str().unwrap_or("{}");
                ToolCall {
                    id: call["id"].as_str().unwrap_or_default().to_string(),
                    name: call["function"]["name"].as_str().unwrap_or_default().to_string(),
                    input: serde_json::from_str(arguments).unwrap_or(Value::Null),
                }
            }).collect())
            .unwrap_or_default();

        let input_tokens = data["usage"]["prompt_tokens"].as_u64();
        let output_tokens = data["usage"]["completion_tokens"].as_u64();

        debug!(model = %self.model, input_tokens, output_tokens, "OpenAI completion");

        Ok(LLMResponse {
            content,
            input_tokens,
            output_tokens,
            cost_usd: None,
            model: self.model.clone(),
            tool_calls,
        })
    }

    fn provider_name(&self) -> &str { "openai" }
    fn model_name(&self) -> &str { &self.model }
}
