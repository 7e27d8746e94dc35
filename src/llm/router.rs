use crate::config::LLMConfig;
use crate::errors::RefineError;
use super::provider::LLMProvider;
use super::anthropic::AnthropicProvider;
use super::openai::OpenAIProvider;

pub fn create_provider(
    config: &LLMConfig,
    api_key: &str,
) -> Result<Box<dyn LLMProvider>, RefineError> {
    let model = config.model.as_deref();

    match config.provider.as_str() {
        "anthropic" => {
            require_key(&config.provider, api_key)?;
            let mut provider = AnthropicProvider::new(api_key, model).with_max_tokens(config.max_tokens);
            if let Some(url) = &config.base_url {
                provider = provider.with_base_url(url);
            }
            Ok(Box::new(provider))
        }
        "openai" => {
            require_key(&config.provider, api_key)?;
            let provider = match &config.base_url {
                Some(url) => OpenAIProvider::with_base_url(api_key, model, url),
                None => OpenAIProvider::new(api_key, model),
            };
            Ok(Box::new(provider.with_max_tokens(config.max_tokens)))
        }
        "openai_compatible" | "local" => {
            let url = config.base_url.as_deref().ok_or_else(|| RefineError::Config(format!(
                "Provider '{}' requires llm.base_url", config.provider
            )))?;
            Ok(Box::new(OpenAIProvider::with_base_url(api_key, model, url).with_max_tokens(config.max_tokens)))
        }
        other => Err(RefineError::Config(format!("Unknown LLM provider: {}", other))),
    }
}

fn require_key(provider: &str, api_key: &str) -> Result<(), RefineError> {
    if api_key.is_empty() {
        return Err(RefineError::Config(format!("No API key configured for provider '{}'", provider)));
    }
    Ok(())
}
