use std::sync::Arc;
use std::time::Instant;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use refurl::config::credentials::resolve_api_key_from_env;
use refurl::errors::RefineError;
use refurl::llm::{create_provider, LLMProvider};
use refurl::models::{Reference, SearchCandidate};
use refurl::RefinementEngine;
use crate::cli::commands::RefineArgs;
use tracing::{info, warn};

/// Shape of the `--input` file.
#[derive(Debug, Deserialize)]
struct RefineInput {
    reference: Reference,
    #[serde(default)]
    candidates: Vec<SearchCandidate>,
}

pub async fn handle_refine(args: RefineArgs) -> Result<(), RefineError> {
    let raw = tokio::fs::read_to_string(&args.input).await?;
    let input: RefineInput = serde_json::from_str(&raw)?;

    let mut config = super::load_config(args.config.as_deref()).await?;
    if let Some(provider) = args.provider {
        config.llm.provider = provider;
    }
    if let Some(model) = args.model {
        config.llm.model = Some(model);
    }
    if let Some(url) = args.base_url {
        config.llm.base_url = Some(url);
    }

    let api_key = args
        .api_key
        .or_else(|| config.llm.api_key.clone())
        .or_else(|| resolve_api_key_from_env(&config.llm.provider))
        .unwrap_or_default();
    let llm: Arc<dyn LLMProvider> = Arc::from(create_provider(&config.llm, &api_key)?);
    info!(provider = llm.provider_name(), model = llm.model_name(), "Using LLM");

    let engine = RefinementEngine::from_config(&config, llm)?;

    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling refinement");
            on_interrupt.cancel();
        }
    });

    let started = Instant::now();
    let outcome = engine
        .refine_urls_with_cancel(&input.reference, &input.candidates, &token)
        .await?;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let json = serde_json::to_string_pretty(&outcome)?;
    if let Some(path) = &args.output {
        tokio::fs::write(path, &json).await?;
        info!(path = %path, "Wrote outcome");
    }
    if args.json {
        println!("{}", json);
    } else {
        println!("{}", super::render::render_outcome(&outcome, elapsed_ms));
    }
    Ok(())
}
