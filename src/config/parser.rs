use std::path::Path;
use crate::errors::RefineError;
use super::types::RefineConfig;
use super::credentials::resolve_credential;
use super::schema::CONFIG_SCHEMA;
use tracing::{debug, warn};

pub async fn parse_config(path: &Path) -> Result<RefineConfig, RefineError> {
    if !path.exists() {
        return Err(RefineError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(RefineError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    let config = parse_config_str(&content)?;
    debug!(path = %path.display(), provider = %config.llm.provider, "Loaded configuration");
    Ok(config)
}

/// Parse, resolve credentials and range-check a YAML document.
pub fn parse_config_str(content: &str) -> Result<RefineConfig, RefineError> {
    let yaml: serde_yaml::Value = if content.trim().is_empty() {
        serde_yaml::Value::Mapping(Default::default())
    } else {
        serde_yaml::from_str(content)?
    };

    // JSON Schema validation
    validate_schema(&yaml)?;

    // Parse into typed config
    let mut config: RefineConfig = serde_yaml::from_value(yaml)?;

    if let Some(key) = config.llm.api_key.take() {
        config.llm.api_key = Some(resolve_credential(&key));
    }

    config.validate()?;
    Ok(config)
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), RefineError> {
    // Convert YAML value to JSON for schema validation
    let json_value = serde_json::to_value(yaml)
        .map_err(|e| RefineError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| RefineError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(&json_value);
    if let Err(errors) = result {
        // Advisory only; typed parsing and validate() are authoritative.
        for e in errors {
            warn!(validation_error = %e, path = %e.instance_path, "Config schema warning");
        }
    }

    Ok(())
}
