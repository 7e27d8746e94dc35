use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "llm": {
                "type": "object",
                "properties": {
                    "provider": { "type": "string", "enum": ["anthropic", "openai", "openai_compatible", "local"] },
                    "model": { "type": "string" },
                    "api_key": { "type": "string" },
                    "base_url": { "type": "string" },
                    "timeout_secs": { "type": "integer", "minimum": 1 },
                    "max_tokens": { "type": "integer", "minimum": 1 },
                    "pricing": {
                        "type": "object",
                        "required": ["input_per_mtok", "output_per_mtok"],
                        "properties": {
                            "input_per_mtok": { "type": "number", "minimum": 0 },
                            "output_per_mtok": { "type": "number", "minimum": 0 }
                        }
                    }
                }
            },
            "ranking": {
                "type": "object",
                "properties": {
                    "max_retries": { "type": "integer", "minimum": 0, "maximum": 5 },
                    "retry_delay_ms": { "type": "integer", "minimum": 0 },
                    "max_search_rounds": { "type": "integer", "minimum": 0, "maximum": 10 },
                    "tool_disable_threshold": { "type": "integer", "minimum": 0 }
                }
            },
            "validation": {
                "type": "object",
                "properties": {
                    "timeout_secs": { "type": "integer", "minimum": 1 },
                    "max_concurrent": { "type": "integer", "minimum": 1 },
                    "request_delay_ms": { "type": "integer", "minimum": 0 },
                    "content_scan": { "type": "boolean" },
                    "scan_prefix_bytes": { "type": "integer", "minimum": 0 },
                    "user_agent": { "type": "string" },
                    "pattern_file": { "type": "string" },
                    "reject_paywalls": { "type": "boolean" }
                }
            },
            "selection": {
                "type": "object",
                "properties": {
                    "primary_threshold": { "$ref": "#/$defs/score" },
                    "secondary_threshold": { "$ref": "#/$defs/score" },
                    "exclusivity_threshold": { "type": "integer", "minimum": 70, "maximum": 100 },
                    "confidence_threshold": { "type": "number", "minimum": 0, "maximum": 1 },
                    "require_validation": { "type": "boolean" }
                }
            },
            "engine": {
                "type": "object",
                "properties": {
                    "validate_top_n": { "type": "integer", "minimum": 1 }
                }
            }
        },
        "$defs": {
            "score": { "type": "integer", "minimum": 0, "maximum": 100 }
        }
    })
});
