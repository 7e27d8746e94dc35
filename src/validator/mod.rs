//! Reachability and disguised-failure checks for candidate URLs.
//!
//! Each URL goes through up to three levels, stopping at the first failure:
//! a `HEAD` request, a declared-type check for document URLs, and a scan of a
//! bounded body prefix for error-page phrasing.

pub mod batch;
pub mod content_type;
pub mod patterns;

use std::sync::Arc;
use reqwest::{redirect, Client, Url};
use crate::config::ValidationConfig;
use crate::errors::RefineError;
use crate::models::{BarrierKind, FailureKind, ValidationResult};
use crate::utils::truncation::truncate_error;
pub use patterns::PatternLibrary;
use tracing::debug;

pub const TYPE_MISMATCH_REASON: &str = "declared type mismatch";
pub const SOFT_FAILURE_REASON: &str = "soft failure detected in content";
pub const PAYWALL_REASON: &str = "paywall detected";
pub const LOGIN_REASON: &str = "login required";

pub struct UrlValidator {
    client: Client,
    config: ValidationConfig,
    patterns: Arc<PatternLibrary>,
}

enum BodyPrefix {
    Text(String),
    Status(u16),
    Unreadable(String),
}

impl UrlValidator {
    /// Build a validator, loading the pattern file named in the config.
    pub fn new(config: ValidationConfig) -> Result<Self, RefineError> {
        let patterns = match &config.pattern_file {
            Some(path) => PatternLibrary::load(path)?,
            None => PatternLibrary::builtin(),
        };
        Self::with_patterns(config, patterns)
    }

    pub fn with_patterns(config: ValidationConfig, patterns: PatternLibrary) -> Result<Self, RefineError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .redirect(redirect::Policy::limited(5))
            // Some repositories bounce through a cookie-setting redirect.
            .cookie_store(true)
            .build()
            .map_err(|e| RefineError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config, patterns: Arc::new(patterns) })
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Check one URL. Never fails: every problem is reported in the result.
    pub async fn validate(&self, url: &str) -> ValidationResult {
        let parsed = match Url::parse(url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => u,
            Ok(u) => return ValidationResult::transport(url, format!("unsupported scheme '{}'", u.scheme())),
            Err(e) => return ValidationResult::transport(url, format!("invalid URL: {}", e)),
        };

        // Level 1: existence check
        let resp = match self.client.head(parsed.clone()).send().await {
            Ok(resp) => resp,
            Err(e) => {
                let error = if e.is_timeout() { format!("timeout: {}", e) } else { truncate_error(&e.to_string()) };
                debug!(url, error = %error, "HEAD request failed");
                return ValidationResult::transport(url, error);
            }
        };

        let status = resp.status().as_u16();
        if status >= 400 {
            debug!(url, status, "HEAD returned error status");
            return ValidationResult::http_status(url, status);
        }

        let declared = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let final_url = resp.url().as_str();
        let mut result = ValidationResult::success(url, status, declared.clone());
        if final_url != parsed.as_str() {
            result.final_url = Some(final_url.to_string());
        }

        // Level 2: a document URL must not come back as a web page
        if content_type::is_declared_type_mismatch(&parsed, declared.as_deref()) {
            debug!(url, content_type = ?declared, "Declared type mismatch");
            return result.reject(FailureKind::TypeMismatch, TYPE_MISMATCH_REASON.to_string());
        }

        // Level 3: soft-failure scan of markup pages
        let scan = self.config.content_scan
            && declared.as_deref().map_or(false, content_type::is_markup);
        if !scan {
            return result;
        }

        let text = match self.fetch_prefix(&parsed).await {
            BodyPrefix::Text(text) => text,
            BodyPrefix::Status(status) => {
                debug!(url, status, "Body fetch returned error status");
                return ValidationResult::http_status(url, status);
            }
            BodyPrefix::Unreadable(error) => {
                // Ambiguous; keep the URL.
                debug!(url, error = %error, "Body unreadable, not penalized");
                return result;
            }
        };

        if let Some(name) = self.patterns.soft_failure_match(&text) {
            debug!(url, pattern = name, "Soft failure detected");
            return result.reject(FailureKind::SoftFailure, format!("{} ({})", SOFT_FAILURE_REASON, name));
        }

        if let Some(barrier) = self.patterns.access_barrier_match(&text) {
            if self.config.reject_paywalls && barrier.kind.blocks_access() {
                debug!(url, barrier = %barrier, "Access barrier rejected");
                let (kind, reason) = match barrier.kind {
                    BarrierKind::Login => (FailureKind::LoginRequired, LOGIN_REASON),
                    _ => (FailureKind::Paywall, PAYWALL_REASON),
                };
                return result.reject(kind, format!("{} ({})", reason, barrier.pattern));
            }
            result.access_barrier = Some(barrier);
        }

        result
    }

    async fn fetch_prefix(&self, url: &Url) -> BodyPrefix {
        let mut resp = match self.client.get(url.clone()).send().await {
            Ok(resp) => resp,
            Err(e) => return BodyPrefix::Unreadable(e.to_string()),
        };
        let status = resp.status().as_u16();
        if status >= 400 {
            return BodyPrefix::Status(status);
        }

        let limit = self.config.scan_prefix_bytes;
        let mut buf: Vec<u8> = Vec::with_capacity(limit.min(64 * 1024));
        while buf.len() < limit {
            match resp.chunk().await {
                Ok(Some(chunk)) => {
                    let take = (limit - buf.len()).min(chunk.len());
                    buf.extend_from_slice(&chunk[..take]);
                }
                Ok(None) => break,
                Err(e) => return BodyPrefix::Unreadable(e.to_string()),
            }
        }
        BodyPrefix::Text(String::from_utf8_lossy(&buf).into_owned())
    }
}
