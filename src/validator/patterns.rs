use std::path::Path;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use crate::errors::RefineError;
use crate::models::{AccessBarrier, BarrierKind};

/// Built-in error-page phrasing. (name, pattern)
const SOFT_FAILURE_DEFAULTS: &[(&str, &str)] = &[
    ("404 not found", r"404.*not\s*found|not\s*found.*404"),
    ("page not found", r"page\s*not\s*found|can(no|')?t\s*find\s*(the|this)?\s*page"),
    ("apology for not found", r"sorry.*couldn'?t\s*find|we\s*couldn'?t\s*locate"),
    ("nothing here", r"oops.*nothing\s*here|there'?s\s*nothing\s*here"),
    ("DOI not found", r"doi\s*not\s*found|doi.*not\s*available"),
    ("document unavailable", r"document\s*not\s*found|article\s*not\s*available"),
    ("item not available", r"item\s*is\s*not\s*available|item\s*not\s*found|handle\s*not\s*found"),
    (
        "repository record missing",
        r"invalid\s*identifier|the\s*requested\s*(item|record|resource)\s*(was\s*not\s*found|does\s*not\s*exist|is\s*not\s*available)",
    ),
    ("error in title", r"<title>[^<]*(404|not\s*found|error)[^<]*</title>"),
];

const PAYWALL_DEFAULTS: &[(&str, &str)] = &[
    ("subscription required", r"subscribe.*continue|subscription.*required"),
    ("price to access", r"\$\d+(\.\d{2})?\s*(to\s*)?(access|view|read|download)"),
    ("purchase required", r"purchase.*access|buy.*article|pay.*view"),
    ("paywall detected", r"paywall|payment.*required"),
    ("login to subscribe", r"login.*subscribe|sign\s*in.*subscribe"),
    ("members only", r"members?\s*only|members?\s*exclusive"),
    ("subscription prompt", r"become\s*a\s*(member|subscriber)"),
    ("trial then paid", r"free\s*trial.*then\s*\$"),
    ("upgrade required", r"upgrade\s*to\s*(premium|pro|plus)"),
    ("limited without subscription", r"limited\s*access.*subscribe"),
    ("paid full text", r"full\s*text.*\$|complete\s*article.*\$"),
    ("paid download", r"price.*download|cost.*access"),
];

const LOGIN_DEFAULTS: &[(&str, &str)] = &[
    ("login to continue", r"sign\s*in.*continue|log\s*in.*continue"),
    ("authentication required", r"authentication.*required|login.*required"),
    ("institutional access", r"institutional.*access|institution.*login"),
    ("library access", r"access.*through.*library"),
    ("credentials required", r"credentials.*required|authorized.*users?\s*only"),
    ("login prompt", r"please\s*(log\s*in|sign\s*in)"),
    ("restricted access", r"restricted.*access|access.*restricted"),
    ("account required", r"account.*required|create.*account"),
    ("academic access", r"university.*access|academic.*access"),
    ("licensed content", r"licensed.*content|license.*required"),
];

/// Partial views of the work.
const PREVIEW_DEFAULTS: &[(&str, &str)] = &[
    ("limited preview", r"limited\s*preview|preview\s*only"),
    ("sample pages", r"first\s*\d+\s*pages?|sample\s*pages?"),
    ("excerpt only", r"excerpt|selected\s*pages?"),
    ("TOC only", r"table\s*of\s*contents\s*only"),
    ("abstract only", r"abstract\s*only|summary\s*only"),
    ("partial view", r"partial\s*view|incomplete\s*view"),
    ("no full view", r"preview\s*unavailable|full\s*view\s*not\s*available"),
    ("percentage visible", r"\d+%?\s*visible|\d+\s*of\s*\d+\s*pages"),
    ("sample content", r"sample\s*content|limited\s*content"),
];

#[derive(Debug, Clone)]
pub struct NamedPattern {
    pub name: String,
    regex: Regex,
}

impl NamedPattern {
    pub fn new(name: &str, pattern: &str) -> Result<Self, RefineError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| RefineError::Config(format!("Invalid pattern '{}': {}", name, e)))?;
        Ok(Self { name: name.to_string(), regex })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Phrase library used by the content scan.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    soft_failure: Vec<NamedPattern>,
    paywall: Vec<NamedPattern>,
    login: Vec<NamedPattern>,
    preview: Vec<NamedPattern>,
}

#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum MergeMode {
    #[default]
    Extend,
    Replace,
}

#[derive(Debug, Deserialize)]
struct PatternEntry {
    name: String,
    pattern: String,
}

#[derive(Debug, Deserialize)]
struct PatternFile {
    #[serde(default)]
    mode: MergeMode,
    #[serde(default)]
    soft_failure: Vec<PatternEntry>,
    #[serde(default)]
    paywall: Vec<PatternEntry>,
    #[serde(default)]
    login: Vec<PatternEntry>,
    #[serde(default)]
    preview: Vec<PatternEntry>,
}

impl PatternLibrary {
    pub fn builtin() -> Self {
        // The literals are fixed and covered by tests.
        Self {
            soft_failure: compile_defaults(SOFT_FAILURE_DEFAULTS),
            paywall: compile_defaults(PAYWALL_DEFAULTS),
            login: compile_defaults(LOGIN_DEFAULTS),
            preview: compile_defaults(PREVIEW_DEFAULTS),
        }
    }

    /// Parse a YAML pattern file. `mode: extend` (default) appends to the
    /// built-in sets, `mode: replace` swaps out every set the file names.
    pub fn from_yaml_str(content: &str) -> Result<Self, RefineError> {
        let file: PatternFile = serde_yaml::from_str(content)?;
        let mut library = Self::builtin();

        let replace = file.mode == MergeMode::Replace;
        merge(&mut library.soft_failure, &file.soft_failure, replace)?;
        merge(&mut library.paywall, &file.paywall, replace)?;
        merge(&mut library.login, &file.login, replace)?;
        merge(&mut library.preview, &file.preview, replace)?;
        Ok(library)
    }

    pub fn load(path: &Path) -> Result<Self, RefineError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RefineError::Config(format!("Cannot read pattern file {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Name of the first error-page pattern found in `text`.
    pub fn soft_failure_match(&self, text: &str) -> Option<&str> {
        first_match(&self.soft_failure, text)
    }

    /// First barrier found, checking paywalls, then login walls, then previews.
    pub fn access_barrier_match(&self, text: &str) -> Option<AccessBarrier> {
        [
            (BarrierKind::Paywall, &self.paywall),
            (BarrierKind::Login, &self.login),
            (BarrierKind::Preview, &self.preview),
        ]
        .into_iter()
        .find_map(|(kind, patterns)| {
            first_match(patterns, text).map(|name| AccessBarrier { kind, pattern: name.to_string() })
        })
    }
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

fn first_match<'a>(patterns: &'a [NamedPattern], text: &str) -> Option<&'a str> {
    patterns.iter().find(|p| p.is_match(text)).map(|p| p.name.as_str())
}

fn compile_defaults(defaults: &[(&str, &str)]) -> Vec<NamedPattern> {
    defaults
        .iter()
        .filter_map(|(name, pattern)| NamedPattern::new(name, pattern).ok())
        .collect()
}

fn compile_entries(entries: &[PatternEntry]) -> Result<Vec<NamedPattern>, RefineError> {
    entries.iter().map(|e| NamedPattern::new(&e.name, &e.pattern)).collect()
}

/// A set the file leaves empty keeps its defaults, even in replace mode.
fn merge(set: &mut Vec<NamedPattern>, entries: &[PatternEntry], replace: bool) -> Result<(), RefineError> {
    let compiled = compile_entries(entries)?;
    if replace && !compiled.is_empty() {
        *set = compiled;
    } else {
        set.extend(compiled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn barrier(kind: BarrierKind, pattern: &str) -> Option<AccessBarrier> {
        Some(AccessBarrier { kind, pattern: pattern.to_string() })
    }

    #[test]
    fn test_builtin_patterns_all_compile() {
        let lib = PatternLibrary::builtin();
        assert_eq!(lib.soft_failure.len(), SOFT_FAILURE_DEFAULTS.len());
        assert_eq!(lib.paywall.len(), PAYWALL_DEFAULTS.len());
        assert_eq!(lib.login.len(), LOGIN_DEFAULTS.len());
        assert_eq!(lib.preview.len(), PREVIEW_DEFAULTS.len());
    }

    #[test]
    fn test_soft_failure_phrases() {
        let lib = PatternLibrary::builtin();
        assert_eq!(lib.soft_failure_match("<h1>Page Not Found</h1>"), Some("page not found"));
        assert_eq!(lib.soft_failure_match("The item is not available"), Some("item not available"));
        assert_eq!(lib.soft_failure_match("<title>Error - Library</title>"), Some("error in title"));
        assert_eq!(
            lib.soft_failure_match("<p>Invalid Identifier</p>"),
            Some("repository record missing")
        );
        assert_eq!(lib.soft_failure_match("<title>404</title>"), Some("error in title"));
    }

    #[test]
    fn test_clean_page_has_no_match() {
        let lib = PatternLibrary::builtin();
        let page = "<html><head><title>Orality and Literacy</title></head><body>Chapter 1</body></html>";
        assert_eq!(lib.soft_failure_match(page), None);
        assert_eq!(lib.access_barrier_match(page), None);
    }

    #[test]
    fn test_paywall_phrases() {
        let lib = PatternLibrary::builtin();
        assert_eq!(
            lib.access_barrier_match("Subscribe now to continue reading"),
            barrier(BarrierKind::Paywall, "subscription required")
        );
        assert_eq!(
            lib.access_barrier_match("Pay $39.95 to access this article"),
            barrier(BarrierKind::Paywall, "price to access")
        );
        assert_eq!(
            lib.access_barrier_match("Upgrade to Premium for unlimited reading"),
            barrier(BarrierKind::Paywall, "upgrade required")
        );
    }

    #[test]
    fn test_login_phrases() {
        let lib = PatternLibrary::builtin();
        assert_eq!(
            lib.access_barrier_match("Please sign in with your campus ID"),
            barrier(BarrierKind::Login, "login prompt")
        );
        assert_eq!(
            lib.access_barrier_match("Access this title through your library"),
            barrier(BarrierKind::Login, "library access")
        );
        assert_eq!(
            lib.access_barrier_match("For authorized users only"),
            barrier(BarrierKind::Login, "credentials required")
        );
    }

    #[test]
    fn test_preview_phrases() {
        let lib = PatternLibrary::builtin();
        assert_eq!(
            lib.access_barrier_match("This is a limited preview of the book"),
            barrier(BarrierKind::Preview, "limited preview")
        );
        assert_eq!(
            lib.access_barrier_match("Showing 12 of 240 pages"),
            barrier(BarrierKind::Preview, "percentage visible")
        );
        assert_eq!(
            lib.access_barrier_match("Read an excerpt from chapter two"),
            barrier(BarrierKind::Preview, "excerpt only")
        );
    }

    #[test]
    fn test_paywall_checked_before_preview() {
        let lib = PatternLibrary::builtin();
        let page = "Limited preview. Subscribe to continue reading.";
        assert_eq!(lib.access_barrier_match(page).map(|b| b.kind), Some(BarrierKind::Paywall));
    }

    #[test]
    fn test_yaml_extend() {
        let yaml = "soft_failure:\n  - name: record withdrawn\n    pattern: 'this record has been withdrawn'\n";
        let lib = PatternLibrary::from_yaml_str(yaml).unwrap();
        assert_eq!(lib.soft_failure.len(), SOFT_FAILURE_DEFAULTS.len() + 1);
        assert_eq!(lib.soft_failure_match("This record has been WITHDRAWN"), Some("record withdrawn"));
        assert_eq!(lib.soft_failure_match("page not found"), Some("page not found"));
    }

    #[test]
    fn test_yaml_replace() {
        let yaml = "mode: replace\nsoft_failure:\n  - name: only\n    pattern: 'gone fishing'\npreview:\n  - name: snippet view\n    pattern: 'snippet view'\n";
        let lib = PatternLibrary::from_yaml_str(yaml).unwrap();
        assert_eq!(lib.soft_failure.len(), 1);
        assert_eq!(lib.soft_failure_match("page not found"), None);
        assert_eq!(lib.preview.len(), 1);
        assert_eq!(
            lib.access_barrier_match("Snippet view only"),
            barrier(BarrierKind::Preview, "snippet view")
        );
        // Untouched sets keep their defaults
        assert!(lib.access_barrier_match("paywall").is_some());
        assert_eq!(lib.login.len(), LOGIN_DEFAULTS.len());
    }

    #[test]
    fn test_yaml_invalid_regex() {
        let yaml = "login:\n  - name: broken\n    pattern: '(unclosed'\n";
        assert!(matches!(PatternLibrary::from_yaml_str(yaml), Err(RefineError::Config(_))));
    }
}
