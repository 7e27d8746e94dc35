use serde::{Deserialize, Serialize};

/// One URL discovered for a reference by the search collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    /// The search query that surfaced this URL.
    #[serde(default)]
    pub source_query: String,
}

impl SearchCandidate {
    pub fn new(url: &str, title: &str, snippet: &str, source_query: &str) -> Self {
        Self {
            url: url.to_string(),
            title: title.to_string(),
            snippet: snippet.to_string(),
            source_query: source_query.to_string(),
        }
    }
}

/// Bibliographic identity of the work a set of candidates is judged against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reference {
    /// Caller-assigned identifier, used only for logging.
    #[serde(default)]
    pub id: Option<String>,
    pub author: String,
    pub title: String,
    #[serde(default)]
    pub year: Option<String>,
    /// Why the manuscript cites this work. Helps the ranker tell the work from
    /// commentary on it.
    #[serde(default)]
    pub relevance: Option<String>,
    /// Publisher, journal, edition or other free-form detail.
    #[serde(default)]
    pub other_info: Option<String>,
    #[serde(default = "default_language")]
    pub expected_language: String,
}

fn default_language() -> String {
    "English".to_string()
}

impl Reference {
    pub fn new(author: &str, title: &str, year: Option<&str>) -> Self {
        Self {
            author: author.to_string(),
            title: title.to_string(),
            year: year.map(str::to_string),
            expected_language: default_language(),
            ..Default::default()
        }
    }

    /// Short label for log lines.
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => format!("[{}] {}", id, self.title),
            None => self.title.clone(),
        }
    }
}
