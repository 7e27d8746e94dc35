use std::fmt::Write;
use serde_json::json;
use crate::llm::ToolSpec;
use crate::models::{Reference, SearchCandidate};
use crate::utils::truncation::truncate_chars;

pub const SEARCH_TOOL_NAME: &str = "web_search";

const MAX_SNIPPET_CHARS: usize = 300;

pub const SYSTEM_PROMPT: &str = "You are a bibliographic research assistant. You judge whether web pages are \
the cited work itself or discussion of it. You answer only in the requested format.";

const RUBRIC: &str = "\
Score every candidate twice, from 0 to 100.

PRIMARY score: how well the URL serves as the work itself.
- 90-100: full text of the exact work, or the publisher's page for it.
- 75-89: the exact work with minor friction (institutional repository copy, author's copy).
- Partial or excerpt collections (sample chapters, previews, anthologies holding an extract) score at most 60.
- News or magazine coverage of the research, as opposed to the research itself, scores at most 50.
- Reviews, summaries, listings and commentary score below 30.

SECONDARY score: how well the URL serves as a review or discussion of the work.
- 90-100: a scholarly review or substantial analysis of this exact work.
- 75-89: a solid summary, critique or detailed aggregator entry about the work.
- The work itself (full text, publisher page) scores below 30.

The two roles are mutually exclusive. A candidate that is clearly the work itself must score high on \
PRIMARY and low on SECONDARY. A candidate that is clearly commentary must score high on SECONDARY and \
low on PRIMARY. A candidate that is neither (wrong work, wrong author, or not in the expected language) \
scores low on both.";

const TABLE_FORMAT: &str = "\
Respond with one line per candidate and nothing else, in this exact pipe-delimited format:
index|primary|secondary|primary_reason|secondary_reason|title_match|author_match|recommend

- index: the candidate number shown above
- primary, secondary: integers 0-100
- primary_reason, secondary_reason: a few words, no pipe characters
- title_match, author_match: yes, partial or no
- recommend: primary, secondary or neither";

/// Build the single ranking request for the current candidate list.
pub fn build_prompt(reference: &Reference, candidates: &[SearchCandidate], search_enabled: bool) -> String {
    let mut prompt = String::new();

    prompt.push_str("REFERENCE\n");
    let _ = writeln!(prompt, "Author: {}", reference.author);
    let _ = writeln!(prompt, "Title: {}", reference.title);
    if let Some(year) = &reference.year {
        let _ = writeln!(prompt, "Year: {}", year);
    }
    if let Some(info) = &reference.other_info {
        let _ = writeln!(prompt, "Details: {}", info);
    }
    if let Some(relevance) = &reference.relevance {
        let _ = writeln!(prompt, "Relevance: {}", relevance);
    }
    let _ = writeln!(prompt, "Expected language: {}", reference.expected_language);

    let _ = writeln!(prompt, "\nCANDIDATES ({})", candidates.len());
    for (i, c) in candidates.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", i + 1, c.title);
        let _ = writeln!(prompt, "   URL: {}", c.url);
        if !c.snippet.is_empty() {
            let _ = writeln!(prompt, "   Snippet: {}", truncate_chars(&c.snippet, MAX_SNIPPET_CHARS));
        }
    }

    prompt.push('\n');
    prompt.push_str(RUBRIC);
    prompt.push_str("\n\n");

    if search_enabled {
        let _ = writeln!(
            prompt,
            "If none of the candidates is a plausible PRIMARY or SECONDARY source, you may call the \
             {} tool once with a better query instead of answering. Otherwise answer directly.\n",
            SEARCH_TOOL_NAME
        );
    }

    prompt.push_str(TABLE_FORMAT);
    prompt
}

pub fn search_tool() -> ToolSpec {
    ToolSpec {
        name: SEARCH_TOOL_NAME.to_string(),
        description: "Search the web for more candidate URLs for this reference.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query" }
            },
            "required": ["query"]
        }),
    }
}
