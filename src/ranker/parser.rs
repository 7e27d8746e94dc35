use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::models::Recommendation;

/// One candidate's scores as returned by the reasoning service.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRow {
    /// 1-based candidate number from the prompt.
    pub index: usize,
    pub primary: u8,
    pub secondary: u8,
    pub primary_reason: String,
    pub secondary_reason: String,
    pub title_match: Option<String>,
    pub author_match: Option<String>,
    pub recommendation: Option<Recommendation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    Table(Vec<ScoreRow>),
    Json(Vec<ScoreRow>),
    Unparseable { raw: String },
}

impl ParsedResponse {
    pub fn format(&self) -> Option<ResponseFormat> {
        match self {
            Self::Table(_) => Some(ResponseFormat::Table),
            Self::Json(_) => Some(ResponseFormat::Json),
            Self::Unparseable { .. } => None,
        }
    }

    /// Parsed rows; empty for an unparseable response.
    pub fn into_rows(self) -> Vec<ScoreRow> {
        match self {
            Self::Table(rows) | Self::Json(rows) => rows,
            Self::Unparseable { .. } => Vec::new(),
        }
    }
}

/// Decide which representation the response used and parse it.
///
/// JSON is tried first because a JSON array never parses as a table row,
/// whereas table reasons may contain brackets. A representation that yields
/// no rows does not count as used.
pub fn parse_response(text: &str) -> ParsedResponse {
    let rows = parse_json(text);
    if !rows.is_empty() {
        return ParsedResponse::Json(rows);
    }
    let rows = parse_table(text);
    if !rows.is_empty() {
        return ParsedResponse::Table(rows);
    }
    ParsedResponse::Unparseable { raw: text.to_string() }
}

fn parse_table(text: &str) -> Vec<ScoreRow> {
    text.lines().filter_map(parse_table_line).collect()
}

fn parse_table_line(line: &str) -> Option<ScoreRow> {
    let line = line.trim().trim_start_matches('|').trim_end_matches('|');
    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    if fields.len() < 3 {
        return None;
    }

    let index = fields[0].trim_start_matches('#').trim_end_matches('.').parse::<usize>().ok()?;
    let primary = parse_score_str(fields[1])?;
    let secondary = parse_score_str(fields[2])?;
    let field = |i: usize| fields.get(i).map(|s| s.to_string()).filter(|s| !s.is_empty());

    Some(ScoreRow {
        index,
        primary,
        secondary,
        primary_reason: field(3).unwrap_or_default(),
        secondary_reason: field(4).unwrap_or_default(),
        title_match: field(5),
        author_match: field(6),
        recommendation: fields.get(7).and_then(|s| Recommendation::parse(s)),
    })
}

fn parse_score_str(s: &str) -> Option<u8> {
    let s = s.trim().trim_end_matches('%');
    s.parse::<f64>().ok().map(clamp_score)
}

fn clamp_score(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(0.0, 100.0) as u8
}

/// Rows from the first array in `text` that parses and holds at least one
/// score object. Brackets in surrounding prose are skipped over.
fn parse_json(text: &str) -> Vec<ScoreRow> {
    let body = strip_fence(text);
    for (start, _) in body.match_indices('[') {
        let mut stream = serde_json::Deserializer::from_str(&body[start..]).into_iter::<Vec<Value>>();
        let Some(Ok(items)) = stream.next() else {
            continue;
        };
        let rows: Vec<ScoreRow> = items
            .iter()
            .enumerate()
            .filter_map(|(pos, item)| json_row(pos, item))
            .collect();
        if !rows.is_empty() {
            return rows;
        }
    }
    Vec::new()
}

fn strip_fence(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let rest = &text[start + 7..];
        if let Some(end) = rest.find("```") {
            return rest[..end].trim();
        }
    }
    text
}

fn json_row(position: usize, item: &Value) -> Option<ScoreRow> {
    let obj = item.as_object()?;

    let index = match lookup(obj, &["index", "idx", "candidate", "id"]) {
        Some(v) => json_usize(v)?,
        // Positional arrays are 1-based like the prompt
        None => position + 1,
    };
    let primary = json_score(lookup(obj, &["primary", "primary_score"])?)?;
    let secondary = json_score(lookup(obj, &["secondary", "secondary_score"])?)?;

    Some(ScoreRow {
        index,
        primary,
        secondary,
        primary_reason: lookup(obj, &["primary_reason"]).map(json_text).unwrap_or_default(),
        secondary_reason: lookup(obj, &["secondary_reason"]).map(json_text).unwrap_or_default(),
        title_match: lookup(obj, &["title_match"]).map(json_text),
        author_match: lookup(obj, &["author_match"]).map(json_text),
        recommendation: lookup(obj, &["recommend", "recommendation"])
            .and_then(|v| v.as_str())
            .and_then(Recommendation::parse),
    })
}

fn lookup<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k)).filter(|v| !v.is_null())
}

fn json_usize(v: &Value) -> Option<usize> {
    match v {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_score(v: &Value) -> Option<u8> {
    match v {
        Value::Number(n) => n.as_f64().map(clamp_score),
        Value::String(s) => parse_score_str(s),
        _ => None,
    }
}

fn json_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Bool(b) => if *b { "yes".to_string() } else { "no".to_string() },
        other => other.to_string(),
    }
}
