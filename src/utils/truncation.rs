const MAX_ERROR_LENGTH: usize = 500;

/// Cut `text` to at most `max` characters, appending an ellipsis when cut.
/// Never splits a UTF-8 sequence.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        None => text.to_string(),
        Some((end, _)) => format!("{}...", &text[..end]),
    }
}

/// Transport error text can embed whole response bodies; keep it short.
pub fn truncate_error(error: &str) -> String {
    truncate_chars(error, MAX_ERROR_LENGTH)
}
