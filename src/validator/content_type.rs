use reqwest::Url;

const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "epub", "ppt", "pptx", "xls", "xlsx", "rtf", "djvu",
];

const MARKUP_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// Lower-cased media type without parameters.
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub fn is_markup(content_type: &str) -> bool {
    MARKUP_TYPES.contains(&essence(content_type).as_str())
}

/// True when the URL path ends in a binary document extension.
pub fn has_document_extension(url: &Url) -> bool {
    let path = url.path().trim_end_matches('/');
    let Some(last) = path.rsplit('/').next() else {
        return false;
    };
    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            DOCUMENT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        }
        _ => false,
    }
}

/// A document URL answered with a markup page is an error or landing page
/// standing in for the document.
pub fn is_declared_type_mismatch(url: &Url, content_type: Option<&str>) -> bool {
    match content_type {
        Some(ct) => has_document_extension(url) && is_markup(ct),
        None => false,
    }
}
