//! Small text helpers for cleaning upstream fields.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Trim a value and drop it entirely when nothing is left.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == v.len() {
            Some(v)
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Borrowed variant of [`non_blank`].
pub fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Remove HTML tags from a fragment. Returns `None` if only markup remains.
pub fn strip_html(html: &str) -> Option<String> {
    let stripped = HTML_TAG.replace_all(html, "");
    non_blank(Some(stripped.into_owned()))
}

/// Cut `text` to at most `max` characters, ending with `...` when shortened.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
