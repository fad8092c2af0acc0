//! HTML fulltext extraction
//!
//! Rich text properties are stored as HTML fragments. For fulltext indexing the
//! headings are routed into their own buckets (`h1` .. `h6`) so they can be
//! boosted independently, and everything else is flattened into `text`.

use regex::Regex;
use std::sync::LazyLock;

/// Matches a complete heading element and captures its level and inner markup
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h([1-6])[^>]*>(.*?)</h[1-6]\s*>").unwrap());

/// Matches any remaining tag
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

/// Compiled regex for whitespace normalization
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Remove all tags and collapse whitespace
///
/// # Examples
///
/// ```
/// use graphindex_core::utils::strip_html;
///
/// assert_eq!(strip_html("<p>Hello <b>world</b></p>"), "Hello world");
/// assert_eq!(strip_html("  plain\n text "), "plain text");
/// ```
pub fn strip_html(content: &str) -> String {
    let without_tags = TAG_RE.replace_all(content, " ");
    WHITESPACE_RE
        .replace_all(&without_tags, " ")
        .trim()
        .to_string()
}

/// Split an HTML fragment into `(bucket, text)` pairs
///
/// Headings become `h1` .. `h6` entries in document order, followed by a single
/// `text` entry holding the rest of the fragment. Empty parts are omitted.
///
/// # Examples
///
/// ```
/// use graphindex_core::utils::extract_html_tags;
///
/// let parts = extract_html_tags("<h1>Title</h1><p>Body copy</p>");
/// assert_eq!(
///     parts,
///     vec![
///         ("h1".to_string(), "Title".to_string()),
///         ("text".to_string(), "Body copy".to_string()),
///     ]
/// );
/// ```
pub fn extract_html_tags(content: &str) -> Vec<(String, String)> {
    let mut parts = Vec::new();

    for captures in HEADING_RE.captures_iter(content) {
        let text = strip_html(&captures[2]);
        if !text.is_empty() {
            parts.push((format!("h{}", &captures[1]), text));
        }
    }

    let remainder = strip_html(&HEADING_RE.replace_all(content, " "));
    if !remainder.is_empty() {
        parts.push(("text".to_string(), remainder));
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_handles_attributes_and_newlines() {
        assert_eq!(
            strip_html("<p class=\"lead\">One</p>\n<p>Two</p>"),
            "One Two"
        );
    }

    #[test]
    fn test_extract_multiple_heading_levels() {
        let parts = extract_html_tags("<h2 id=\"a\">Sub</h2>intro<h3>Deeper</h3>");
        assert_eq!(parts[0], ("h2".to_string(), "Sub".to_string()));
        assert_eq!(parts[1], ("h3".to_string(), "Deeper".to_string()));
        assert_eq!(parts[2], ("text".to_string(), "intro".to_string()));
    }

    #[test]
    fn test_extract_plain_text_only() {
        assert_eq!(
            extract_html_tags("just words"),
            vec![("text".to_string(), "just words".to_string())]
        );
    }

    #[test]
    fn test_extract_empty() {
        assert!(extract_html_tags("<p> </p>").is_empty());
    }
}
