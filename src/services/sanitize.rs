use regex::Regex;
use std::sync::LazyLock;

static BR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());

/// Strip markup tags and attributes from translated text, leaving plain
/// text safe for storage and display. Line breaks encoded as `<br>`
/// survive as newlines; malformed markup is cleaned best-effort, never
/// rejected.
#[must_use]
pub fn strip_markup(text: &str) -> String {
    let with_breaks = BR_RE.replace_all(text, "\n");
    let stripped = TAG_RE.replace_all(&with_breaks, "");
    let decoded = html_escape::decode_html_entities(stripped.as_ref());
    let collapsed = SPACE_RE.replace_all(decoded.as_ref(), " ");
    collapsed.trim().to_string()
}
