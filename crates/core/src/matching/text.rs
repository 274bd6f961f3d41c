//! Text helpers for matching shopper questions against catalog fields.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("Invalid regex"));
static DATA_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-[^=\s]*="[^"]*""#).expect("Invalid regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

/// Minimum token length (exclusive) for a word to count as a query token.
const MIN_TOKEN_LEN: usize = 2;

/// Split a question into lowercase word tokens longer than two characters.
///
/// Tokens are de-duplicated, keeping first-occurrence order, so a word
/// repeated in the question is only counted once.
#[must_use]
pub fn tokenize(query: &str) -> Vec<String> {
    let lower = query.to_lowercase();
    let mut tokens: Vec<String> = Vec::new();
    for word in lower.split(|c: char| !c.is_alphanumeric()) {
        if word.chars().count() > MIN_TOKEN_LEN && !tokens.iter().any(|t| t == word) {
            tokens.push(word.to_string());
        }
    }
    tokens
}

/// The token itself followed by naive singular forms (`boards` -> `board`,
/// `boxes` -> `box`).
pub fn token_variants(token: &str) -> impl Iterator<Item = &str> {
    let es = token
        .strip_suffix("es")
        .filter(|stem| stem.chars().count() > MIN_TOKEN_LEN);
    let s = token
        .strip_suffix('s')
        .filter(|stem| !stem.ends_with('s') && stem.chars().count() > MIN_TOKEN_LEN);
    std::iter::once(token).chain(es).chain(s)
}

/// Whether `needle` occurs in `haystack` as whole words.
///
/// Both arguments are expected in lowercase. `"red"` matches `"a red belt"`
/// but not `"ordered"`.
#[must_use]
pub fn contains_phrase(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, matched)| {
        let end = start + matched.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

/// Strip markup from a product description and collapse whitespace.
#[must_use]
pub fn clean_html(html: &str) -> String {
    let without_attrs = DATA_ATTR_RE.replace_all(html, "");
    let without_tags = TAG_RE.replace_all(&without_attrs, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">");
    WHITESPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

/// Truncate to `max_chars` characters, appending `...` when anything was cut.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}
