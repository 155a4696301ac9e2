use once_cell::sync::Lazy;
use regex::Regex;

// `url(...)`, optionally preceded by `@import` and followed by `;`.
// The argument is double-quoted, single-quoted or bare.
static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?:@import\s+)?\burl\s*\(\s*("(?:[^\\"\r\n\f]|\\[\s\S])*"|'(?:[^\\'\n\r\f]|\\[\s\S])*'|[^)}\s]+)\s*\)(\s*;?)"#,
    )
    .expect("valid url regex")
});

static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@import\s+(?:"([^"\r\n]+?)"|'([^'\r\n]+?)')\s*;"#).expect("valid import regex")
});

static BLOCK_COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid comment regex"));

// Line comments only where `//` starts a token, so `url(http://...)` survives
static LINE_COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(^|\s)//[^\r\n]*").expect("valid comment regex"));

/// Specifiers of quoted `@import "x";` statements, in source order
pub fn css_imports(content: &str) -> Vec<String> {
    let without_blocks = BLOCK_COMMENT_RE.replace_all(content, "");
    let stripped = LINE_COMMENT_RE.replace_all(&without_blocks, "$1");

    IMPORT_RE
        .captures_iter(&stripped)
        .filter_map(|cap| cap.get(1).or_else(|| cap.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Unquoted arguments of every `url(...)` occurrence, in source order
pub fn url_references(content: &str) -> Vec<String> {
    URL_RE
        .captures_iter(content)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().replace(['\'', '"'], ""))
        .collect()
}

/// `url(...)` targets that point at files next to the stylesheet
pub fn relative_url_references(content: &str) -> Vec<String> {
    url_references(content)
        .into_iter()
        .filter(|url| url.starts_with('.'))
        .collect()
}
