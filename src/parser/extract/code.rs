use std::sync::LazyLock;

use regex::Regex;

/// Optional department prefix ("ART ", "ENGL&") followed by the course number.
static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:([A-Z][A-Z&]*)\s*)?(\d+[A-Z]?)\b").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct CodeMatch {
    pub code: String,
    pub department: Option<String>,
    /// Byte offset just past the code in the normalized block.
    pub end: usize,
}

pub fn extract(block: &str) -> Option<CodeMatch> {
    let caps = CODE_RE.captures(block)?;
    let whole = caps.get(0)?;
    Some(CodeMatch {
        code: caps[2].to_string(),
        department: caps.get(1).map(|m| m.as_str().trim_end_matches('&').to_string()),
        end: whole.end(),
    })
}
