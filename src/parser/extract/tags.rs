use std::sync::LazyLock;

use regex::Regex;

use crate::parser::rules::ExtractionRules;

static PAREN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^)]*)\)").unwrap());

/// Tags from the text following the credits marker.
///
/// A `Tags:` label wins; otherwise the first parenthesized segment before any
/// prerequisite label is taken, so "(or placement)" inside a prerequisite
/// sentence is never read as tags.
pub fn extract(after_credits: &str, rules: &ExtractionRules) -> Vec<String> {
    if let Some(caps) = rules.tags_label.captures(after_credits) {
        return split_list(&caps[1]);
    }

    let scope = match rules.prereq_label.find(after_credits) {
        Some(m) => &after_credits[..m.start()],
        None => after_credits,
    };

    PAREN_RE
        .captures(scope)
        .map(|caps| split_list(&caps[1]))
        .unwrap_or_default()
}

/// Split a comma/slash-delimited tag list; trim, drop blanks.
pub fn split_list(segment: &str) -> Vec<String> {
    segment
        .split([',', '/'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
