use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::parser::rules::ExtractionRules;

/// Department letters (optionally ending in "&") then a three-digit number.
/// Descriptions mix cases ("Math 141"); identifiers are upper-cased.
static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([A-Z]{2,}&?)\s*(\d{3}[A-Z]?)\b").unwrap());
static BARE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{3}[A-Z]?)$").unwrap());
static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*(?:,|/|;|\band\b|\bor\b)\s*").unwrap());
/// Words that can precede a course number without being a department. The
/// number then belongs to the previous department ("placement into 142").
const CONNECTORS: &[&str] = &["AND", "OR", "INTO", "OF", "WITH", "IN", "THEN"];
/// Words whose number is not a course at all ("Level 100", "GPA 250").
const QUALIFIERS: &[&str] = &["LEVEL", "GPA", "LEAST", "MINIMUM", "ABOVE", "THAN", "SCORE"];

/// A period that ends a sentence; "2.0" does not.
static SENTENCE_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.(?:\s|$)").unwrap());

/// Prerequisites from the labeled segment of a block, in source order.
pub fn extract(block: &str, rules: &ExtractionRules) -> Vec<String> {
    let Some(label) = rules.prereq_label.find(block) else {
        return Vec::new();
    };

    let mut segment = &block[label.end()..];
    if let Some(m) = rules.coreq_label.find(segment) {
        segment = &segment[..m.start()];
    }
    if let Some(m) = SENTENCE_END_RE.find(segment) {
        segment = &segment[..m.start()];
    }

    parse_list(segment)
}

/// Parse a prerequisite list such as "ENGL&101 and MATH&107".
///
/// A piece holding only a course number inherits the department of the
/// identifier before it ("MATH 141 or 142"). Pieces with no identifier
/// ("2.0 or better", "instructor permission") contribute nothing.
pub fn parse_list(segment: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut prev_dept: Option<String> = None;

    for piece in SEPARATOR_RE.split(segment) {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }

        if let Some(caps) = BARE_NUMBER_RE.captures(piece) {
            match &prev_dept {
                Some(dept) => push_unique(&mut out, &mut seen, format!("{}{}", dept, &caps[1])),
                None => debug!(piece, "bare course number without a department"),
            }
            continue;
        }

        let mut found = false;
        for caps in IDENT_RE.captures_iter(piece) {
            let dept = caps[1].to_uppercase();
            let number = caps[2].to_uppercase();
            found = true;
            if QUALIFIERS.contains(&dept.as_str()) {
                debug!(piece, "course number qualifier skipped");
                continue;
            }
            if CONNECTORS.contains(&dept.as_str()) {
                match &prev_dept {
                    Some(prev) => push_unique(&mut out, &mut seen, format!("{}{}", prev, number)),
                    None => debug!(piece, "bare course number without a department"),
                }
                continue;
            }
            push_unique(&mut out, &mut seen, format!("{}{}", dept, number));
            prev_dept = Some(dept);
        }
        if !found {
            debug!(piece, "no prerequisite identifier in piece");
        }
    }

    out
}

fn push_unique(out: &mut Vec<String>, seen: &mut HashSet<String>, ident: String) {
    if seen.insert(ident.clone()) {
        out.push(ident);
    }
}
