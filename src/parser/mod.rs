pub mod blocks;
pub mod extract;
pub mod rules;

use crate::error::ParseError;
pub use extract::ParsedCourse;
use rules::ExtractionRules;

/// Two-step pipeline: raw block → normalized text → extracted fields.
///
/// Pure: the same block and rules always give the same result.
pub fn parse_course(raw: &str, rules: &ExtractionRules) -> Result<ParsedCourse, ParseError> {
    let block = blocks::normalize_whitespace(raw);
    extract::extract_all(&block, rules)
}

// ── Tests ──
