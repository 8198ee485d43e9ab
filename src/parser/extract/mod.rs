pub mod code;
pub mod credits;
pub mod prereqs;
pub mod tags;
pub mod title;

use crate::error::ParseError;
use crate::parser::rules::ExtractionRules;

/// Fields of one course, before college/department context is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCourse {
    pub code: String,
    pub name: String,
    pub credits: f64,
    pub tags: Vec<String>,
    pub prerequisites: Vec<String>,
}

/// Run every field extractor over one normalized block.
///
/// Code first (its end anchors the name), then credits (its start ends the
/// name, its end starts the tag scope), then tags and prerequisites.
pub fn extract_all(block: &str, rules: &ExtractionRules) -> Result<ParsedCourse, ParseError> {
    let code = code::extract(block).ok_or(ParseError::NoCodeFound)?;
    let credits = credits::extract(block, code.end, rules)?;

    let name = title::extract(&block[code.end..credits.start]);
    let tags = tags::extract(&block[credits.end..], rules);
    let prerequisites = prereqs::extract(block, rules);

    Ok(ParsedCourse {
        code: code.code,
        name,
        credits: credits.value,
        tags,
        prerequisites,
    })
}
