use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseError;
use crate::parser::rules::ExtractionRules;

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:\d+(?:\.\d+)?|\.\d+)$").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct CreditsMatch {
    pub value: f64,
    /// Where the credits marker (value or label) begins; the name ends here.
    pub start: usize,
    /// Just past the marker; tags follow.
    pub end: usize,
}

/// Find the credits marker at or after `from` and parse its value.
///
/// Titles can contain the marker words themselves ("Consumer Credit"), so
/// every candidate is tried and the first numeric one wins. A non-numeric
/// value is only reported when no candidate parses.
pub fn extract(block: &str, from: usize, rules: &ExtractionRules) -> Result<CreditsMatch, ParseError> {
    let rest = &block[from..];
    let mut first_bad: Option<String> = None;

    for re in &rules.credit_markers {
        for caps in re.captures_iter(rest) {
            let (Some(whole), Some(value)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            match parse_value(value.as_str()) {
                Some(value) => {
                    return Ok(CreditsMatch {
                        value,
                        start: from + whole.start(),
                        end: from + whole.end(),
                    })
                }
                None => {
                    first_bad.get_or_insert_with(|| value.as_str().to_string());
                }
            }
        }
    }

    Err(ParseError::BadCredits(
        first_bad.unwrap_or_else(|| "no credits marker".to_string()),
    ))
}

fn parse_value(raw: &str) -> Option<f64> {
    if !NUMBER_RE.is_match(raw) {
        return None;
    }
    raw.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> &'static ExtractionRules {
        ExtractionRules::default_rules()
    }

    #[test]
    fn trailing_marker() {
        let block = "251 Art History-IS 5.0 Credits (eL,VLPA,IS)";
        let m = extract(block, 3, rules()).unwrap();
        assert_eq!(m.value, 5.0);
        assert_eq!(block[3..m.start].trim(), "Art History-IS");
        assert_eq!(&block[m.end..], " (eL,VLPA,IS)");
    }

    #[test]
    fn labeled_marker() {
        let block = "110 Intro to Music Credits: 3 (VLPA)";
        let m = extract(block, 3, rules()).unwrap();
        assert_eq!(m.value, 3.0);
        assert_eq!(block[3..m.start].trim(), "Intro to Music");
    }

    #[test]
    fn singular_and_short_markers() {
        assert_eq!(extract("100 Lab 1 Credit", 3, rules()).unwrap().value, 1.0);
        assert_eq!(extract("100 Lab 2.5 CR", 3, rules()).unwrap().value, 2.5);
    }

    #[test]
    fn missing_marker_is_bad_credits() {
        let err = extract("101 Drawing I", 3, rules()).unwrap_err();
        assert!(matches!(err, ParseError::BadCredits(_)));
    }

    #[test]
    fn non_numeric_value_is_bad_credits() {
        let err = extract("101 Drawing I TBA Credits", 3, rules()).unwrap_err();
        assert_eq!(err, ParseError::BadCredits("TBA".to_string()));

        let err = extract("199 Independent Study 1-5 Credits", 3, rules()).unwrap_err();
        assert_eq!(err, ParseError::BadCredits("1-5".to_string()));
    }

    #[test]
    fn marker_words_inside_title() {
        let block = "145 Consumer Credit 5.0 Credits (SS)";
        let m = extract(block, 3, rules()).unwrap();
        assert_eq!(m.value, 5.0);
        assert_eq!(block[3..m.start].trim(), "Consumer Credit");
        assert_eq!(&block[m.end..], " (SS)");

        let block = "110 Intro to CR Systems 3.0 Credits";
        let m = extract(block, 3, rules()).unwrap();
        assert_eq!(m.value, 3.0);
        assert_eq!(block[3..m.start].trim(), "Intro to CR Systems");
    }

    #[test]
    fn lowercase_marker() {
        assert_eq!(extract("101 Drawing I 5.0 credits", 3, rules()).unwrap().value, 5.0);
        assert_eq!(extract("101 Drawing I 2 cr", 3, rules()).unwrap().value, 2.0);
    }

    #[test]
    fn first_non_numeric_reported_when_nothing_parses() {
        let err = extract("145 Consumer Credit TBA Credits", 3, rules()).unwrap_err();
        assert_eq!(err, ParseError::BadCredits("Consumer".to_string()));
    }
}
