//! Site-specific extraction rules.
//!
//! The three colleges run the same schedule application, so today they share
//! one rule set; a college whose markup drifts gets its own entry in
//! [`ExtractionRules::for_college`].

use std::sync::LazyLock;

use regex::Regex;

use crate::record::College;

pub struct ExtractionRules {
    pub name: &'static str,
    /// Credit markers, tried in order. Group 1 captures the value loosely so a
    /// non-numeric value is reported as bad credits rather than missing; the
    /// first match with a numeric value wins.
    pub credit_markers: Vec<Regex>,
    pub prereq_label: Regex,
    pub coreq_label: Regex,
    /// Group 1 captures the delimited tag list after the label.
    pub tags_label: Regex,
}

static SEATTLE_COLLEGES: LazyLock<ExtractionRules> = LazyLock::new(|| ExtractionRules {
    name: "seattle-colleges",
    credit_markers: vec![
        Regex::new(r"(?i)\bCredits?:\s*([^\s()]+)").unwrap(),
        Regex::new(r"(?i)(?:^|[\s(])([^\s()]+)\s+(?:Credits?|CR)\b").unwrap(),
    ],
    prereq_label: Regex::new(r"(?i)\bPrereq(?:uisite)?s?:\s*").unwrap(),
    coreq_label: Regex::new(r"(?i)\bCoreq").unwrap(),
    tags_label: Regex::new(r"(?i)\bTags?:\s*([^.;]*)").unwrap(),
});

impl ExtractionRules {
    pub fn for_college(college: College) -> &'static ExtractionRules {
        match college {
            College::Central | College::North | College::South => &SEATTLE_COLLEGES,
        }
    }

    /// Rules used when no college context exists (e.g. the `check` command).
    pub fn default_rules() -> &'static ExtractionRules {
        &SEATTLE_COLLEGES
    }
}
