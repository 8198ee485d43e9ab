use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::AssembleError;
use crate::parser::ParsedCourse;
use crate::record::{College, CourseRecord, RecordKey};

/// Where an assembled record ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    New,
    /// Same key already seen in the current quarter; kept and counted.
    Duplicate,
    /// Same key already seen in an earlier quarter of the run; merged.
    EarlierQuarter,
}

/// Output accumulator owned by the run driver.
///
/// Within one quarter, duplicate `(college, department, code)` keys are kept
/// and counted, never dropped. A course offered again in a later quarter is
/// the same catalog entry and is merged into the first one.
#[derive(Debug, Default)]
pub struct RecordSet {
    records: Vec<CourseRecord>,
    keys: HashSet<RecordKey>,
    quarter_keys: HashSet<RecordKey>,
    duplicates: Vec<RecordKey>,
    quarter_repeats: usize,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new quarter: keys seen so far become "earlier quarter" keys.
    pub fn begin_quarter(&mut self) {
        self.quarter_keys.clear();
    }

    pub fn push(&mut self, record: CourseRecord) -> Placement {
        let key = record.key();
        if !self.quarter_keys.insert(key.clone()) {
            warn!(course = %key, "duplicate course in run");
            self.duplicates.push(key);
            self.records.push(record);
            return Placement::Duplicate;
        }
        if !self.keys.insert(key.clone()) {
            debug!(course = %key, "course already listed in an earlier quarter");
            self.quarter_repeats += 1;
            return Placement::EarlierQuarter;
        }
        self.records.push(record);
        Placement::New
    }

    pub fn records(&self) -> &[CourseRecord] {
        &self.records
    }

    pub fn duplicates(&self) -> &[RecordKey] {
        &self.duplicates
    }

    pub fn quarter_repeats(&self) -> usize {
        self.quarter_repeats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<CourseRecord> {
        self.records
    }
}

/// Build a finished record from parsed fields and append it to `out`.
pub fn assemble(
    college: College,
    department: &str,
    parsed: ParsedCourse,
    out: &mut RecordSet,
) -> Result<Placement, AssembleError> {
    let record = build(college, department, parsed)?;
    Ok(out.push(record))
}

fn build(college: College, department: &str, parsed: ParsedCourse) -> Result<CourseRecord, AssembleError> {
    let department = required("department", department)?;
    let code = required("code", &parsed.code)?;
    let name = required("name", &parsed.name)?;

    if !parsed.credits.is_finite() || parsed.credits < 0.0 {
        return Err(AssembleError::InvalidCredits(parsed.credits));
    }

    Ok(CourseRecord {
        college,
        department,
        code,
        name,
        credits: parsed.credits,
        tags: clean_list(parsed.tags),
        prerequisites: clean_list(parsed.prerequisites),
    })
}

fn required(field: &'static str, value: &str) -> Result<String, AssembleError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AssembleError::EmptyField(field));
    }
    Ok(value.to_string())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(code: &str, name: &str, credits: f64) -> ParsedCourse {
        ParsedCourse {
            code: code.into(),
            name: name.into(),
            credits,
            tags: vec![" eL ".into(), "".into(), "VLPA".into()],
            prerequisites: vec!["  ".into(), "ENGL&101".into()],
        }
    }

    #[test]
    fn trims_and_cleans() {
        let mut out = RecordSet::new();
        assemble(College::Central, " ART ", parsed(" 251 ", " Art History ", 5.0), &mut out).unwrap();
        let r = &out.records()[0];
        assert_eq!(r.department, "ART");
        assert_eq!(r.code, "251");
        assert_eq!(r.name, "Art History");
        assert_eq!(r.tags, ["eL", "VLPA"]);
        assert_eq!(r.prerequisites, ["ENGL&101"]);
    }

    #[test]
    fn keeps_true_credit_value() {
        let mut out = RecordSet::new();
        assemble(College::North, "MUSC", parsed("105", "Piano", 2.67), &mut out).unwrap();
        assert_eq!(out.records()[0].credits, 2.67);
        assert_eq!(out.records()[0].display_credits(), "2.7");
    }

    #[test]
    fn rejects_empty_required_fields() {
        let mut out = RecordSet::new();
        assert_eq!(
            assemble(College::North, "ART", parsed("101", "   ", 5.0), &mut out),
            Err(AssembleError::EmptyField("name"))
        );
        assert_eq!(
            assemble(College::North, "", parsed("101", "Design", 5.0), &mut out),
            Err(AssembleError::EmptyField("department"))
        );
        assert!(out.is_empty());
    }

    #[test]
    fn rejects_invalid_credits() {
        let mut out = RecordSet::new();
        let err = assemble(College::South, "ART", parsed("101", "Design", -1.0), &mut out);
        assert_eq!(err, Err(AssembleError::InvalidCredits(-1.0)));
        let err = assemble(College::South, "ART", parsed("101", "Design", f64::NAN), &mut out);
        assert!(matches!(err, Err(AssembleError::InvalidCredits(_))));
    }

    #[test]
    fn duplicates_surfaced_not_dropped() {
        let mut out = RecordSet::new();
        assemble(College::North, "ART", parsed("101", "Design", 5.0), &mut out).unwrap();
        assemble(College::North, "ART", parsed("101", "Design", 5.0), &mut out).unwrap();
        assemble(College::South, "ART", parsed("101", "Design", 5.0), &mut out).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out.duplicates().len(), 1);
        assert_eq!(out.duplicates()[0].to_string(), "North/ART 101");
    }

    #[test]
    fn later_quarters_merge_into_first_listing() {
        let mut out = RecordSet::new();
        out.begin_quarter();
        let first = assemble(College::Central, "ART", parsed("251", "Art History", 5.0), &mut out);
        assert_eq!(first, Ok(Placement::New));

        out.begin_quarter();
        let again = assemble(College::Central, "ART", parsed("251", "Art History", 5.0), &mut out);
        assert_eq!(again, Ok(Placement::EarlierQuarter));
        let fresh = assemble(College::Central, "ART", parsed("115", "Ceramics", 5.0), &mut out);
        assert_eq!(fresh, Ok(Placement::New));
        let dup = assemble(College::Central, "ART", parsed("115", "Ceramics", 5.0), &mut out);
        assert_eq!(dup, Ok(Placement::Duplicate));

        assert_eq!(out.len(), 3);
        assert_eq!(out.quarter_repeats(), 1);
        assert_eq!(out.duplicates().len(), 1);
        let codes: Vec<String> = out.into_records().into_iter().map(|r| r.code).collect();
        assert_eq!(codes, ["251", "115", "115"]);
    }
}
