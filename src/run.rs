use std::time::Duration;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::assemble::{assemble, Placement, RecordSet};
use crate::error::{ParseError, SourceError};
use crate::parser::parse_course;
use crate::parser::rules::ExtractionRules;
use crate::record::College;
use crate::source::{PageSource, Quarter};
use crate::walker::{DepartmentWalker, WalkOutcome};

/// What one college contributed, and what it had to leave out.
#[derive(Debug, Clone, Serialize)]
pub struct CollegeSummary {
    pub college: College,
    /// Set when the college page itself could not be read.
    pub listing_failed: Option<String>,
    /// Quarter codes walked, in selector order; empty for a page without one.
    pub quarters: Vec<String>,
    /// "<quarter>: <reason>" per quarter whose listing failed.
    pub skipped_quarters: Vec<String>,
    pub departments_attempted: usize,
    pub departments_succeeded: usize,
    pub departments_skipped: usize,
    pub departments_empty: usize,
    pub courses_parsed: usize,
    pub skipped_no_code: usize,
    pub skipped_bad_credits: usize,
    pub rejected: usize,
    /// Courses already listed by an earlier quarter, merged into that record.
    pub quarter_repeats: usize,
    /// "<DEPT>: <reason>" per skipped department.
    pub skipped_departments: Vec<String>,
}

impl CollegeSummary {
    fn new(college: College) -> Self {
        CollegeSummary {
            college,
            listing_failed: None,
            quarters: Vec::new(),
            skipped_quarters: Vec::new(),
            departments_attempted: 0,
            departments_succeeded: 0,
            departments_skipped: 0,
            departments_empty: 0,
            courses_parsed: 0,
            skipped_no_code: 0,
            skipped_bad_credits: 0,
            rejected: 0,
            quarter_repeats: 0,
            skipped_departments: Vec::new(),
        }
    }

    pub fn courses_skipped(&self) -> usize {
        self.skipped_no_code + self.skipped_bad_credits + self.rejected
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub colleges: Vec<CollegeSummary>,
    pub duplicates: usize,
    pub quarter_repeats: usize,
}

impl RunSummary {
    pub fn departments_attempted(&self) -> usize {
        self.colleges.iter().map(|c| c.departments_attempted).sum()
    }

    pub fn departments_succeeded(&self) -> usize {
        self.colleges.iter().map(|c| c.departments_succeeded).sum()
    }

    pub fn departments_skipped(&self) -> usize {
        self.colleges.iter().map(|c| c.departments_skipped).sum()
    }

    pub fn courses_parsed(&self) -> usize {
        self.colleges.iter().map(|c| c.courses_parsed).sum()
    }

    pub fn courses_skipped(&self) -> usize {
        self.colleges.iter().map(CollegeSummary::courses_skipped).sum()
    }

    /// Human-readable report; stdout may be carrying the CSV, so stderr.
    pub fn print(&self) {
        for c in &self.colleges {
            if let Some(reason) = &c.listing_failed {
                eprintln!("{:<8} skipped: {}", c.college, reason);
                continue;
            }
            eprintln!(
                "{:<8} departments {} ({} ok, {} empty, {} skipped) | courses {} parsed, {} skipped ({} no code, {} bad credits, {} rejected)",
                c.college,
                c.departments_attempted,
                c.departments_succeeded,
                c.departments_empty,
                c.departments_skipped,
                c.courses_parsed,
                c.courses_skipped(),
                c.skipped_no_code,
                c.skipped_bad_credits,
                c.rejected,
            );
            if !c.quarters.is_empty() {
                eprintln!(
                    "    quarters {} ({} courses repeated from an earlier quarter)",
                    c.quarters.join(", "),
                    c.quarter_repeats
                );
            }
            for q in &c.skipped_quarters {
                eprintln!("    skipped quarter {}", q);
            }
            for d in &c.skipped_departments {
                eprintln!("    skipped {}", d);
            }
        }
        eprintln!(
            "Total: {} departments ({} ok, {} skipped), {} courses ({} skipped), {} duplicates, {} merged across quarters.",
            self.departments_attempted(),
            self.departments_succeeded(),
            self.departments_skipped(),
            self.courses_parsed(),
            self.courses_skipped(),
            self.duplicates,
            self.quarter_repeats,
        );
    }
}

/// Walk one college page and append its records to `records`.
///
/// Every quarter in the page's selector is walked in turn; a page without a
/// selector is walked once as it is. Never fails: a college whose page cannot
/// be read comes back with `listing_failed` set, a quarter whose department
/// list fails is recorded in `skipped_quarters`, and per-department and
/// per-course failures are counted and skipped.
pub fn run_college<S: PageSource + ?Sized>(
    college: College,
    source: &mut S,
    timeout: Duration,
    records: &mut RecordSet,
    pb: &ProgressBar,
) -> CollegeSummary {
    let mut summary = CollegeSummary::new(college);

    let quarters = match source.list_quarters() {
        Ok(q) => q,
        Err(e) => {
            error!(college = %college, error = %e, "cannot read college page; skipping college");
            summary.listing_failed = Some(e.to_string());
            return summary;
        }
    };

    if quarters.is_empty() {
        records.begin_quarter();
        if let Err(e) = walk_departments(college, None, source, timeout, records, pb, &mut summary) {
            error!(college = %college, error = %e, "cannot list departments; skipping college");
            summary.listing_failed = Some(e.to_string());
            return summary;
        }
    } else {
        for quarter in &quarters {
            let walked = source.select_quarter(quarter).and_then(|()| {
                records.begin_quarter();
                walk_departments(college, Some(quarter), source, timeout, records, pb, &mut summary)
            });
            match walked {
                Ok(()) => summary.quarters.push(quarter.code.clone()),
                Err(e) => {
                    warn!(college = %college, quarter = %quarter, error = %e, "skipping quarter");
                    summary.skipped_quarters.push(format!("{}: {}", quarter, e));
                }
            }
        }
        if summary.quarters.is_empty() {
            error!(college = %college, "no quarter could be listed; skipping college");
            summary.listing_failed = Some(format!("all {} quarters failed to list", quarters.len()));
            return summary;
        }
    }

    info!(
        college = %college,
        quarters = summary.quarters.len(),
        parsed = summary.courses_parsed,
        repeats = summary.quarter_repeats,
        skipped = summary.courses_skipped(),
        departments_skipped = summary.departments_skipped,
        "college done"
    );
    summary
}

/// One pass over the departments currently listed by `source`.
fn walk_departments<S: PageSource + ?Sized>(
    college: College,
    quarter: Option<&Quarter>,
    source: &mut S,
    timeout: Duration,
    records: &mut RecordSet,
    pb: &ProgressBar,
    summary: &mut CollegeSummary,
) -> Result<(), SourceError> {
    let rules = ExtractionRules::for_college(college);
    let walker = DepartmentWalker::new(source, timeout)?;

    let label = match quarter {
        Some(q) => format!("{} {}", college, q.code),
        None => college.to_string(),
    };
    info!(college = %college, quarter = ?quarter.map(|q| q.code.as_str()), departments = walker.remaining(), rules = rules.name, "walking departments");
    pb.set_length(walker.remaining() as u64);
    pb.set_position(0);

    for outcome in walker {
        pb.set_message(format!("{} {}", label, outcome.department()));
        summary.departments_attempted += 1;
        match outcome {
            WalkOutcome::Expanded(section) => {
                summary.departments_succeeded += 1;
                if section.blocks.is_empty() {
                    summary.departments_empty += 1;
                    info!(college = %college, department = %section.department, "department has no courses");
                }
                for block in &section.blocks {
                    let parsed = match parse_course(block, rules) {
                        Ok(p) => p,
                        Err(e) => {
                            warn!(
                                college = %college,
                                department = %section.department,
                                kind = e.kind(),
                                error = %e,
                                block = %block,
                                "skipping course block"
                            );
                            match e {
                                ParseError::NoCodeFound => summary.skipped_no_code += 1,
                                ParseError::BadCredits(_) => summary.skipped_bad_credits += 1,
                            }
                            continue;
                        }
                    };
                    match assemble(college, &section.department.code, parsed, records) {
                        Ok(placement) => {
                            summary.courses_parsed += 1;
                            if placement == Placement::EarlierQuarter {
                                summary.quarter_repeats += 1;
                            }
                        }
                        Err(e) => {
                            warn!(
                                college = %college,
                                department = %section.department,
                                error = %e,
                                block = %block,
                                "rejecting course"
                            );
                            summary.rejected += 1;
                        }
                    }
                }
            }
            WalkOutcome::ExpansionFailed { department, error } => {
                summary.departments_skipped += 1;
                let prefix = quarter.map(|q| format!("{} ", q.code)).unwrap_or_default();
                summary
                    .skipped_departments
                    .push(format!("{}{}: {}", prefix, department, error));
            }
        }
        pb.inc(1);
    }
    Ok(())
}

/// Run every college in order. `open` builds the page source for a college;
/// a college whose source cannot be opened is reported and skipped.
pub fn run_all<F>(
    colleges: &[College],
    mut open: F,
    timeout: Duration,
    show_progress: bool,
) -> (RecordSet, RunSummary)
where
    F: FnMut(College) -> anyhow::Result<Box<dyn PageSource>>,
{
    let started_at = Utc::now();
    let mut records = RecordSet::new();
    let mut summaries = Vec::with_capacity(colleges.len());

    let pb = if show_progress {
        let pb = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {msg:8} [{bar:40.cyan/blue}] {pos}/{len}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    for &college in colleges {
        let summary = match open(college) {
            Ok(mut source) => run_college(college, source.as_mut(), timeout, &mut records, &pb),
            Err(e) => {
                error!(college = %college, error = %e, "cannot open page source; skipping college");
                let mut summary = CollegeSummary::new(college);
                summary.listing_failed = Some(e.to_string());
                summary
            }
        };
        summaries.push(summary);
    }
    pb.finish_and_clear();

    let summary = RunSummary {
        started_at,
        colleges: summaries,
        duplicates: records.duplicates().len(),
        quarter_repeats: records.quarter_repeats(),
    };
    (records, summary)
}

// ── Tests ──
