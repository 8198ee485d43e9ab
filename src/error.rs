//! Error kinds for the extraction pipeline.
//!
//! None of these are fatal to a run: a `ParseError` or `AssembleError` skips
//! one course, an `ExpansionError` skips one department and a `SourceError`
//! skips one college.

use std::time::Duration;

/// Failure to turn a raw course block into fields.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("no course code found")]
    NoCodeFound,
    #[error("bad credits: {0}")]
    BadCredits(String),
}

impl ParseError {
    /// Short label used for summary counters and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::NoCodeFound => "no_code",
            ParseError::BadCredits(_) => "bad_credits",
        }
    }
}

/// Failure to expand one department section.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpansionError {
    #[error("expansion timed out after {0:?}")]
    Timeout(Duration),
    #[error("department content unavailable: {0}")]
    Unavailable(String),
    #[error("page load failed: {0}")]
    Load(String),
}

/// Failure to read the quarters or departments of a college page.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to load college page {url}: {reason}")]
    PageLoad { url: String, reason: String },
    #[error("failed to read snapshot {path}")]
    Snapshot {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("department list not found on page")]
    NoDepartmentList,
    #[error("cannot select quarter {quarter}: {reason}")]
    Quarter { quarter: String, reason: String },
}

/// A parsed course that cannot become a valid record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssembleError {
    #[error("required field `{0}` is empty")]
    EmptyField(&'static str),
    #[error("credits must be a finite non-negative number, got {0}")]
    InvalidCredits(f64),
}
