//! Page sources: the capability the walker drives to list, expand and read
//! department sections of one college's schedule page.

pub mod html;
pub mod live;
pub mod snapshot;

use std::fmt;
use std::time::Duration;

use crate::error::{ExpansionError, SourceError};

pub use live::LiveSource;
pub use snapshot::SnapshotSource;

/// One department entry on a college page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DepartmentId {
    /// Short code, e.g. "ART". Unique within one college.
    pub code: String,
    /// Display label from the page, if it shows one.
    pub name: Option<String>,
}

impl DepartmentId {
    pub fn new(code: impl Into<String>) -> Self {
        DepartmentId {
            code: code.into(),
            name: None,
        }
    }
}

impl fmt::Display for DepartmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// One option of a college page's quarter selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quarter {
    /// Selector value, e.g. "B562".
    pub code: String,
    /// Label shown on the page, e.g. "Fall 2025".
    pub name: String,
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() || self.name == self.code {
            f.write_str(&self.code)
        } else {
            write!(f, "{} ({})", self.name, self.code)
        }
    }
}

pub trait PageSource {
    /// Quarters offered by the college page, in selector order. Empty when
    /// the page has no quarter selector; its own listing is then walked.
    fn list_quarters(&mut self) -> Result<Vec<Quarter>, SourceError> {
        Ok(Vec::new())
    }

    /// Switch the page to `quarter`. Departments listed and expanded after
    /// this belong to that quarter.
    fn select_quarter(&mut self, quarter: &Quarter) -> Result<(), SourceError> {
        let _ = quarter;
        Ok(())
    }

    /// Department entries in page order.
    fn list_departments(&mut self) -> Result<Vec<DepartmentId>, SourceError>;

    /// Expand one department, waiting at most `timeout` for its content.
    /// Expanding an already expanded department is a no-op.
    fn expand(&mut self, dept: &DepartmentId, timeout: Duration) -> Result<(), ExpansionError>;

    /// Rendered text of an expanded department; courses separated by blank lines.
    fn read_expanded_text(&self, dept: &DepartmentId) -> Result<String, ExpansionError>;
}
