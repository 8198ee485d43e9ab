use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{ExpansionError, SourceError};
use crate::parser::blocks::split_course_blocks;
use crate::source::{DepartmentId, PageSource};

/// Lifecycle of one department section during a walk.
///
/// `Collapsed → Expanding → Expanded` or `Collapsed → Expanding → ExpansionFailed`.
/// Both end states are terminal; there are no retries within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    Collapsed,
    Expanding,
    Expanded,
    ExpansionFailed,
}

impl SectionState {
    pub fn start_expanding(self) -> Self {
        match self {
            SectionState::Collapsed => SectionState::Expanding,
            other => other,
        }
    }

    pub fn finish(self, succeeded: bool) -> Self {
        match self {
            SectionState::Expanding if succeeded => SectionState::Expanded,
            SectionState::Expanding => SectionState::ExpansionFailed,
            other => other,
        }
    }
}

/// An expanded department and its raw course blocks, in page order.
#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentSection {
    pub department: DepartmentId,
    pub blocks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WalkOutcome {
    /// Expansion succeeded; `blocks` may legitimately be empty.
    Expanded(DepartmentSection),
    ExpansionFailed {
        department: DepartmentId,
        error: ExpansionError,
    },
}

impl WalkOutcome {
    pub fn department(&self) -> &DepartmentId {
        match self {
            WalkOutcome::Expanded(section) => &section.department,
            WalkOutcome::ExpansionFailed { department, .. } => department,
        }
    }
}

/// Lazily walks a college page one department at a time.
///
/// The department list is read once up front; each call to `next` expands a
/// single department and reads its blocks.
pub struct DepartmentWalker<'a, S: PageSource + ?Sized> {
    source: &'a mut S,
    departments: std::vec::IntoIter<DepartmentId>,
    timeout: Duration,
}

impl<'a, S: PageSource + ?Sized> DepartmentWalker<'a, S> {
    pub fn new(source: &'a mut S, timeout: Duration) -> Result<Self, SourceError> {
        let departments = source.list_departments()?;
        debug!(count = departments.len(), "listed departments");
        Ok(DepartmentWalker {
            source,
            departments: departments.into_iter(),
            timeout,
        })
    }

    /// Departments not yet walked.
    pub fn remaining(&self) -> usize {
        self.departments.len()
    }

    fn walk_one(&mut self, department: DepartmentId) -> WalkOutcome {
        let state = SectionState::Collapsed.start_expanding();
        debug!(department = %department, name = ?department.name, ?state, "expanding department");

        let result = self
            .source
            .expand(&department, self.timeout)
            .and_then(|()| self.source.read_expanded_text(&department));

        match result {
            Ok(text) => {
                let blocks = split_course_blocks(&text);
                debug!(
                    department = %department,
                    state = ?state.finish(true),
                    blocks = blocks.len(),
                    "department expanded"
                );
                WalkOutcome::Expanded(DepartmentSection { department, blocks })
            }
            Err(error) => {
                warn!(
                    department = %department,
                    state = ?state.finish(false),
                    error = %error,
                    "skipping department"
                );
                WalkOutcome::ExpansionFailed { department, error }
            }
        }
    }
}

impl<S: PageSource + ?Sized> Iterator for DepartmentWalker<'_, S> {
    type Item = WalkOutcome;

    fn next(&mut self) -> Option<WalkOutcome> {
        let department = self.departments.next()?;
        Some(self.walk_one(department))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.departments.size_hint()
    }
}

// ── Tests ──
