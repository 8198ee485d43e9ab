//! Reading the schedule application's rendered markup.
//!
//! Quarter selector: `#quarterSelector option`, value is the quarter code.
//! Department index: `#departments li`, one item per department.
//! Expanded department: `#courseListHolder > div > div`, one node per course
//! with `.courseID`, `.courseTitle`, `.courseCredits`, `.classTags a` and
//! `.courseDescription` children.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::{DepartmentId, Quarter};
use crate::error::SourceError;
use crate::parser::blocks::normalize_whitespace;

static QUARTER_OPTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#quarterSelector option").unwrap());
static DEPARTMENTS_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("#departments").unwrap());
static DEPARTMENT_ITEM_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());
static COURSE_LIST_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#courseListHolder").unwrap());
static COURSE_NODE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#courseListHolder > div > div").unwrap());
static COURSE_ID_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".courseID").unwrap());
static COURSE_TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".courseTitle").unwrap());
static COURSE_CREDITS_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".courseCredits").unwrap());
static TAG_LINK_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".classTags a").unwrap());
static DESCRIPTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".courseDescription").unwrap());

static DEPT_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([A-Z][A-Z&]*)\b").unwrap());
static PREREQ_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bPrereq").unwrap());
static CREDITS_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*(?:credits?|cr)\.?$").unwrap());

/// Quarter selector options in page order; empty when the page has none.
pub fn parse_quarters(html: &str) -> Vec<Quarter> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();

    document
        .select(&QUARTER_OPTION_SEL)
        .filter_map(|option| {
            let name = element_text(option);
            let code = option
                .value()
                .attr("value")
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| name.clone());
            if code.is_empty() || !seen.insert(code.clone()) {
                debug!(name = %name, "skipping quarter option");
                return None;
            }
            Some(Quarter { code, name })
        })
        .collect()
}

/// Department entries of a college index page, in page order.
pub fn parse_departments(html: &str) -> Result<Vec<DepartmentId>, SourceError> {
    let document = Html::parse_document(html);
    let list = document
        .select(&DEPARTMENTS_SEL)
        .next()
        .ok_or(SourceError::NoDepartmentList)?;

    let mut seen = HashSet::new();
    let mut departments = Vec::new();

    for item in list.select(&DEPARTMENT_ITEM_SEL) {
        let label = element_text(item);
        let code = item
            .value()
            .attr("data-dept")
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .or_else(|| DEPT_CODE_RE.captures(&label).map(|c| c[1].to_string()));

        let Some(code) = code else {
            warn!(label = %label, "department entry without a code");
            continue;
        };
        if !seen.insert(code.clone()) {
            warn!(code = %code, "department listed twice; keeping the first entry");
            continue;
        }

        let name = Some(label).filter(|l| !l.is_empty() && *l != code);
        departments.push(DepartmentId {
            name,
            ..DepartmentId::new(code)
        });
    }

    debug!(count = departments.len(), "parsed department list");
    Ok(departments)
}

/// Render an expanded department page as raw course blocks separated by a
/// blank line. `None` when the course list has not materialized.
pub fn render_course_list(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document.select(&COURSE_LIST_SEL).next()?;

    let blocks: Vec<String> = document
        .select(&COURSE_NODE_SEL)
        .map(render_course)
        .filter(|b| !b.is_empty())
        .collect();

    Some(blocks.join("\n\n"))
}

/// "<id> <title> <credits> Credits (<tags>) <prerequisite sentence>"
fn render_course(node: ElementRef) -> String {
    let mut parts = Vec::new();

    let id = child_text(node, &COURSE_ID_SEL);
    let title = child_text(node, &COURSE_TITLE_SEL);
    let credits = child_text(node, &COURSE_CREDITS_SEL);
    parts.push(id);
    parts.push(title);

    let credits = CREDITS_SUFFIX_RE.replace(&credits, "").trim().to_string();
    if !credits.is_empty() {
        parts.push(format!("{} Credits", credits));
    }

    let tags: Vec<String> = node
        .select(&TAG_LINK_SEL)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect();
    if !tags.is_empty() {
        parts.push(format!("({})", tags.join(",")));
    }

    let description = child_text(node, &DESCRIPTION_SEL);
    if let Some(m) = PREREQ_RE.find(&description) {
        parts.push(description[m.start()..].to_string());
    }

    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn child_text(node: ElementRef, selector: &Selector) -> String {
    node.select(selector)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

fn element_text(node: ElementRef) -> String {
    normalize_whitespace(&node.text().collect::<String>())
}
