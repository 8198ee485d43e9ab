use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use super::{html, DepartmentId, PageSource, Quarter};
use crate::error::{ExpansionError, SourceError};
use crate::record::College;

/// Saved, already rendered pages of one college:
/// `<root>/<college>/index.html` and `<root>/<college>/<DEPT>.html`.
///
/// When the college index carries a quarter selector, each quarter's pages
/// live one level down, in `<root>/<college>/<QUARTER>/`.
pub struct SnapshotSource {
    college_dir: PathBuf,
    dir: PathBuf,
    expanded: HashMap<String, String>,
}

impl SnapshotSource {
    pub fn new(root: &Path, college: College) -> Self {
        let college_dir = root.join(college.key());
        SnapshotSource {
            dir: college_dir.clone(),
            college_dir,
            expanded: HashMap::new(),
        }
    }

    fn department_path(&self, dept: &DepartmentId) -> PathBuf {
        self.dir.join(format!("{}.html", dept.code))
    }
}

fn read_index(dir: &Path) -> Result<String, SourceError> {
    let path = dir.join("index.html");
    std::fs::read_to_string(&path).map_err(|source| SourceError::Snapshot {
        path: path.display().to_string(),
        source,
    })
}

impl PageSource for SnapshotSource {
    fn list_quarters(&mut self) -> Result<Vec<Quarter>, SourceError> {
        Ok(html::parse_quarters(&read_index(&self.college_dir)?))
    }

    fn select_quarter(&mut self, quarter: &Quarter) -> Result<(), SourceError> {
        let plain = Path::new(&quarter.code)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if quarter.code.is_empty() || !plain {
            return Err(SourceError::Quarter {
                quarter: quarter.code.clone(),
                reason: "not a plain directory name".to_string(),
            });
        }
        self.dir = self.college_dir.join(&quarter.code);
        self.expanded.clear();
        debug!(quarter = %quarter, dir = %self.dir.display(), "selected snapshot quarter");
        Ok(())
    }

    fn list_departments(&mut self) -> Result<Vec<DepartmentId>, SourceError> {
        html::parse_departments(&read_index(&self.dir)?)
    }

    fn expand(&mut self, dept: &DepartmentId, timeout: Duration) -> Result<(), ExpansionError> {
        if self.expanded.contains_key(&dept.code) {
            return Ok(());
        }

        let path = self.department_path(dept);
        let page = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ExpansionError::Unavailable(path.display().to_string()),
            _ => ExpansionError::Load(format!("{}: {}", path.display(), e)),
        })?;

        // A saved page without the course list never finished loading.
        let text = html::render_course_list(&page).ok_or(ExpansionError::Timeout(timeout))?;
        debug!(department = %dept, path = %path.display(), "expanded from snapshot");
        self.expanded.insert(dept.code.clone(), text);
        Ok(())
    }

    fn read_expanded_text(&self, dept: &DepartmentId) -> Result<String, ExpansionError> {
        self.expanded
            .get(&dept.code)
            .cloned()
            .ok_or_else(|| ExpansionError::Unavailable(format!("{} is not expanded", dept.code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn fixtures() -> SnapshotSource {
        let mut source = SnapshotSource::new(Path::new("tests/fixtures/snapshots"), College::Central);
        source.select_quarter(&quarter("B562")).unwrap();
        source
    }

    fn quarter(code: &str) -> Quarter {
        Quarter {
            code: code.into(),
            name: String::new(),
        }
    }

    #[test]
    fn lists_fixture_quarters() {
        let mut source = SnapshotSource::new(Path::new("tests/fixtures/snapshots"), College::Central);
        let quarters = source.list_quarters().unwrap();
        let codes: Vec<&str> = quarters.iter().map(|q| q.code.as_str()).collect();
        assert_eq!(codes, ["B562", "B563", "B564"]);
        assert_eq!(quarters[0].name, "Fall 2025");
    }

    #[test]
    fn college_without_quarters_uses_its_own_pages() {
        let mut source = SnapshotSource::new(Path::new("tests/fixtures/snapshots"), College::North);
        assert!(source.list_quarters().unwrap().is_empty());
        let depts = source.list_departments().unwrap();
        assert_eq!(depts.len(), 1);
        source.expand(&depts[0], TIMEOUT).unwrap();
    }

    #[test]
    fn lists_fixture_departments() {
        let mut source = fixtures();
        let codes: Vec<String> = source
            .list_departments()
            .unwrap()
            .into_iter()
            .map(|d| d.code)
            .collect();
        assert_eq!(codes, ["ART", "ENGL", "ESL", "MATH", "MUSC"]);
    }

    #[test]
    fn selecting_a_quarter_switches_pages() {
        let mut source = fixtures();
        let art = DepartmentId::new("ART");
        source.expand(&art, TIMEOUT).unwrap();
        assert!(source.read_expanded_text(&art).unwrap().contains("ART 110"));

        source.select_quarter(&quarter("B563")).unwrap();
        assert!(source.read_expanded_text(&art).is_err());
        assert_eq!(source.list_departments().unwrap().len(), 1);
        source.expand(&art, TIMEOUT).unwrap();
        let text = source.read_expanded_text(&art).unwrap();
        assert!(text.contains("ART 115"));
        assert!(!text.contains("ART 110"));
    }

    #[test]
    fn quarter_without_pages() {
        let mut source = fixtures();
        source.select_quarter(&quarter("B564")).unwrap();
        assert!(matches!(source.list_departments(), Err(SourceError::Snapshot { .. })));
    }

    #[test]
    fn quarter_code_must_be_a_plain_name() {
        let mut source = fixtures();
        for code in ["../north", "", "/tmp"] {
            assert!(matches!(
                source.select_quarter(&quarter(code)),
                Err(SourceError::Quarter { .. })
            ));
        }
    }

    #[test]
    fn expand_is_idempotent() {
        let mut source = fixtures();
        let art = DepartmentId::new("ART");
        source.expand(&art, TIMEOUT).unwrap();
        let first = source.read_expanded_text(&art).unwrap();
        source.expand(&art, TIMEOUT).unwrap();
        assert_eq!(source.read_expanded_text(&art).unwrap(), first);
        assert!(first.starts_with("ART 251 "));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let mut source = fixtures();
        let err = source.expand(&DepartmentId::new("MUSC"), TIMEOUT).unwrap_err();
        assert!(matches!(err, ExpansionError::Unavailable(_)));
    }

    #[test]
    fn page_without_course_list_times_out() {
        let mut source = fixtures();
        let err = source.expand(&DepartmentId::new("MATH"), TIMEOUT).unwrap_err();
        assert_eq!(err, ExpansionError::Timeout(TIMEOUT));
    }

    #[test]
    fn read_before_expand() {
        let source = fixtures();
        assert!(source.read_expanded_text(&DepartmentId::new("ART")).is_err());
    }

    #[test]
    fn missing_college_directory() {
        let mut source = SnapshotSource::new(Path::new("tests/fixtures/snapshots"), College::South);
        assert!(matches!(source.list_quarters(), Err(SourceError::Snapshot { .. })));
        assert!(matches!(source.list_departments(), Err(SourceError::Snapshot { .. })));
    }
}
