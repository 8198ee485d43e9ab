use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum College {
    Central,
    North,
    South,
}

impl College {
    pub const ALL: [College; 3] = [College::Central, College::North, College::South];

    pub fn base_url(self) -> &'static str {
        match self {
            College::Central => "https://mycentral.seattlecolleges.edu/",
            College::North => "https://mynorth.seattlecolleges.edu/",
            College::South => "https://mysouth.seattlecolleges.edu/",
        }
    }

    /// Lowercase key used for snapshot directories and config tables.
    pub fn key(self) -> &'static str {
        match self {
            College::Central => "central",
            College::North => "north",
            College::South => "south",
        }
    }
}

impl fmt::Display for College {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            College::Central => "Central",
            College::North => "North",
            College::South => "South",
        };
        f.write_str(name)
    }
}

impl FromStr for College {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "central" => Ok(College::Central),
            "north" => Ok(College::North),
            "south" => Ok(College::South),
            other => Err(format!("unknown college: {other}")),
        }
    }
}

/// One finished course row. Never mutated after assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseRecord {
    pub college: College,
    pub department: String,
    pub code: String,
    pub name: String,
    /// True parsed value; [`CourseRecord::display_credits`] rounds for output.
    pub credits: f64,
    pub tags: Vec<String>,
    pub prerequisites: Vec<String>,
}

/// Course identity within one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub college: College,
    pub department: String,
    pub code: String,
}

impl CourseRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            college: self.college,
            department: self.department.clone(),
            code: self.code.clone(),
        }
    }

    pub fn display_credits(&self) -> String {
        format!("{:.1}", self.credits)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {}", self.college, self.department, self.code)
    }
}
