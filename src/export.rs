//! CSV sink: `College,Department,Code,Name,Credits,Tags,Prerequisites`.

use std::io::{Read, Write};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::record::{College, CourseRecord};

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "College")]
    college: String,
    #[serde(rename = "Department")]
    department: String,
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Credits")]
    credits: String,
    #[serde(rename = "Tags")]
    tags: String,
    #[serde(rename = "Prerequisites")]
    prerequisites: String,
}

impl From<&CourseRecord> for CsvRow {
    fn from(r: &CourseRecord) -> Self {
        CsvRow {
            college: r.college.to_string(),
            department: r.department.clone(),
            code: r.code.clone(),
            name: r.name.clone(),
            credits: r.display_credits(),
            tags: r.tags.join(","),
            prerequisites: r.prerequisites.join(","),
        }
    }
}

fn into_record(row: CsvRow) -> Result<CourseRecord> {
    let credits = row
        .credits
        .parse::<f64>()
        .with_context(|| format!("bad credits value {:?}", row.credits))?;
    Ok(CourseRecord {
        college: row.college.parse::<College>().map_err(|e| anyhow!(e))?,
        department: row.department,
        code: row.code,
        name: row.name,
        credits,
        tags: split_joined(&row.tags),
        prerequisites: split_joined(&row.prerequisites),
    })
}

fn split_joined(field: &str) -> Vec<String> {
    field
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Write the header and one row per record, in the given order.
///
/// Multi-entry tag and prerequisite fields contain commas and get quoted; an
/// empty list is an empty, unquoted field.
pub fn write_csv<W: Write>(records: &[CourseRecord], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    if records.is_empty() {
        writer.write_record([
            "College",
            "Department",
            "Code",
            "Name",
            "Credits",
            "Tags",
            "Prerequisites",
        ])?;
    }
    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }
    writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// Read records back from CSV produced by [`write_csv`].
pub fn read_csv<R: Read>(input: R) -> Result<Vec<CourseRecord>> {
    let mut reader = csv::Reader::from_reader(input);
    reader
        .deserialize::<CsvRow>()
        .map(|row| -> Result<CourseRecord> { into_record(row?) })
        .collect()
}
