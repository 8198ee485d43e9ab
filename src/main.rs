mod assemble;
mod config;
mod error;
mod export;
mod parser;
mod record;
mod run;
mod source;
mod walker;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use crate::assemble::RecordSet;
use crate::config::Settings;
use crate::parser::rules::ExtractionRules;
use crate::record::College;
use crate::run::RunSummary;
use crate::source::{LiveSource, PageSource, SnapshotSource};

#[derive(Parser)]
#[command(name = "sccourses", about = "Seattle Colleges course catalog to CSV")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct OutputArgs {
    /// Colleges to scrape (default: central, north, south)
    #[arg(short, long = "college")]
    colleges: Vec<College>,
    /// CSV destination (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Also write the run summary as JSON
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the live class schedule pages
    Run {
        #[command(flatten)]
        out: OutputArgs,
        /// Per-department expansion timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Scrape saved pages: <DIR>/<college>/[<QUARTER>/]index.html and <DEPT>.html
    Snapshot {
        #[arg(long)]
        dir: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Parse one raw course block and print its fields
    Check {
        block: String,
        /// Use this college's extraction rules (default: the shared rules)
        #[arg(short, long)]
        college: Option<College>,
    },
    /// Read back a CSV written by `run` or `snapshot` and count its rows
    Inspect { path: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let mut settings = Settings::load()?;

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_level.as_str().into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { out, timeout_secs } => {
            if let Some(secs) = timeout_secs {
                settings.expand_timeout_secs = secs;
            }
            let colleges = selected(&out.colleges);
            info!(colleges = colleges.len(), live = true, "starting run");
            let (records, summary) = run::run_all(
                &colleges,
                |college| Ok(Box::new(LiveSource::new(college, &settings)?) as Box<dyn PageSource>),
                settings.expand_timeout(),
                true,
            );
            finish(&out, records, &summary)
        }
        Commands::Snapshot { dir, out } => {
            let colleges = selected(&out.colleges);
            info!(colleges = colleges.len(), dir = %dir.display(), "starting snapshot run");
            let (records, summary) = run::run_all(
                &colleges,
                |college| Ok(Box::new(SnapshotSource::new(&dir, college)) as Box<dyn PageSource>),
                settings.expand_timeout(),
                true,
            );
            finish(&out, records, &summary)
        }
        Commands::Check { block, college } => {
            let rules = college
                .map(ExtractionRules::for_college)
                .unwrap_or_else(ExtractionRules::default_rules);
            match parser::parse_course(&block, rules) {
                Ok(p) => {
                    println!("Code:          {}", p.code);
                    println!("Name:          {}", p.name);
                    println!("Credits:       {:.1}", p.credits);
                    println!("Tags:          {}", p.tags.join(", "));
                    println!("Prerequisites: {}", p.prerequisites.join(", "));
                    Ok(())
                }
                Err(e) => Err(anyhow::anyhow!("{} ({})", e, e.kind())),
            }
        }
        Commands::Inspect { path } => inspect(&path),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn selected(colleges: &[College]) -> Vec<College> {
    if colleges.is_empty() {
        College::ALL.to_vec()
    } else {
        colleges.to_vec()
    }
}

fn finish(out: &OutputArgs, records: RecordSet, summary: &RunSummary) -> anyhow::Result<()> {
    if records.is_empty() {
        warn!("no courses extracted; writing header only");
    }
    let rows = records.len();
    let records = records.into_records();
    match &out.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            export::write_csv(&records, BufWriter::new(file))?;
            info!(path = %path.display(), rows, "wrote CSV");
        }
        None => export::write_csv(&records, io::stdout().lock())?,
    }

    summary.print();
    if let Some(path) = &out.summary_json {
        write_summary(path, summary)?;
    }
    Ok(())
}

/// Per-college row counts of a written CSV.
fn inspect(path: &Path) -> anyhow::Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let records = export::read_csv(BufReader::new(file))
        .with_context(|| format!("Failed to read {}", path.display()))?;
    for (college, count) in count_by_college(&records) {
        println!("{:<8} {}", college, count);
    }
    println!("Total:   {}", records.len());
    Ok(())
}

fn count_by_college(records: &[record::CourseRecord]) -> BTreeMap<College, usize> {
    let mut counts = BTreeMap::new();
    for r in records {
        *counts.entry(r.college).or_insert(0) += 1;
    }
    counts
}

fn write_summary(path: &Path, summary: &RunSummary) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary)
        .context("Failed to write run summary")?;
    Ok(())
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }

    #[test]
    fn cli_parses_repeated_colleges() {
        let cli = Cli::try_parse_from([
            "sccourses", "snapshot", "--dir", "snap", "--college", "north", "-c", "South", "-o", "out.csv",
        ])
        .unwrap();
        match cli.command {
            Commands::Snapshot { dir, out } => {
                assert_eq!(dir, PathBuf::from("snap"));
                assert_eq!(out.colleges, [College::North, College::South]);
                assert_eq!(out.output, Some(PathBuf::from("out.csv")));
            }
            _ => panic!("expected snapshot"),
        }
    }

    #[test]
    fn check_without_college_uses_shared_rules() {
        let cli = Cli::try_parse_from(["sccourses", "check", "251 Art History 5.0 Credits"]).unwrap();
        match cli.command {
            Commands::Check { college, .. } => assert_eq!(college, None),
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn counts_rows_of_a_written_csv() {
        let csv = "College,Department,Code,Name,Credits,Tags,Prerequisites\n\
                   Central,ART,251,Art History,5.0,,\n\
                   North,ART,101,Design,5.0,VLPA,\n\
                   Central,ENGL,101,Composition I,5.0,C,\n";
        let records = export::read_csv(csv.as_bytes()).unwrap();
        let counts = count_by_college(&records);
        assert_eq!(counts.get(&College::Central), Some(&2));
        assert_eq!(counts.get(&College::North), Some(&1));
        assert_eq!(counts.get(&College::South), None);
    }

    #[test]
    fn default_college_selection() {
        assert_eq!(selected(&[]), College::ALL.to_vec());
        assert_eq!(selected(&[College::South]), [College::South]);
    }
}
