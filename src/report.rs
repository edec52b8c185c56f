//! Summary-log parsing and report rendering
//!
//! A small line-oriented state machine turns the append-only summary
//! log into per-suite counters. Anything the sessions never finished is
//! read conservatively: a suite without its `Complete!` marker is
//! incomplete no matter what its counters say.

use std::path::Path;

use serde::Serialize;

use crate::common::{Error, Result};

pub const TOTAL_SUITE: &str = "TOTAL";

/// Derived per-suite counters; never persisted independently
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteReport {
    pub name: String,
    pub passed: u32,
    pub failed: u32,
    pub complete: bool,
}

impl SuiteReport {
    fn new(name: String) -> Self {
        Self {
            name,
            passed: 0,
            failed: 0,
            complete: false,
        }
    }
}

/// Structured form of one summary log
#[derive(Debug, Default)]
pub struct Report {
    /// Suites in log order, without the TOTAL pseudo-suite
    pub suites: Vec<SuiteReport>,
    /// Captured `!!! ` failure-context lines, in log order
    pub failures: Vec<String>,
}

impl Report {
    /// Parse a summary log. Outcome lines belong to the most recently
    /// opened suite; lines before any `new_suite:` marker belong to no
    /// suite and only their failure context is kept.
    pub fn parse(text: &str) -> Self {
        let mut report = Report::default();
        for line in text.lines() {
            if let Some(raw) = line.strip_prefix("new_suite: ") {
                report.suites.push(SuiteReport::new(display_name(raw)));
            } else if line.starts_with("True") {
                if let Some(suite) = report.suites.last_mut() {
                    suite.passed += 1;
                }
            } else if line.starts_with("False") {
                if let Some(suite) = report.suites.last_mut() {
                    suite.failed += 1;
                }
            } else if line.starts_with("Complete!") {
                if let Some(suite) = report.suites.last_mut() {
                    suite.complete = true;
                }
            } else if line.starts_with("!!! ") {
                report.failures.push(line.to_string());
            }
        }
        report
    }

    /// Aggregate pseudo-suite: counters summed, completeness ANDed
    pub fn total(&self) -> SuiteReport {
        let mut total = SuiteReport::new(TOTAL_SUITE.to_string());
        total.complete = true;
        for suite in &self.suites {
            total.passed += suite.passed;
            total.failed += suite.failed;
            total.complete &= suite.complete;
        }
        total
    }

    /// Fixed-width table with all captured failure contexts up front
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.failures {
            out.push_str(line);
            out.push('\n');
        }

        out.push('\n');
        out.push_str("=======================================\n");
        out.push_str(&format!(
            "{:15} {:6} {:6} {:9}\n",
            "Test suite", "Pass", "Fail", "Completed"
        ));
        out.push_str("---------------------------------------\n");
        for suite in &self.suites {
            out.push_str(&render_row(suite));
        }
        out.push('\n');
        out.push_str(&render_row(&self.total()));
        out.push_str("=======================================\n");
        out
    }

    /// Suites plus the TOTAL pseudo-suite as JSON
    pub fn to_json(&self) -> Result<String> {
        let mut suites = self.suites.clone();
        suites.push(self.total());
        Ok(serde_json::to_string_pretty(&suites)?)
    }
}

fn render_row(suite: &SuiteReport) -> String {
    format!(
        "{:15} {:>4}   {:>4}   {:>9}\n",
        suite.name, suite.passed, suite.failed, suite.complete
    )
}

/// Qualified suite names drop their leading path segments
fn display_name(raw: &str) -> String {
    let token = raw.split_whitespace().last().unwrap_or(raw);
    match token.rsplit("::").next() {
        Some(last) if !last.is_empty() => last.to_string(),
        _ => token.to_string(),
    }
}

/// Entry point of the `report` subcommand
pub fn print_from_file(path: &Path, json: bool) -> Result<()> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;
    let report = Report::parse(&text);
    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render());
    }
    Ok(())
}
