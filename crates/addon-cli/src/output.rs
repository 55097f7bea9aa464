//! Rendering check results for humans and for CI.

use std::io::{self, Write};

use addon_check::{Report, Severity};
use colored::Colorize;
use serde::Serialize;

/// Reports of one `check` run plus their totals.
#[derive(Debug, Serialize)]
pub struct Outcome {
    /// Target branch
    pub branch: String,
    /// Whether review mode was on
    pub pr: bool,
    /// Problems across all reports
    pub problems: usize,
    /// Warnings across all reports
    pub warnings: usize,
    /// Most severe finding across all reports
    pub worst: Option<Severity>,
    /// One-line result
    pub summary: String,
    /// One report per checked directory
    pub reports: Vec<Report>,
}

impl Outcome {
    /// Total the given reports.
    pub fn new(branch: impl Into<String>, pr: bool, reports: Vec<Report>) -> Self {
        let mut all = Report::new("all");
        for report in &reports {
            all.add_child(report.clone());
        }
        Self {
            branch: branch.into(),
            pr,
            problems: all.problem_count(),
            warnings: all.warning_count(),
            worst: all.worst(),
            summary: all.summary(),
            reports,
        }
    }

    /// Whether any report has a problem.
    pub fn has_problems(&self) -> bool {
        self.problems > 0
    }
}

fn severity_label(severity: Severity) -> colored::ColoredString {
    let label = severity.to_string();
    match severity {
        Severity::Information => label.cyan(),
        Severity::Warning => label.yellow(),
        Severity::Problem => label.red(),
    }
}

fn write_report(out: &mut impl Write, report: &Report, depth: usize) -> io::Result<()> {
    let indent = "  ".repeat(depth);
    writeln!(out, "{indent}{} {}", "=>".blue().bold(), report.artifact.bold())?;
    for diagnostic in &report.diagnostics {
        writeln!(
            out,
            "{indent}  [{}] {}",
            severity_label(diagnostic.severity),
            diagnostic.message
        )?;
    }
    for child in &report.children {
        write_report(out, child, depth + 1)?;
    }
    Ok(())
}

/// Human-readable output.
pub fn write_text(out: &mut impl Write, outcome: &Outcome) -> io::Result<()> {
    for report in &outcome.reports {
        write_report(out, report, 0)?;
    }
    writeln!(out)?;
    let status = match outcome.worst {
        Some(Severity::Problem) => "FAIL".red().bold(),
        Some(Severity::Warning) => "WARN".yellow().bold(),
        _ => "OK".green().bold(),
    };
    writeln!(out, "{status} {}", outcome.summary)
}

/// Pretty JSON output.
pub fn write_json(out: &mut impl Write, outcome: &Outcome) -> crate::error::Result<()> {
    serde_json::to_writer_pretty(&mut *out, outcome)?;
    writeln!(out)?;
    Ok(())
}
