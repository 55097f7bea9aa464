//! Diagnostics and per-artifact reports.
//!
//! Checks never fail on bad add-on data; they return [`Diagnostic`] values.
//! A [`Report`] groups the diagnostics of one artifact (an add-on or a whole
//! repository) and nests the reports of its children.

use serde::{Deserialize, Serialize};

/// Severity of a diagnostic, least severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational notice
    Information,
    /// Potential problem, does not fail the check
    Warning,
    /// Blocks publication
    Problem,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Information => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Problem => write!(f, "ERROR"),
        }
    }
}

/// One finding about an add-on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// Human-readable description
    pub message: String,
}

impl Diagnostic {
    /// A diagnostic with the given severity.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    /// A [`Severity::Problem`] diagnostic.
    pub fn problem(message: impl Into<String>) -> Self {
        Self::new(Severity::Problem, message)
    }

    /// A [`Severity::Warning`] diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// A [`Severity::Information`] diagnostic.
    pub fn information(message: impl Into<String>) -> Self {
        Self::new(Severity::Information, message)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Diagnostics for one artifact plus the reports of nested artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// What was checked: an add-on id, folder or repository path
    pub artifact: String,
    /// Findings for this artifact, in the order they were produced
    pub diagnostics: Vec<Diagnostic>,
    /// Reports of nested artifacts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Report>,
}

impl Report {
    /// An empty report for `artifact`.
    pub fn new(artifact: impl Into<String>) -> Self {
        Self {
            artifact: artifact.into(),
            ..Default::default()
        }
    }

    /// Add one diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Nest a child report.
    pub fn add_child(&mut self, child: Report) {
        self.children.push(child);
    }

    /// Every diagnostic in this report and its children, depth first.
    pub fn all_diagnostics(&self) -> Vec<&Diagnostic> {
        let mut all: Vec<&Diagnostic> = self.diagnostics.iter().collect();
        for child in &self.children {
            all.extend(child.all_diagnostics());
        }
        all
    }

    /// Number of diagnostics with `severity`, children included.
    pub fn count(&self, severity: Severity) -> usize {
        self.all_diagnostics()
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Number of problems, children included.
    pub fn problem_count(&self) -> usize {
        self.count(Severity::Problem)
    }

    /// Number of warnings, children included.
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Whether any problem was found.
    pub fn has_problems(&self) -> bool {
        self.problem_count() > 0
    }

    /// The most severe finding, if any.
    pub fn worst(&self) -> Option<Severity> {
        self.all_diagnostics().iter().map(|d| d.severity).max()
    }

    /// One-line outcome of the whole check.
    pub fn summary(&self) -> String {
        let problems = self.problem_count();
        let warnings = self.warning_count();
        if problems + warnings == 0 {
            return "We didn't find any problems or warnings, please enjoy your day.".to_string();
        }
        format!(
            "We found {problems} {} and {warnings} {}, please fix them before publishing.",
            if problems == 1 { "problem" } else { "problems" },
            if warnings == 1 { "warning" } else { "warnings" },
        )
    }
}

impl Extend<Diagnostic> for Report {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        self.diagnostics.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Information.to_string(), "INFO");
        assert_eq!(Severity::Warning.to_string(), "WARN");
        assert_eq!(Severity::Problem.to_string(), "ERROR");
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Problem > Severity::Warning);
        assert!(Severity::Warning > Severity::Information);
    }

    #[test]
    fn test_counts_include_children() {
        let mut child = Report::new("plugin.a");
        child.push(Diagnostic::problem("broken"));
        child.push(Diagnostic::warning("odd"));

        let mut repo = Report::new("repo");
        repo.push(Diagnostic::information("Checking repository"));
        repo.push(Diagnostic::warning("another"));
        repo.add_child(child);

        assert_eq!(repo.problem_count(), 1);
        assert_eq!(repo.warning_count(), 2);
        assert_eq!(repo.count(Severity::Information), 1);
        assert_eq!(repo.worst(), Some(Severity::Problem));
        assert!(repo.has_problems());
    }

    #[test]
    fn test_summary() {
        let clean = Report::new("plugin.a");
        assert_eq!(
            clean.summary(),
            "We didn't find any problems or warnings, please enjoy your day."
        );

        let mut report = Report::new("plugin.a");
        report.extend([
            Diagnostic::problem("p"),
            Diagnostic::warning("w1"),
            Diagnostic::warning("w2"),
        ]);
        assert_eq!(
            report.summary(),
            "We found 1 problem and 2 warnings, please fix them before publishing."
        );
    }

    #[test]
    fn test_report_json_shape() {
        let mut report = Report::new("plugin.a");
        report.push(Diagnostic::problem("bad"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["diagnostics"][0]["severity"], "problem");
        assert!(json.get("children").is_none());
    }
}
