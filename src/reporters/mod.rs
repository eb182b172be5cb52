//! Output reporters for codegrade reports
//!
//! Supports two output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON

mod json;
mod text;

use crate::models::Report;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format '{}'. Valid formats: text, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render a report in the specified format
pub fn report(report: &Report, format: &str) -> Result<String> {
    let fmt = OutputFormat::from_str(format)?;
    report_with_format(report, fmt)
}

/// Render a report using an OutputFormat enum
pub fn report_with_format(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(report),
        OutputFormat::Json => json::render(report),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{CheckReport, FileSummary, Grade, Issue};
    use chrono::Utc;
    use std::path::PathBuf;

    /// A two-check report: one with an issue, one that failed to run
    pub(crate) fn test_report() -> Report {
        let mut summary = FileSummary::new(
            "r/pkg/a.go",
            "https://github.com/o/r/blob/master/pkg/a.go",
        );
        summary.add_issue(Issue::new(12, "exported function Run should have comment"));

        Report {
            path: PathBuf::from("repos/src/github.com/o/r"),
            score: 72.5,
            grade: Grade::B,
            files: 8,
            skipped: 2,
            issues: 1,
            checks: vec![
                CheckReport {
                    name: "golint".into(),
                    description: "Golint is a linter for Go source code.".into(),
                    weight: 0.5,
                    score: 0.875,
                    file_summaries: vec![summary],
                    error: None,
                },
                CheckReport {
                    name: "go_vet".into(),
                    description: "go vet examines Go source code.".into(),
                    weight: 0.5,
                    score: 0.0,
                    file_summaries: Vec::new(),
                    error: Some("go_vet exited with exit code 2".into()),
                },
            ],
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("text").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::from_str("sarif").is_err());
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_report_dispatches_by_name() {
        let report = test_report();
        assert!(super::report(&report, "json").unwrap().starts_with('{'));
        assert!(super::report(&report, "text").unwrap().contains("golint"));
        assert!(super::report(&report, "xml").is_err());
    }
}
