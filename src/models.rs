//! Core data models for codegrade
//!
//! Issues and file summaries use the field names consumers of the report
//! format already expect (`line_number`, `error_string`, `file_url`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single problem reported at one line of a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub line_number: u32,
    #[serde(rename = "error_string")]
    pub message: String,
}

impl Issue {
    pub fn new(line_number: u32, message: impl Into<String>) -> Self {
        Self {
            line_number,
            message: message.into(),
        }
    }
}

/// All issues one check reported for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FileSummary {
    pub filename: String,
    /// Browsable location of the file; empty when the layout is unknown
    #[serde(rename = "file_url", default)]
    pub source_url: String,
    #[serde(rename = "errors", default)]
    pub issues: Vec<Issue>,
}

impl FileSummary {
    pub fn new(filename: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            source_url: source_url.into(),
            issues: Vec::new(),
        }
    }

    pub fn add_issue(&mut self, issue: Issue) {
        self.issues.push(issue);
    }
}

/// Score and per-file summaries produced by one check over one directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Normally within [0, 1]; single-file mode can go negative
    pub score: f64,
    /// Sorted by filename
    pub summaries: Vec<FileSummary>,
}

impl CheckOutcome {
    pub fn new(score: f64, mut summaries: Vec<FileSummary>) -> Self {
        summaries.sort_by(|a, b| a.filename.cmp(&b.filename));
        Self { score, summaries }
    }

    pub fn issue_count(&self) -> usize {
        self.summaries.iter().map(|s| s.issues.len()).sum()
    }
}

/// Result of one configured check inside a full report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub name: String,
    pub description: String,
    pub weight: f64,
    pub score: f64,
    pub file_summaries: Vec<FileSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.error.is_none() && self.file_summaries.is_empty()
    }
}

/// Overall report card for a directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub path: PathBuf,
    /// Weighted average of check scores, 0-100
    pub score: f64,
    pub grade: Grade,
    pub files: usize,
    pub skipped: usize,
    pub issues: usize,
    pub checks: Vec<CheckReport>,
    pub generated_at: DateTime<Utc>,
}

/// Letter grade derived from a percentage score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Grade {
    /// Calculate grade from a 0-100 score
    pub fn from_percentage(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Grade::APlus,
            s if s >= 80.0 => Grade::A,
            s if s >= 70.0 => Grade::B,
            s if s >= 60.0 => Grade::C,
            s if s >= 50.0 => Grade::D,
            s if s >= 40.0 => Grade::E,
            _ => Grade::F,
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Grade::APlus => write!(f, "A+"),
            Grade::A => write!(f, "A"),
            Grade::B => write!(f, "B"),
            Grade::C => write!(f, "C"),
            Grade::D => write!(f, "D"),
            Grade::E => write!(f, "E"),
            Grade::F => write!(f, "F"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let mut summary = FileSummary::new("pkg/a.go", "https://github.com/o/r/blob/master/pkg/a.go");
        summary.add_issue(Issue::new(42, "unused variable x"));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["filename"], "pkg/a.go");
        assert_eq!(json["file_url"], "https://github.com/o/r/blob/master/pkg/a.go");
        assert_eq!(json["errors"][0]["line_number"], 42);
        assert_eq!(json["errors"][0]["error_string"], "unused variable x");
    }

    #[test]
    fn test_outcome_sorts_by_filename() {
        let outcome = CheckOutcome::new(
            0.5,
            vec![FileSummary::new("z.go", ""), FileSummary::new("a.go", "")],
        );
        assert_eq!(outcome.summaries[0].filename, "a.go");
        assert_eq!(outcome.summaries[1].filename, "z.go");
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(Grade::from_percentage(100.0), Grade::APlus);
        assert_eq!(Grade::from_percentage(90.0), Grade::APlus);
        assert_eq!(Grade::from_percentage(85.0), Grade::A);
        assert_eq!(Grade::from_percentage(40.0), Grade::E);
        assert_eq!(Grade::from_percentage(-3.0), Grade::F);
        assert_eq!(Grade::APlus.to_string(), "A+");
    }
}
