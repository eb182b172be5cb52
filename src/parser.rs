//! Report line parsing
//!
//! Tools report one finding per line as `path:line:column:message`. The
//! message may itself contain colons.

use crate::error::{CheckError, CheckResult};
use crate::models::{FileSummary, Issue};
use std::collections::HashMap;

const SEPARATOR: char = ':';

/// Path token of a report line: everything before the first separator
pub fn path_token(line: &str) -> &str {
    line.split(SEPARATOR).next().unwrap_or(line)
}

/// Parse one report line into an [`Issue`].
///
/// The column is discarded. A missing field, a non-numeric line number or
/// a line number of zero is a [`CheckError::Parse`].
pub fn parse_line(line: &str) -> CheckResult<Issue> {
    let malformed = |reason: &str| CheckError::Parse {
        line: line.to_string(),
        reason: reason.to_string(),
    };

    let (_, rest) = line
        .split_once(SEPARATOR)
        .ok_or_else(|| malformed("missing path separator"))?;

    let mut fields = rest.splitn(3, SEPARATOR);
    let (Some(line_field), Some(_column), Some(message)) =
        (fields.next(), fields.next(), fields.next())
    else {
        return Err(malformed("expected path:line:column:message"));
    };

    let line_number: u32 = line_field
        .trim()
        .parse()
        .map_err(|_| malformed("line number is not an integer"))?;
    if line_number == 0 {
        return Err(malformed("line numbers start at 1"));
    }

    Ok(Issue::new(line_number, message.trim()))
}

/// Groups issues by file as report lines arrive in any order
#[derive(Debug, Default)]
pub struct SummaryCollector {
    by_path: HashMap<String, FileSummary>,
}

impl SummaryCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `issue` to the summary keyed by `key`, creating the summary
    /// with `make` on first reference
    pub fn add<F>(&mut self, key: &str, issue: Issue, make: F)
    where
        F: FnOnce() -> FileSummary,
    {
        self.by_path
            .entry(key.to_string())
            .or_insert_with(make)
            .add_issue(issue);
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    pub fn issue_count(&self) -> usize {
        self.by_path.values().map(|s| s.issues.len()).sum()
    }

    /// Issues in the summaries selected by `pred`, called with each key
    pub fn issue_count_where<F>(&self, pred: F) -> usize
    where
        F: Fn(&str, &FileSummary) -> bool,
    {
        self.by_path
            .iter()
            .filter(|(key, summary)| pred(key.as_str(), summary))
            .map(|(_, summary)| summary.issues.len())
            .sum()
    }

    /// Summaries sorted by filename
    pub fn into_summaries(self) -> Vec<FileSummary> {
        let mut summaries: Vec<FileSummary> = self.by_path.into_values().collect();
        summaries.sort_by(|a, b| a.filename.cmp(&b.filename));
        summaries
    }
}
