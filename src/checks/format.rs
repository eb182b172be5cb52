//! Native format check
//!
//! Compares every eligible file with its canonical form as produced by an
//! in-process [`SourceFormatter`]. No external process is spawned, so a file
//! the formatter cannot handle fails the whole batch.

use super::Check;
use crate::discovery::{Discovery, FileDiscoverer};
use crate::error::{CheckError, CheckResult};
use crate::models::{CheckOutcome, FileSummary, Issue};
use crate::scoring::ScoreMode;
use crate::url::SourceLayout;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Why a formatter could not produce a canonical form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatFailure {
    /// 1-based line of the first problem
    pub line: usize,
    pub reason: String,
}

impl FormatFailure {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Produces the canonical form of a source file
pub trait SourceFormatter {
    fn format(&self, src: &[u8]) -> Result<Vec<u8>, FormatFailure>;

    /// Issue message attached to files that differ from their canonical form
    fn not_formatted_message(&self) -> &str;
}

/// Check that every file is already in canonical form
pub struct FormatCheck {
    name: String,
    formatter: Box<dyn SourceFormatter>,
    discoverer: FileDiscoverer,
    layout: SourceLayout,
}

impl FormatCheck {
    pub fn new(
        name: impl Into<String>,
        formatter: Box<dyn SourceFormatter>,
        discoverer: FileDiscoverer,
        layout: SourceLayout,
    ) -> Self {
        Self {
            name: name.into(),
            formatter,
            discoverer,
            layout,
        }
    }

    /// Score `files` by the fraction already formatted.
    ///
    /// Excluded files are left out of both the comparison and the
    /// denominator.
    pub fn check_formatting(&self, dir: &Path, files: &[PathBuf]) -> CheckResult<CheckOutcome> {
        let base_dir = dir.to_string_lossy();
        let mut checked = 0;
        let mut summaries = Vec::new();

        for path in files {
            if self.discoverer.is_excluded(path) {
                debug!("{}: skipping excluded {}", self.name, path.display());
                continue;
            }
            checked += 1;

            let original = std::fs::read(path).map_err(|e| CheckError::io(path, e))?;
            let formatted =
                self.formatter
                    .format(&original)
                    .map_err(|failure| CheckError::Format {
                        path: path.clone(),
                        line: failure.line,
                        reason: failure.reason,
                    })?;
            if formatted == original {
                continue;
            }

            let reported = path.to_string_lossy();
            let normalized = self.layout.normalize(&reported);
            let mut summary = FileSummary::new(
                self.layout.display_name(&base_dir, normalized),
                self.layout.resolve_url(&base_dir, normalized),
            );
            summary.add_issue(Issue::new(1, self.formatter.not_formatted_message()));
            summaries.push(summary);
        }

        let score = ScoreMode::Directory { files: checked }.score(summaries.len(), summaries.len())?;
        Ok(CheckOutcome::new(score, summaries))
    }
}

impl Check for FormatCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, dir: &Path, discovery: &Discovery) -> CheckResult<CheckOutcome> {
        self.check_formatting(dir, &discovery.eligible)
    }
}
