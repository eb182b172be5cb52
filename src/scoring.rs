//! Check scoring
//!
//! # Scoring Formula
//!
//! ```text
//! Directory mode:   score = (files - failing files) / files
//! Single-file mode: score = (lines - issues) / lines
//! Overall:          100 × Σ(weight × check score) / Σ weight
//! ```
//!
//! Directory mode is a per-file pass rate: a failing file costs the same
//! however many issues it has. Single-file mode charges one full line per
//! issue, so it goes negative when issues outnumber lines.

use crate::error::{CheckError, CheckResult};
use crate::models::{CheckReport, Grade};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// How a check run over a file list is scored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMode {
    /// Fraction of files without issues
    Directory { files: usize },
    /// Fraction of lines of one file not charged with an issue
    SingleFile { lines: usize },
}

impl ScoreMode {
    /// Compute the ratio for `failing_files` files carrying `issues` issues
    pub fn score(self, failing_files: usize, issues: usize) -> CheckResult<f64> {
        match self {
            ScoreMode::Directory { files: 0 } => Err(CheckError::NoFiles),
            ScoreMode::Directory { files } => Ok(ratio(files, failing_files)),
            ScoreMode::SingleFile { lines: 0 } => Err(CheckError::NoFiles),
            ScoreMode::SingleFile { lines } => Ok(ratio(lines, issues)),
        }
    }
}

fn ratio(total: usize, lost: usize) -> f64 {
    (total as f64 - lost as f64) / total as f64
}

/// Number of lines in a file: newline bytes, plus one for an unterminated
/// last line
pub fn line_count(path: &Path) -> CheckResult<usize> {
    let mut file = File::open(path).map_err(|e| CheckError::io(path, e))?;
    let mut buf = [0u8; 64 * 1024];
    let mut lines = 0;
    let mut last = None;
    loop {
        let n = file.read(&mut buf).map_err(|e| CheckError::io(path, e))?;
        if n == 0 {
            break;
        }
        lines += memchr::memchr_iter(b'\n', &buf[..n]).count();
        last = Some(buf[n - 1]);
    }
    match last {
        Some(b'\n') | None => Ok(lines),
        Some(_) => Ok(lines + 1),
    }
}

/// Weighted average of check scores as a percentage. Checks with zero
/// weight are ignored; with no weighted checks the result is 0.
pub fn overall_score(checks: &[CheckReport]) -> f64 {
    let total_weight: f64 = checks.iter().map(|c| c.weight).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = checks.iter().map(|c| c.weight * c.score).sum();
    weighted / total_weight * 100.0
}

/// Grade for an overall percentage
pub fn grade(score: f64) -> Grade {
    Grade::from_percentage(score)
}
