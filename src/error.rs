//! Error types for the analysis engine
//!
//! Every failure a check run can hit maps onto one [`CheckError`] variant.
//! Walk errors never surface here: they are logged and traversal continues.

use crate::models::FileSummary;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while discovering, checking or scoring files
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch {command}: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool exited with a status other than clean or "findings reported".
    /// Summaries gathered before the exit are kept for inspection.
    #[error("{command} exited with {}", describe_status(.code))]
    Execution {
        command: String,
        code: Option<i32>,
        summaries: Vec<FileSummary>,
    },

    #[error("failed to read output of {command}: {source}")]
    Stream {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed report line {line:?}: {reason}")]
    Parse { line: String, reason: String },

    #[error("{path}:{line}: cannot format: {reason}")]
    Format {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("no files to analyze")]
    NoFiles,

    #[error("{0} has no lines to score")]
    EmptyFile(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CheckError {
    /// Summaries collected before the failure, if the error carries any
    pub fn partial_summaries(&self) -> &[FileSummary] {
        match self {
            CheckError::Execution { summaries, .. } => summaries,
            _ => &[],
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CheckError::Io {
            path: path.into(),
            source,
        }
    }
}

fn describe_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

pub type CheckResult<T> = Result<T, CheckError>;
