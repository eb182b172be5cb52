//! Checks and the capabilities they are built on
//!
//! This module defines the abstractions shared by every check:
//! - `Check`: runs over a discovered directory and yields a scored outcome
//! - `CheckTool`: launches something that emits a line-oriented report
//! - `ReportStream`: the report lines plus an exit classification
//!
//! Two checks exist. `ToolCheck` drives a `CheckTool` (usually an external
//! process) and parses its report; `FormatCheck` compares files against an
//! in-process formatter. Fakes of `CheckTool` make the runner testable
//! without spawning processes.

mod external_tool;
mod format;
mod gofmt;
mod runner;

pub use external_tool::ExternalTool;
pub use format::{FormatCheck, FormatFailure, SourceFormatter};
pub use gofmt::GoFormatter;
pub use runner::{ToolCheck, ToolRunner};

use crate::discovery::Discovery;
use crate::error::CheckResult;
use crate::models::CheckOutcome;
use std::io;
use std::path::{Path, PathBuf};

/// How a tool's run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitClass {
    /// Exited successfully
    Clean,
    /// Exited with the tool's "findings reported" code
    Findings,
    /// Any other exit; `None` when killed by a signal
    Failed(Option<i32>),
}

impl ExitClass {
    /// Classify a raw exit code against the tool's findings code
    pub fn from_code(code: Option<i32>, findings_exit_code: i32) -> Self {
        match code {
            Some(0) => ExitClass::Clean,
            Some(c) if c == findings_exit_code => ExitClass::Findings,
            other => ExitClass::Failed(other),
        }
    }

    pub fn is_failure(self) -> bool {
        matches!(self, ExitClass::Failed(_))
    }
}

/// A running report producer
pub trait ReportStream {
    /// Next report line, or `None` once the output is drained
    fn next_line(&mut self) -> Option<io::Result<String>>;

    /// Wait for the producer to end and classify how it ended
    fn finish(self: Box<Self>) -> CheckResult<ExitClass>;
}

/// Something that can be launched over a directory to produce a report
pub trait CheckTool {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Start producing a report for `dir`.
    ///
    /// `files` are the eligible files, `skipped` the files the tool must not
    /// report on.
    fn launch(
        &self,
        dir: &Path,
        files: &[PathBuf],
        skipped: &[PathBuf],
    ) -> CheckResult<Box<dyn ReportStream>>;
}

/// A scored analysis over a discovered directory
pub trait Check {
    fn name(&self) -> &str;

    fn run(&self, dir: &Path, discovery: &Discovery) -> CheckResult<CheckOutcome>;
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory `CheckTool` for tests

    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays scripted lines and exit class; records what it was launched with
    #[derive(Debug)]
    pub struct ScriptedTool {
        pub lines: Vec<io::Result<String>>,
        pub exit: ExitClass,
        pub launches: Arc<Mutex<Vec<(PathBuf, Vec<PathBuf>, Vec<PathBuf>)>>>,
    }

    impl ScriptedTool {
        pub fn new(lines: &[&str], exit: ExitClass) -> Self {
            Self {
                lines: lines.iter().map(|l| Ok(l.to_string())).collect(),
                exit,
                launches: Arc::default(),
            }
        }

        pub fn with_read_error(mut self) -> Self {
            self.lines
                .push(Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed")));
            self
        }
    }

    struct ScriptedStream {
        lines: VecDeque<io::Result<String>>,
        exit: ExitClass,
    }

    impl ReportStream for ScriptedStream {
        fn next_line(&mut self) -> Option<io::Result<String>> {
            self.lines.pop_front()
        }

        fn finish(self: Box<Self>) -> CheckResult<ExitClass> {
            Ok(self.exit)
        }
    }

    impl CheckTool for ScriptedTool {
        fn name(&self) -> &str {
            "scripted"
        }

        fn launch(
            &self,
            dir: &Path,
            files: &[PathBuf],
            skipped: &[PathBuf],
        ) -> CheckResult<Box<dyn ReportStream>> {
            if let Ok(mut launches) = self.launches.lock() {
                launches.push((dir.to_path_buf(), files.to_vec(), skipped.to_vec()));
            }
            let lines = self
                .lines
                .iter()
                .map(|l| match l {
                    Ok(s) => Ok(s.clone()),
                    Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
                })
                .collect();
            Ok(Box::new(ScriptedStream {
                lines,
                exit: self.exit,
            }))
        }
    }
}
