//! Checker runner
//!
//! Drives a [`CheckTool`] over a directory, turns its report lines into
//! per-file summaries and scores the result. [`ToolCheck`] wraps the runner
//! with file-count based mode selection and quarantine of skipped files.

use super::{Check, CheckTool, ExitClass};
use crate::config::CheckSpec;
use crate::discovery::{Discovery, ExclusionCache, FileDiscoverer};
use crate::error::{CheckError, CheckResult};
use crate::models::{CheckOutcome, FileSummary};
use crate::parser::{parse_line, path_token, SummaryCollector};
use crate::quarantine::Quarantine;
use crate::scoring::{line_count, ScoreMode};
use crate::url::SourceLayout;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Runs one tool and collects its report
pub struct ToolRunner<'a> {
    discoverer: &'a FileDiscoverer,
    layout: &'a SourceLayout,
}

impl<'a> ToolRunner<'a> {
    pub fn new(discoverer: &'a FileDiscoverer, layout: &'a SourceLayout) -> Self {
        Self { discoverer, layout }
    }

    /// Launch `tool` over `dir` and score its report with `mode`.
    ///
    /// In single-file mode only the issues reported against that file are
    /// charged; tools may still report on files discovery never looked at.
    /// A malformed line aborts the run and discards everything gathered so
    /// far. An unexpected exit status is an [`CheckError::Execution`] that
    /// still carries the summaries gathered before the exit.
    pub fn run(
        &self,
        tool: &dyn CheckTool,
        dir: &Path,
        files: &[PathBuf],
        skipped: &[PathBuf],
        mode: ScoreMode,
    ) -> CheckResult<CheckOutcome> {
        let mut stream = tool.launch(dir, files, skipped)?;
        let base_dir = dir.to_string_lossy();
        let mut collector = SummaryCollector::new();
        let mut exclusions = ExclusionCache::new(self.discoverer);

        while let Some(line) = stream.next_line() {
            let line = line.map_err(|source| CheckError::Stream {
                command: tool.name().to_string(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let token = path_token(&line);
            if exclusions.is_excluded(token) {
                debug!("Ignoring report on excluded file: {}", line);
                continue;
            }

            let issue = parse_line(&line)?;
            let normalized = self.layout.normalize(token);
            collector.add(normalized, issue, || {
                FileSummary::new(
                    self.layout.display_name(&base_dir, normalized),
                    self.layout.resolve_url(&base_dir, normalized),
                )
            });
        }

        if let ExitClass::Failed(code) = stream.finish()? {
            return Err(CheckError::Execution {
                command: tool.name().to_string(),
                code,
                summaries: collector.into_summaries(),
            });
        }

        let issues = match (mode, files) {
            (ScoreMode::SingleFile { .. }, [file]) => self.issues_on(&collector, &base_dir, file),
            _ => collector.issue_count(),
        };
        let score = mode.score(collector.len(), issues)?;
        Ok(CheckOutcome::new(score, collector.into_summaries()))
    }

    /// Issues reported against `file`, whether the tool printed it as the
    /// discovered path or relative to `base_dir`
    fn issues_on(&self, collector: &SummaryCollector, base_dir: &str, file: &Path) -> usize {
        let path = file.to_string_lossy();
        let normalized = self.layout.normalize(&path);
        let display = self.layout.display_name(base_dir, normalized);
        let display = display.trim_start_matches("./");
        collector.issue_count_where(|key, summary| {
            key == normalized || summary.filename.trim_start_matches("./") == display
        })
    }
}

/// A configured check backed by a [`CheckTool`]
pub struct ToolCheck {
    spec: CheckSpec,
    tool: Box<dyn CheckTool>,
    discoverer: FileDiscoverer,
    layout: SourceLayout,
    quarantine: Quarantine,
}

impl ToolCheck {
    pub fn new(
        spec: CheckSpec,
        tool: Box<dyn CheckTool>,
        discoverer: FileDiscoverer,
        layout: SourceLayout,
    ) -> Self {
        let quarantine = Quarantine::new(discoverer.profile().quarantine_suffix.clone());
        Self {
            spec,
            tool,
            discoverer,
            layout,
            quarantine,
        }
    }

    fn score_mode(files: &[PathBuf]) -> CheckResult<ScoreMode> {
        match files {
            [] => Err(CheckError::NoFiles),
            [single] => match line_count(single)? {
                0 => Err(CheckError::EmptyFile(single.clone())),
                lines => Ok(ScoreMode::SingleFile { lines }),
            },
            _ => Ok(ScoreMode::Directory { files: files.len() }),
        }
    }
}

impl Check for ToolCheck {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn run(&self, dir: &Path, discovery: &Discovery) -> CheckResult<CheckOutcome> {
        let mode = Self::score_mode(&discovery.eligible)?;
        let runner = ToolRunner::new(&self.discoverer, &self.layout);
        let run = || {
            runner.run(
                self.tool.as_ref(),
                dir,
                &discovery.eligible,
                &discovery.skipped,
                mode,
            )
        };

        if self.spec.exclude_flag.is_some() || discovery.skipped.is_empty() {
            return run();
        }

        let mut guard = self.quarantine.hide(&discovery.skipped);
        if let Err(e) = guard.take_hide_result() {
            warn!("{}: some skipped files could not be hidden: {}", self.spec.name, e);
        }
        let result = run();
        match (result, guard.release()) {
            (Ok(outcome), Ok(())) => Ok(outcome),
            (Ok(_), Err(restore)) => Err(restore),
            (Err(e), Err(restore)) => {
                warn!("{}: restore after failed run: {}", self.spec.name, restore);
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
        }
    }
}
