//! Analysis engine
//!
//! Discovers the files of a directory once, runs every configured check
//! over them in order and combines the check scores into a report card.
//! A failing check scores zero but does not stop the others.

use crate::checks::{Check, ExternalTool, FormatCheck, GoFormatter, ToolCheck};
use crate::config::{CheckKind, CheckSpec, ProjectConfig};
use crate::discovery::{Discovery, FileDiscoverer};
use crate::error::{CheckError, CheckResult};
use crate::models::{CheckReport, Report};
use crate::scoring::{grade, overall_score};
use crate::url::SourceLayout;
use chrono::Utc;
use std::path::Path;
use tracing::{info, warn};

struct ConfiguredCheck {
    spec: CheckSpec,
    check: Box<dyn Check>,
}

/// Runs a configured set of checks over directories
pub struct Engine {
    discoverer: FileDiscoverer,
    checks: Vec<ConfiguredCheck>,
}

impl Engine {
    /// Validate `config` and build its checks
    pub fn new(config: ProjectConfig) -> CheckResult<Self> {
        config.validate()?;
        let discoverer = FileDiscoverer::new(config.profile);
        let layout = SourceLayout::new(config.layout);

        let checks = config
            .checks
            .into_iter()
            .map(|spec| {
                let check = build_check(&spec, &discoverer, &layout);
                ConfiguredCheck { spec, check }
            })
            .collect();

        Ok(Self { discoverer, checks })
    }

    /// Names of the configured checks, in run order
    pub fn check_names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.check.name()).collect()
    }

    pub fn discover(&self, dir: &Path) -> Discovery {
        self.discoverer.discover(dir)
    }

    /// Run every check over `dir`
    pub fn run(&self, dir: &Path) -> CheckResult<Report> {
        let discovery = self.discover(dir);
        if discovery.eligible.is_empty() {
            return Err(CheckError::NoFiles);
        }
        info!(
            "Checking {} files in {} ({} skipped)",
            discovery.eligible.len(),
            dir.display(),
            discovery.skipped.len()
        );

        let checks: Vec<CheckReport> = self
            .checks
            .iter()
            .map(|configured| run_check(configured, dir, &discovery))
            .collect();

        let score = overall_score(&checks);
        let issues = checks
            .iter()
            .flat_map(|c| &c.file_summaries)
            .map(|s| s.issues.len())
            .sum();

        Ok(Report {
            path: dir.to_path_buf(),
            score,
            grade: grade(score),
            files: discovery.eligible.len(),
            skipped: discovery.skipped.len(),
            issues,
            checks,
            generated_at: Utc::now(),
        })
    }
}

fn build_check(
    spec: &CheckSpec,
    discoverer: &FileDiscoverer,
    layout: &SourceLayout,
) -> Box<dyn Check> {
    match spec.kind {
        CheckKind::NativeFormat => Box::new(FormatCheck::new(
            spec.name.clone(),
            Box::new(GoFormatter::new()),
            discoverer.clone(),
            layout.clone(),
        )),
        CheckKind::Command => Box::new(ToolCheck::new(
            spec.clone(),
            Box::new(ExternalTool::from_spec(spec, discoverer.profile())),
            discoverer.clone(),
            layout.clone(),
        )),
    }
}

fn run_check(configured: &ConfiguredCheck, dir: &Path, discovery: &Discovery) -> CheckReport {
    let spec = &configured.spec;
    let (score, file_summaries, error) = match configured.check.run(dir, discovery) {
        Ok(outcome) => {
            info!("{}: score {:.2}", spec.name, outcome.score);
            (outcome.score, outcome.summaries, None)
        }
        Err(e) => {
            warn!("{} failed: {}", spec.name, e);
            (0.0, e.partial_summaries().to_vec(), Some(e.to_string()))
        }
    };

    CheckReport {
        name: spec.name.clone(),
        description: spec.description.clone(),
        weight: spec.weight,
        score,
        file_summaries,
        error,
    }
}
