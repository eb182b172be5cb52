//! Check command - run the configured checks and print a report card

use anyhow::{Context, Result};
use codegrade::config::ProjectConfig;
use codegrade::engine::Engine;
use codegrade::reporters;
use std::path::Path;

/// Run the check command
pub fn run(
    path: &Path,
    mut config: ProjectConfig,
    only: &[String],
    format: &str,
    output: Option<&Path>,
    fail_under: Option<f64>,
) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    config.retain_checks(only)?;
    let engine = Engine::new(config)?;
    let report = engine
        .run(path)
        .with_context(|| format!("Failed to check {}", path.display()))?;

    let rendered = reporters::report(&report, format)?;
    match output {
        Some(file) => {
            std::fs::write(file, &rendered)
                .with_context(|| format!("Failed to write report to {}", file.display()))?;
            eprintln!("Report written to {}", file.display());
        }
        None => println!("{}", rendered),
    }

    if let Some(threshold) = fail_under {
        if report.score < threshold {
            eprintln!(
                "Failing: score {:.1} is below --fail-under={}",
                report.score, threshold
            );
            std::process::exit(1);
        }
    }
    Ok(())
}
