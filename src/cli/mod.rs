//! CLI command definitions and handlers

mod check;
mod files;
mod init;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codegrade::config::{load_config_file, load_project_config, ProjectConfig};
use std::path::{Path, PathBuf};

/// Parse and validate a score threshold (0-100)
fn parse_threshold(s: &str) -> Result<f64, String> {
    let n: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if (0.0..=100.0).contains(&n) {
        Ok(n)
    } else {
        Err("threshold must be between 0 and 100".to_string())
    }
}

/// codegrade - report cards for Go source trees
#[derive(Parser, Debug)]
#[command(name = "codegrade")]
#[command(
    version,
    about = "Grade a Go source tree by running lint checks and weighting their pass rates",
    after_help = "\
Examples:
  codegrade .                              Grade the current directory
  codegrade check . --format json          JSON output for scripting
  codegrade check . --only gofmt           Run a single check
  codegrade check . --fail-under 80        Exit code 1 below 80/100 (CI mode)
  codegrade files .                        List analyzed and skipped files
  codegrade init .                         Write a codegrade.toml with the defaults"
)]
pub struct Cli {
    /// Path to analyze (default: current directory)
    #[arg(global = true, default_value = ".")]
    pub path: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Configuration file (default: codegrade.toml or .codegraderc.json in PATH)
    #[arg(long, global = true, env = "CODEGRADE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the configured checks and print a report card (default)
    Check {
        /// Run only this check (repeatable)
        #[arg(long = "only", value_name = "NAME")]
        only: Vec<String>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Exit with code 1 if the overall score is below this value (0-100)
        #[arg(long, value_parser = parse_threshold)]
        fail_under: Option<f64>,
    },

    /// List the files that would be analyzed and those that are skipped
    Files {
        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Write a codegrade.toml with the default configuration
    Init {
        /// Overwrite an existing codegrade.toml
        #[arg(long)]
        force: bool,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Init { force }) => init::run(&cli.path, force),

        Some(Commands::Files { ref format }) => {
            let config = resolve_config(&cli.path, cli.config.as_deref())?;
            files::run(&cli.path, config, format)
        }

        Some(Commands::Check {
            ref only,
            ref format,
            ref output,
            fail_under,
        }) => {
            let config = resolve_config(&cli.path, cli.config.as_deref())?;
            check::run(
                &cli.path,
                config,
                only,
                format,
                output.as_deref(),
                fail_under,
            )
        }

        None => {
            let config = resolve_config(&cli.path, cli.config.as_deref())?;
            check::run(&cli.path, config, &[], "text", None, None)
        }
    }
}

/// Explicit `--config` wins; otherwise look next to the analyzed path
fn resolve_config(path: &Path, explicit: Option<&Path>) -> Result<ProjectConfig> {
    if let Some(file) = explicit {
        return load_config_file(file)
            .with_context(|| format!("Failed to load config {}", file.display()));
    }
    let dir = if path.is_file() {
        path.parent().unwrap_or(Path::new("."))
    } else {
        path
    };
    Ok(load_project_config(dir))
}
