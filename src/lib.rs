//! codegrade - code quality report cards for Go source trees
//!
//! The engine discovers the analyzable files of a directory, runs each
//! configured check over them and turns the per-check pass rates into a
//! weighted score and letter grade.
//!
//! ```no_run
//! use codegrade::{Engine, ProjectConfig};
//!
//! let engine = Engine::new(ProjectConfig::default())?;
//! let report = engine.run(std::path::Path::new("repos/src/github.com/owner/repo"))?;
//! println!("{} ({})", report.score, report.grade);
//! # Ok::<(), codegrade::CheckError>(())
//! ```

pub mod checks;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod models;
pub mod parser;
pub mod quarantine;
pub mod reporters;
pub mod scoring;
pub mod url;

pub use config::ProjectConfig;
pub use engine::Engine;
pub use error::{CheckError, CheckResult};
pub use models::{CheckOutcome, CheckReport, FileSummary, Grade, Issue, Report};
