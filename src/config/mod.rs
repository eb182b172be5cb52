//! Configuration module for codegrade
//!
//! This module handles:
//! - Project-level configuration (codegrade.toml)
//! - The analysis profile (exclusion lists, tool argument conventions)
//! - Source layout used for path normalization and URL resolution
//! - The list of checks to run and their weights

mod project_config;

pub use project_config::{
    load_config_file, load_project_config, CheckKind, CheckSpec, LayoutConfig, ModuleNamespace,
    Profile, ProjectConfig, DEFAULT_CONFIG_TOML,
};
