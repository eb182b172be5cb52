//! Project-level configuration support
//!
//! Loads per-project configuration from `codegrade.toml` or
//! `.codegraderc.json` in the analyzed directory.
//!
//! # Configuration Format
//!
//! ```toml
//! # codegrade.toml
//!
//! [profile]
//! extensions = ["go"]
//! skip_dirs = ["Godeps", "vendor", "third_party"]
//! skip_suffixes = [".pb.go", "bindata.go"]
//! skip_dir_flag = "--skip={}"
//!
//! [layout]
//! source_root = "repos/src"
//! hosts = ["github.com"]
//!
//! [[checks]]
//! name = "go_vet"
//! command = ["go", "vet"]
//! weight = 0.25
//! ```
//!
//! Every section is optional; missing sections fall back to the built-in
//! Go profile and check list.

use crate::error::{CheckError, CheckResult};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Placeholder replaced by the value in flag templates
const PLACEHOLDER: &str = "{}";

/// File and directory exclusion rules plus the argument conventions of the
/// tools driven by a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Extensions (without dot) of analyzable files
    pub extensions: Vec<String>,
    /// Directory names whose whole subtree is ignored
    pub skip_dirs: Vec<String>,
    /// Filename suffixes that mark vendored or generated files
    pub skip_suffixes: Vec<String>,
    /// Phrases that, right after a comment opener on the first line,
    /// mark a file as generated (matched case-insensitively)
    pub generated_markers: Vec<String>,
    /// Argument template passed once per skipped directory
    pub skip_dir_flag: String,
    /// Appended to the directory argument to request a recursive scan
    pub recursive_suffix: String,
    /// Appended to a file name while it is quarantined
    pub quarantine_suffix: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            extensions: strings(&["go"]),
            skip_dirs: strings(&["Godeps", "vendor", "third_party"]),
            skip_suffixes: strings(&[
                ".pb.go",
                ".pb.gw.go",
                ".generated.go",
                "bindata.go",
                "_string.go",
            ]),
            generated_markers: strings(&[
                "code generated",
                "generated",
                "autogenerated",
                "@generated",
                "code autogenerated",
                "auto-generated",
            ]),
            skip_dir_flag: "--skip={}".to_string(),
            recursive_suffix: "/...".to_string(),
            quarantine_suffix: ".grc.bk".to_string(),
        }
    }
}

impl Profile {
    /// True if the file name ends with one of the excluded suffixes
    pub fn has_skipped_suffix(&self, name: &str) -> bool {
        self.skip_suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }

    /// True if the path carries one of the analyzable extensions
    pub fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|e| e == ext))
            .unwrap_or(false)
    }

    pub fn is_skipped_dir(&self, name: &str) -> bool {
        self.skip_dirs.iter().any(|d| d == name)
    }

    /// One exclusion argument per skipped directory
    pub fn skip_dir_args(&self) -> Vec<String> {
        if self.skip_dir_flag.is_empty() {
            return Vec::new();
        }
        self.skip_dirs
            .iter()
            .map(|dir| render_flag(&self.skip_dir_flag, dir))
            .collect()
    }

    fn validate(&self) -> CheckResult<()> {
        if self.extensions.is_empty() {
            return Err(CheckError::Config(
                "profile.extensions must not be empty".to_string(),
            ));
        }
        if !self.skip_dir_flag.is_empty() && !self.skip_dir_flag.contains(PLACEHOLDER) {
            return Err(CheckError::Config(format!(
                "profile.skip_dir_flag '{}' has no {PLACEHOLDER} placeholder",
                self.skip_dir_flag
            )));
        }
        if self.quarantine_suffix.is_empty() {
            return Err(CheckError::Config(
                "profile.quarantine_suffix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A cross-repository module namespace hosted under a single owner,
/// e.g. `golang.org/x/<repo>` served from `https://github.com/golang/<repo>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleNamespace {
    pub prefix: String,
    pub owner_url: String,
}

/// Where analyzed sources are staged and how they map to hosted repositories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Staging directory prefix stripped from reported paths
    pub source_root: String,
    /// Branch linked to in source URLs
    pub branch: String,
    /// Hosts using the generic `host/owner/repo` layout
    pub hosts: Vec<String>,
    pub modules: Vec<ModuleNamespace>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            source_root: "repos/src".to_string(),
            branch: "master".to_string(),
            hosts: strings(&["github.com"]),
            modules: vec![ModuleNamespace {
                prefix: "golang.org/x/".to_string(),
                owner_url: "https://github.com/golang".to_string(),
            }],
        }
    }
}

/// How a check produces its report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    /// External command printing `path:line:column:message` lines
    #[default]
    Command,
    /// In-process formatter comparison
    NativeFormat,
}

/// One check of the report card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub kind: CheckKind,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Exit code meaning "ran fine and reported findings"
    #[serde(default = "default_findings_exit_code")]
    pub findings_exit_code: i32,
    /// Argument template for excluding one file. When set, skipped files
    /// are passed through this flag instead of being quarantined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_flag: Option<String>,
}

fn default_weight() -> f64 {
    1.0
}

fn default_findings_exit_code() -> i32 {
    1
}

impl CheckSpec {
    /// A check backed by an external command
    pub fn command(name: &str, description: &str, command: &[&str], weight: f64) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind: CheckKind::Command,
            command: strings(command),
            weight,
            findings_exit_code: default_findings_exit_code(),
            exclude_flag: None,
        }
    }

    /// A check backed by the in-process formatter
    pub fn native_format(name: &str, description: &str, weight: f64) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind: CheckKind::NativeFormat,
            command: Vec::new(),
            weight,
            findings_exit_code: default_findings_exit_code(),
            exclude_flag: None,
        }
    }

    /// Exclusion arguments for the given skipped files, if the tool has a flag
    pub fn exclude_args(&self, skipped: &[std::path::PathBuf]) -> Vec<String> {
        match &self.exclude_flag {
            Some(flag) => skipped
                .iter()
                .map(|p| render_flag(flag, &p.to_string_lossy()))
                .collect(),
            None => Vec::new(),
        }
    }

    fn validate(&self) -> CheckResult<()> {
        if self.name.trim().is_empty() {
            return Err(CheckError::Config("check without a name".to_string()));
        }
        if self.kind == CheckKind::Command && self.command.is_empty() {
            return Err(CheckError::Config(format!(
                "check '{}' has an empty command",
                self.name
            )));
        }
        if !(self.weight >= 0.0 && self.weight.is_finite()) {
            return Err(CheckError::Config(format!(
                "check '{}' has invalid weight {}",
                self.name, self.weight
            )));
        }
        if let Some(flag) = &self.exclude_flag {
            if !flag.contains(PLACEHOLDER) {
                return Err(CheckError::Config(format!(
                    "check '{}' exclude_flag '{flag}' has no {PLACEHOLDER} placeholder",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Default report card: the classic Go lint suite
fn default_checks() -> Vec<CheckSpec> {
    vec![
        CheckSpec::native_format(
            "gofmt",
            "Gofmt formats Go programs. Every file must already be in gofmt layout.",
            0.30,
        ),
        CheckSpec::command(
            "go_vet",
            "go vet examines Go source code and reports suspicious constructs.",
            &["go", "vet"],
            0.25,
        ),
        CheckSpec::command(
            "gocyclo",
            "Gocyclo calculates cyclomatic complexities of functions in Go source code.",
            &["gocyclo", "-over", "15"],
            0.10,
        ),
        CheckSpec::command(
            "golint",
            "Golint is a linter for Go source code.",
            &["golint"],
            0.10,
        ),
        CheckSpec::command(
            "ineffassign",
            "IneffAssign detects ineffectual assignments in Go code.",
            &["ineffassign"],
            0.15,
        ),
        CheckSpec::command(
            "misspell",
            "Misspell finds commonly misspelled English words.",
            &["misspell"],
            0.10,
        ),
    ]
}

/// Complete configuration for one engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default = "default_checks")]
    pub checks: Vec<CheckSpec>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            layout: LayoutConfig::default(),
            checks: default_checks(),
        }
    }
}

impl ProjectConfig {
    /// Check the configuration for values the engine cannot work with
    pub fn validate(&self) -> CheckResult<()> {
        self.profile.validate()?;
        for check in &self.checks {
            check.validate()?;
        }
        let mut names: Vec<&str> = self.checks.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        if let Some(dup) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(CheckError::Config(format!(
                "check '{}' is defined twice",
                dup[0]
            )));
        }
        Ok(())
    }

    /// Keep only the named checks, preserving configured order
    pub fn retain_checks(&mut self, names: &[String]) -> CheckResult<()> {
        if names.is_empty() {
            return Ok(());
        }
        if let Some(unknown) = names
            .iter()
            .find(|n| !self.checks.iter().any(|c| &c.name == *n))
        {
            return Err(CheckError::Config(format!("unknown check '{unknown}'")));
        }
        self.checks.retain(|c| names.contains(&c.name));
        Ok(())
    }

    /// Render this configuration as TOML
    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Header written above the generated config by `codegrade init`
pub const DEFAULT_CONFIG_TOML: &str = "\
# codegrade configuration
#
# profile: which files are analyzed and how tools are told to skip the rest
# layout:  how reported paths map to browsable source URLs
# checks:  the tools run over the tree and their weight in the overall score
";

/// Load project configuration from the analyzed directory.
///
/// Searches for `codegrade.toml` then `.codegraderc.json`. Unreadable or
/// invalid files are logged and the defaults are used.
pub fn load_project_config(repo_path: &Path) -> ProjectConfig {
    let toml_path = repo_path.join("codegrade.toml");
    if toml_path.exists() {
        match load_toml_config(&toml_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", toml_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {:#}", toml_path.display(), e);
            }
        }
    }

    let json_path = repo_path.join(".codegraderc.json");
    if json_path.exists() {
        match load_json_config(&json_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", json_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {:#}", json_path.display(), e);
            }
        }
    }

    debug!("No project config found, using defaults");
    ProjectConfig::default()
}

/// Load an explicitly requested configuration file; any failure is an error
pub fn load_config_file(path: &Path) -> anyhow::Result<ProjectConfig> {
    let is_json = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        load_json_config(path)
    } else {
        load_toml_config(path)
    }
}

/// Load configuration from a TOML file
fn load_toml_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ProjectConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a JSON file
fn load_json_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ProjectConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

fn render_flag(template: &str, value: &str) -> String {
    template.replacen(PLACEHOLDER, value, 1)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests;
