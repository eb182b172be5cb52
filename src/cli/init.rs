//! Init command - write a default codegrade.toml

use anyhow::{Context, Result};
use codegrade::config::{ProjectConfig, DEFAULT_CONFIG_TOML};
use std::path::Path;

/// Run the init command
pub fn run(path: &Path, force: bool) -> Result<()> {
    if !path.is_dir() {
        anyhow::bail!("Path is not a directory: {}", path.display());
    }

    let config_path = path.join("codegrade.toml");
    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }

    let body = ProjectConfig::default().to_toml()?;
    std::fs::write(&config_path, format!("{DEFAULT_CONFIG_TOML}\n{body}"))
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created {}", config_path.display());
    Ok(())
}
