//! Files command - show which files the checks would see

use anyhow::Result;
use codegrade::config::ProjectConfig;
use codegrade::discovery::FileDiscoverer;
use std::path::Path;

/// Run the files command
pub fn run(path: &Path, config: ProjectConfig, format: &str) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    let discovery = FileDiscoverer::new(config.profile).discover(path);
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&discovery)?);
        return Ok(());
    }

    for file in &discovery.eligible {
        println!("{}", file.display());
    }
    for file in &discovery.skipped {
        println!("skipped: {}", file.display());
    }
    eprintln!(
        "{} files, {} skipped",
        discovery.eligible.len(),
        discovery.skipped.len()
    );
    Ok(())
}
