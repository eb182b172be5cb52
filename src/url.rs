//! Source layout: path normalization and browsable source URLs
//!
//! Analyzed trees are staged under a source root using import-path style
//! directories (`repos/src/github.com/owner/repo/...`). Reported paths are
//! stripped of that root, and their URL is derived from the namespace the
//! staged directory lives in.

use crate::config::LayoutConfig;

/// Maps staged paths to display names and hosted URLs
#[derive(Debug, Clone)]
pub struct SourceLayout {
    config: LayoutConfig,
}

impl SourceLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Strip the staging root from a path token taken from a tool report.
    /// Paths outside the staging root are returned unchanged.
    pub fn normalize<'a>(&self, path: &'a str) -> &'a str {
        let root = self.config.source_root.trim_end_matches('/');
        if root.is_empty() {
            return path;
        }
        match path.strip_prefix(root) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => path,
        }
    }

    /// Name shown for a normalized path found while checking `base_dir`.
    ///
    /// For `/host/owner/repo/...` paths on a known host the leading host and
    /// owner segments are dropped. Other paths are shown relative to
    /// `base_dir` when they lie under it.
    pub fn display_name(&self, base_dir: &str, normalized: &str) -> String {
        let segments: Vec<&str> = normalized.split('/').collect();
        let on_known_host = segments.len() > 3
            && segments[0].is_empty()
            && self.config.hosts.iter().any(|h| h == segments[1]);
        if on_known_host {
            return segments[3..].join("/");
        }

        let base = base_dir.trim_end_matches('/');
        match normalized.strip_prefix(base) {
            Some(rest) if !base.is_empty() && rest.starts_with('/') && rest.len() > 1 => {
                rest[1..].to_string()
            }
            _ => normalized.to_string(),
        }
    }

    /// Browsable URL for `file_path` (a normalized path) found while checking
    /// `base_dir`. Returns an empty string when the layout is unknown.
    pub fn resolve_url(&self, base_dir: &str, file_path: &str) -> String {
        let root = format!("{}/", self.config.source_root.trim_end_matches('/'));
        let base = base_dir.strip_prefix(root.as_str()).unwrap_or(base_dir);
        let base = base.trim_end_matches('/');
        let branch = &self.config.branch;

        for module in &self.config.modules {
            if let Some(rest) = base.strip_prefix(module.prefix.as_str()) {
                let repo = rest.split('/').next().unwrap_or_default();
                if repo.is_empty() {
                    return String::new();
                }
                let in_repo = strip_dir_prefix(file_path, &format!("/{}{repo}", module.prefix));
                return format!(
                    "{}/{repo}/blob/{branch}{in_repo}",
                    module.owner_url.trim_end_matches('/')
                );
            }
        }

        let segments: Vec<&str> = base.split('/').collect();
        let on_known_host = segments.len() >= 3
            && segments[..3].iter().all(|s| !s.is_empty())
            && self.config.hosts.iter().any(|h| h == segments[0]);
        if on_known_host {
            let repo_root = segments[..3].join("/");
            let in_repo = strip_dir_prefix(file_path, &format!("/{repo_root}"));
            return format!("https://{repo_root}/blob/{branch}{in_repo}");
        }

        String::new()
    }
}

/// Strip `prefix` only on a path-segment boundary
fn strip_dir_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    match path.strip_prefix(prefix) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    }
}
