//! Source file discovery
//!
//! Walks a directory tree and splits the analyzable files into those that
//! will be checked and those that are skipped as vendored or generated.
//! Excluded directory names prune their whole subtree.

use crate::config::Profile;
use ignore::WalkBuilder;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Comment openers that may precede a generated-file marker
const COMMENT_OPENERS: &[&str] = &["// ", "//", "/* ", "/*"];

/// Upper bound on bytes read when looking at a file's first line
const FIRST_LINE_LIMIT: u64 = 64 * 1024;

/// Files found under a root, split by eligibility
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Discovery {
    pub eligible: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

/// Walks directories according to an analysis profile
#[derive(Debug, Clone)]
pub struct FileDiscoverer {
    profile: Profile,
}

impl FileDiscoverer {
    pub fn new(profile: Profile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Collect eligible and skipped files under `root`.
    ///
    /// Unreadable subtrees are logged and skipped; the walk carries on with
    /// the rest of the tree. Both lists are sorted.
    pub fn discover(&self, root: &Path) -> Discovery {
        let profile = self.profile.clone();
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                if entry.depth() == 0 || !is_dir {
                    return true;
                }
                !profile.is_skipped_dir(&entry.file_name().to_string_lossy())
            })
            .build();

        let mut discovery = Discovery::default();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable path during walk: {}", e);
                    continue;
                }
            };
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }

            let path = entry.into_path();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            if self.profile.has_skipped_suffix(&name) {
                discovery.skipped.push(path);
                continue;
            }
            if !self.profile.has_extension(&path) {
                continue;
            }
            if is_generated(&path, &self.profile.generated_markers) {
                debug!("Skipping generated file {}", path.display());
                discovery.skipped.push(path);
                continue;
            }
            discovery.eligible.push(path);
        }

        discovery.eligible.sort();
        discovery.skipped.sort();
        debug!(
            "Discovered {} eligible and {} skipped files under {}",
            discovery.eligible.len(),
            discovery.skipped.len(),
            root.display()
        );
        discovery
    }

    /// True if a file named in a tool report must not produce a summary:
    /// it carries an excluded suffix or a generated-file marker.
    ///
    /// Report paths are often relative to the tool or already quarantined,
    /// so a path that cannot be opened is only logged at debug level.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let suffixed = path
            .file_name()
            .map(|n| self.profile.has_skipped_suffix(&n.to_string_lossy()))
            .unwrap_or(false);
        if suffixed {
            return true;
        }
        match read_first_line(path) {
            Ok(line) => first_line_is_generated(&line, &self.profile.generated_markers),
            Err(e) => {
                debug!("Cannot inspect reported path {}: {}", path.display(), e);
                false
            }
        }
    }
}

/// Exclusion verdicts for the paths named in one tool report, so each
/// file is opened at most once however many lines mention it
pub struct ExclusionCache<'a> {
    discoverer: &'a FileDiscoverer,
    verdicts: HashMap<String, bool>,
}

impl<'a> ExclusionCache<'a> {
    pub fn new(discoverer: &'a FileDiscoverer) -> Self {
        Self {
            discoverer,
            verdicts: HashMap::new(),
        }
    }

    pub fn is_excluded(&mut self, token: &str) -> bool {
        if let Some(&verdict) = self.verdicts.get(token) {
            return verdict;
        }
        let verdict = self.discoverer.is_excluded(Path::new(token));
        self.verdicts.insert(token.to_string(), verdict);
        verdict
    }
}

/// Whether the first line of the file marks it as generated.
///
/// Only the first line is read. Unreadable files count as hand-written.
pub fn is_generated(path: &Path, markers: &[String]) -> bool {
    match read_first_line(path) {
        Ok(line) => first_line_is_generated(&line, markers),
        Err(e) => {
            warn!("Cannot inspect {}: {}", path.display(), e);
            false
        }
    }
}

fn read_first_line(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    let mut line = Vec::new();
    BufReader::new(file.take(FIRST_LINE_LIMIT)).read_until(b'\n', &mut line)?;
    Ok(String::from_utf8_lossy(&line).into_owned())
}

/// Matches `<comment opener><marker>` at the start of the line, ignoring case
pub fn first_line_is_generated(line: &str, markers: &[String]) -> bool {
    let line = line.to_lowercase();
    COMMENT_OPENERS.iter().any(|opener| {
        line.strip_prefix(opener).is_some_and(|rest| {
            markers
                .iter()
                .any(|marker| rest.starts_with(&marker.to_lowercase()))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn markers() -> Vec<String> {
        Profile::default().generated_markers
    }

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_generated_marker_openers_and_case() {
        let m = markers();
        assert!(first_line_is_generated("// Code generated by stringer; DO NOT EDIT.", &m));
        assert!(first_line_is_generated("//Code generated by protoc", &m));
        assert!(first_line_is_generated("/* AUTOGENERATED FILE */", &m));
        assert!(first_line_is_generated("/*@generated*/", &m));
        assert!(first_line_is_generated("// Auto-Generated, do not edit\n", &m));
    }

    #[test]
    fn test_non_generated_first_lines() {
        let m = markers();
        assert!(!first_line_is_generated("package main", &m));
        assert!(!first_line_is_generated("// Package foo generates things", &m));
        assert!(!first_line_is_generated("  // Code generated", &m));
        assert!(!first_line_is_generated("# generated", &m));
        assert!(!first_line_is_generated("", &m));
    }

    #[test]
    fn test_only_first_line_is_inspected() {
        let dir = tempfile::tempdir().unwrap();
        let late = write(
            dir.path(),
            "late.go",
            "package main\n// Code generated by tool; DO NOT EDIT.\n",
        );
        let early = write(
            dir.path(),
            "early.go",
            "// Code generated by tool; DO NOT EDIT.\npackage main\n",
        );
        assert!(!is_generated(&late, &markers()));
        assert!(is_generated(&early, &markers()));
        assert!(!is_generated(&dir.path().join("missing.go"), &markers()));
    }

    #[test]
    fn test_discover_splits_eligible_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let main = write(root, "main.go", "package main\n");
        let nested = write(root, "pkg/util/util.go", "package util\n");
        let pb = write(root, "pkg/api.pb.go", "package pkg\n");
        let generated = write(root, "pkg/gen.go", "// Code generated. DO NOT EDIT.\npackage pkg\n");
        write(root, "vendor/dep/dep.go", "package dep\n");
        write(root, "pkg/third_party/x/x.go", "package x\n");
        write(root, "README.md", "# readme\n");

        let discovery = FileDiscoverer::new(Profile::default()).discover(root);

        assert_eq!(discovery.eligible, vec![main, nested]);
        assert_eq!(discovery.skipped, vec![pb, generated]);
    }

    #[test]
    fn test_lists_are_disjoint_and_cover_all_analyzable_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for i in 0..5 {
            write(root, &format!("a/f{i}.go"), "package a\n");
            write(root, &format!("a/f{i}_string.go"), "package a\n");
        }
        write(root, "Godeps/_workspace/w.go", "package w\n");

        let discovery = FileDiscoverer::new(Profile::default()).discover(root);
        assert_eq!(discovery.eligible.len(), 5);
        assert_eq!(discovery.skipped.len(), 5);
        assert!(discovery
            .eligible
            .iter()
            .all(|p| !discovery.skipped.contains(p)));
    }

    #[test]
    fn test_root_named_like_skipped_dir_is_still_walked() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("vendor");
        let file = write(&root, "lib.go", "package lib\n");

        let discovery = FileDiscoverer::new(Profile::default()).discover(&root);
        assert_eq!(discovery.eligible, vec![file]);
    }

    #[test]
    fn test_missing_root_yields_empty_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let discovery = FileDiscoverer::new(Profile::default()).discover(&dir.path().join("nope"));
        assert_eq!(discovery, Discovery::default());
    }

    #[test]
    fn test_is_excluded_rechecks_suffix_and_marker() {
        let dir = tempfile::tempdir().unwrap();
        let pb = write(dir.path(), "x.pb.go", "package x\n");
        let gen = write(dir.path(), "y.go", "/* generated */\npackage x\n");
        let plain = write(dir.path(), "z.go", "package x\n");

        let discoverer = FileDiscoverer::new(Profile::default());
        assert!(discoverer.is_excluded(&pb));
        assert!(discoverer.is_excluded(&gen));
        assert!(!discoverer.is_excluded(&plain));
        assert!(!discoverer.is_excluded(Path::new("relative/to/the/tool.go")));
    }

    #[test]
    fn test_exclusion_cache_reads_each_path_once() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "later.go", "package x
");
        let token = file.to_string_lossy().into_owned();
        let discoverer = FileDiscoverer::new(Profile::default());

        let mut cache = ExclusionCache::new(&discoverer);
        assert!(!cache.is_excluded(&token));
        fs::write(&file, "// Code generated later. DO NOT EDIT.\npackage x\n").unwrap();
        assert!(!cache.is_excluded(&token));

        assert!(ExclusionCache::new(&discoverer).is_excluded(&token));
        assert!(cache.is_excluded("api.pb.go"));
    }
}
