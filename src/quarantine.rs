//! Reversible hiding of skipped files
//!
//! Tools without an exclusion flag scan every file in a directory. Skipped
//! files are renamed with a fixed suffix for the duration of the run and
//! renamed back afterwards. Two runs must never quarantine the same tree
//! concurrently.

use crate::error::{CheckError, CheckResult};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Renames files out of the way and back again
#[derive(Debug, Clone)]
pub struct Quarantine {
    suffix: String,
}

impl Quarantine {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// Name a path carries while quarantined
    pub fn hidden_path(&self, path: &Path) -> PathBuf {
        let mut hidden = path.as_os_str().to_owned();
        hidden.push(&self.suffix);
        PathBuf::from(hidden)
    }

    /// Hide every path. A failure on one file does not stop the others;
    /// the last failure is returned once all renames were attempted.
    pub fn quarantine(&self, paths: &[PathBuf]) -> CheckResult<()> {
        self.rename_all(paths, |p| (p.to_path_buf(), self.hidden_path(p))).1
    }

    /// Undo [`Quarantine::quarantine`] with the same best-effort semantics
    pub fn restore(&self, paths: &[PathBuf]) -> CheckResult<()> {
        self.rename_all(paths, |p| (self.hidden_path(p), p.to_path_buf())).1
    }

    /// Quarantine `paths` and return a guard that restores the ones that
    /// were actually hidden when released or dropped
    pub fn hide(&self, paths: &[PathBuf]) -> QuarantineGuard<'_> {
        let (hidden, result) = self.rename_all(paths, |p| (p.to_path_buf(), self.hidden_path(p)));
        QuarantineGuard {
            quarantine: self,
            hidden,
            hide_result: Some(result),
            restored: false,
        }
    }

    /// Rename every path; returns the paths whose rename succeeded and the
    /// last failure
    fn rename_all<F>(&self, paths: &[PathBuf], names: F) -> (Vec<PathBuf>, CheckResult<()>)
    where
        F: Fn(&Path) -> (PathBuf, PathBuf),
    {
        let mut done = Vec::with_capacity(paths.len());
        let mut last_error = None;
        for path in paths {
            let (from, to) = names(path);
            match std::fs::rename(&from, &to) {
                Ok(()) => done.push(path.clone()),
                Err(source) => {
                    warn!("Failed to rename {} to {}: {}", from.display(), to.display(), source);
                    last_error = Some(CheckError::Rename { from, to, source });
                }
            }
        }
        let result = match last_error {
            Some(err) => Err(err),
            None => Ok(()),
        };
        (done, result)
    }
}

/// Scoped quarantine: restores the hidden files exactly once.
///
/// A path whose rename failed is never renamed back, so a stale hidden
/// copy left by an earlier run cannot replace it.
#[derive(Debug)]
pub struct QuarantineGuard<'a> {
    quarantine: &'a Quarantine,
    hidden: Vec<PathBuf>,
    hide_result: Option<CheckResult<()>>,
    restored: bool,
}

impl QuarantineGuard<'_> {
    /// Outcome of the initial quarantine; can be taken once
    pub fn take_hide_result(&mut self) -> CheckResult<()> {
        self.hide_result.take().unwrap_or(Ok(()))
    }

    /// Original paths that are currently hidden
    pub fn hidden(&self) -> &[PathBuf] {
        &self.hidden
    }

    /// Restore the original names and report the last rename failure
    pub fn release(mut self) -> CheckResult<()> {
        self.restored = true;
        self.quarantine.restore(&self.hidden)
    }
}

impl Drop for QuarantineGuard<'_> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        debug!("Restoring {} quarantined files on drop", self.hidden.len());
        if let Err(e) = self.quarantine.restore(&self.hidden) {
            warn!("Quarantined files not fully restored: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn setup(names: &[&str]) -> (tempfile::TempDir, Vec<PathBuf>) {
        let dir = tempfile::tempdir().unwrap();
        let paths = names
            .iter()
            .map(|n| {
                let p = dir.path().join(n);
                fs::write(&p, n).unwrap();
                p
            })
            .collect();
        (dir, paths)
    }

    #[test]
    fn test_quarantine_then_restore_is_identity() {
        let (_dir, paths) = setup(&["a.pb.go", "b_string.go"]);
        let q = Quarantine::new(".grc.bk");

        q.quarantine(&paths).unwrap();
        for p in &paths {
            assert!(!p.exists());
            assert!(q.hidden_path(p).exists());
        }

        q.restore(&paths).unwrap();
        for p in &paths {
            assert!(p.exists());
            assert!(!q.hidden_path(p).exists());
        }
        assert_eq!(fs::read_to_string(&paths[0]).unwrap(), "a.pb.go");
    }

    #[test]
    fn test_failure_does_not_stop_remaining_files() {
        let (dir, mut paths) = setup(&["a.go", "c.go"]);
        let missing = dir.path().join("missing.go");
        paths.insert(1, missing.clone());
        let q = Quarantine::new(".grc.bk");

        let err = q.quarantine(&paths).unwrap_err();
        match err {
            CheckError::Rename { from, .. } => assert_eq!(from, missing),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(q.hidden_path(&paths[0]).exists());
        assert!(q.hidden_path(&paths[2]).exists());

        assert!(q.restore(&paths).is_err());
        assert!(paths[0].exists());
        assert!(paths[2].exists());
        assert!(!missing.exists());
    }

    #[test]
    fn test_guard_restores_on_drop() {
        let (_dir, paths) = setup(&["gen.go"]);
        let q = Quarantine::new(".hidden");
        {
            let mut guard = q.hide(&paths);
            guard.take_hide_result().unwrap();
            assert!(!paths[0].exists());
        }
        assert!(paths[0].exists());
    }

    #[test]
    fn test_guard_release_reports_restore_errors() {
        let (_dir, paths) = setup(&["gen.go"]);
        let q = Quarantine::new(".hidden");
        let guard = q.hide(&paths);
        fs::remove_file(q.hidden_path(&paths[0])).unwrap();
        assert!(guard.release().is_err());
    }

    #[test]
    fn test_guard_restores_only_what_it_hid() {
        let (dir, mut paths) = setup(&["a.pb.go"]);
        let gone = dir.path().join("gone.pb.go");
        paths.push(gone.clone());
        let q = Quarantine::new(".grc.bk");
        let stale = q.hidden_path(&gone);
        fs::write(&stale, "left over from an earlier run").unwrap();

        let mut guard = q.hide(&paths);
        assert!(guard.take_hide_result().is_err());
        assert_eq!(guard.hidden(), &paths[..1]);

        guard.release().unwrap();
        assert!(paths[0].exists());
        assert!(!gone.exists());
        assert!(stale.exists());
    }

    #[test]
    fn test_empty_batch_is_ok() {
        let q = Quarantine::new(".grc.bk");
        assert!(q.quarantine(&[]).is_ok());
        assert!(q.restore(&[]).is_ok());
    }
}
