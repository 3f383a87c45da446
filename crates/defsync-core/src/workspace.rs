//! On-disk staging area.
//!
//! Layout: `<root>/defs/<basename of download url>` for staged files and
//! `<root>/defsync.log` for the run log. The workspace is not locked;
//! overlapping runs must be prevented by whoever schedules them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::UpdateError;
use crate::release::Release;
use crate::retry::{run_with_retry, RetryPolicy};

/// Subdirectory holding staged definitions files.
pub const DEFS_DIR: &str = "defs";
/// Log file name in the workspace root.
pub const LOG_FILE: &str = "defsync.log";

#[derive(Debug, Clone)]
pub struct WorkspaceStore {
    root: PathBuf,
    cleanup_policy: RetryPolicy,
}

impl WorkspaceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cleanup_policy: RetryPolicy::default(),
        }
    }

    pub fn with_cleanup_policy(mut self, policy: RetryPolicy) -> Self {
        self.cleanup_policy = policy;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn definitions_dir(&self) -> PathBuf {
        self.root.join(DEFS_DIR)
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    /// Create the root and `defs/` if missing. Idempotent.
    pub fn ensure_ready(&self) -> Result<(), UpdateError> {
        let defs = self.definitions_dir();
        fs::create_dir_all(&defs).map_err(|e| UpdateError::io(&defs, e))?;
        Ok(())
    }

    /// Where `release` is staged. Pure path computation; touches nothing.
    pub fn staged_path(&self, release: &Release) -> Result<PathBuf, UpdateError> {
        let name = release
            .file_name()
            .ok_or_else(|| UpdateError::InvalidStagedName {
                url: release.download_url.clone(),
            })?;
        Ok(self.definitions_dir().join(name))
    }

    /// Delete a staged file, retrying while the OS still holds it.
    ///
    /// A file that is already gone counts as cleaned up.
    pub fn cleanup(&self, path: &Path) -> Result<(), UpdateError> {
        tracing::info!("cleaning up {}", path.display());
        let result = run_with_retry(
            &self.cleanup_policy,
            |e: &io::Error| e.kind() != io::ErrorKind::NotFound,
            || fs::remove_file(path),
        );
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("{} already removed", path.display());
                Ok(())
            }
            Err(e) => Err(UpdateError::Cleanup {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(url: &str) -> Release {
        Release {
            download_url: url.into(),
            version: "5678".into(),
            expected_checksum: "A".repeat(32),
        }
    }

    #[test]
    fn ensure_ready_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let ws = WorkspaceStore::new(dir.path().join("ws"));
        ws.ensure_ready().unwrap();
        ws.ensure_ready().unwrap();
        assert!(dir.path().join("ws").join("defs").is_dir());
    }

    #[test]
    fn staged_path_uses_url_basename() {
        let ws = WorkspaceStore::new("/var/lib/defsync");
        let p = ws
            .staged_path(&release("http://example.com/dl/sigs-5678.sgnx"))
            .unwrap();
        assert_eq!(p, Path::new("/var/lib/defsync/defs/sigs-5678.sgnx"));
        assert!(!p.exists());
    }

    #[test]
    fn staged_path_rejects_directory_url() {
        let ws = WorkspaceStore::new("/tmp/ws");
        let err = ws.staged_path(&release("http://example.com/dl/")).unwrap_err();
        assert!(matches!(err, UpdateError::InvalidStagedName { .. }));
    }

    #[test]
    fn staged_path_never_leaves_definitions_dir() {
        let ws = WorkspaceStore::new("C:/ws");
        for href in [r"..\..\..\Windows\evil.sgnx", r"C:\Windows\evil.sgnx", "../evil.sgnx/.."] {
            let err = ws.staged_path(&release(href)).unwrap_err();
            assert!(
                matches!(err, UpdateError::InvalidStagedName { .. }),
                "{href} gave {err:?}"
            );
        }
    }

    #[test]
    fn cleanup_removes_file_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let ws = WorkspaceStore::new(dir.path()).with_cleanup_policy(RetryPolicy::once());
        ws.ensure_ready().unwrap();
        let staged = ws.definitions_dir().join("sigs.sgnx");
        fs::write(&staged, b"data").unwrap();
        ws.cleanup(&staged).unwrap();
        assert!(!staged.exists());
        ws.cleanup(&staged).unwrap();
    }

    #[test]
    fn cleanup_failure_is_cleanup_error() {
        let dir = tempfile::tempdir().unwrap();
        let ws = WorkspaceStore::new(dir.path()).with_cleanup_policy(RetryPolicy::once());
        // A directory cannot be removed with remove_file.
        let not_a_file = dir.path().join("defs");
        fs::create_dir_all(&not_a_file).unwrap();
        let err = ws.cleanup(&not_a_file).unwrap_err();
        assert!(matches!(err, UpdateError::Cleanup { .. }));
    }
}
