//! One update cycle: version check, stage, verify, apply, clean up.
//!
//! ```text
//! VersionCheck ─ same ──────────────────────────────▶ UpToDate
//!      │ different
//!      ▼
//!    Stage ─ staged file valid ─────────────┐
//!      │ missing / invalid                  │
//!      ▼                                    ▼
//!    Fetch ─▶ VerifyFetched ─ valid ─▶ (settle) Apply ─ ok ─▶ (settle) Cleanup ─▶ Applied
//!                   │ invalid                  │ non-zero
//!                   ▼                          ▼
//!                 Failed                   Failed (staged file kept)
//! ```
//!
//! Every run is a single attempt. Re-running is always safe: a valid staged
//! file is reused instead of downloaded again.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::checksum;
use crate::error::UpdateError;
use crate::release::Release;
use crate::workspace::WorkspaceStore;

/// Where the newest release comes from.
pub trait CatalogSource {
    fn fetch_latest(&self) -> Result<Release, UpdateError>;

    /// URL to download `release` from. Defaults to the link as published.
    fn download_url(&self, release: &Release) -> Result<String, UpdateError> {
        Ok(release.download_url.clone())
    }
}

/// Streams a remote file to a local path, replacing it.
pub trait Fetcher {
    fn download(&self, url: &str, dest: &Path) -> Result<u64, UpdateError>;
}

/// The installed scanner that owns the live definitions.
pub trait ScannerTool {
    fn installed_version(&self) -> Result<String, UpdateError>;
    fn apply(&self, staged: &Path) -> Result<(), UpdateError>;
}

impl<T: CatalogSource + ?Sized> CatalogSource for &T {
    fn fetch_latest(&self) -> Result<Release, UpdateError> {
        (**self).fetch_latest()
    }

    fn download_url(&self, release: &Release) -> Result<String, UpdateError> {
        (**self).download_url(release)
    }
}

impl<T: Fetcher + ?Sized> Fetcher for &T {
    fn download(&self, url: &str, dest: &Path) -> Result<u64, UpdateError> {
        (**self).download(url, dest)
    }
}

impl<T: ScannerTool + ?Sized> ScannerTool for &T {
    fn installed_version(&self) -> Result<String, UpdateError> {
        (**self).installed_version()
    }

    fn apply(&self, staged: &Path) -> Result<(), UpdateError> {
        (**self).apply(staged)
    }
}

/// Terminal result of one run. Only logged, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    UpToDate,
    Applied,
    Failed,
}

impl UpdateOutcome {
    pub fn of(result: &Result<CycleReport, UpdateError>) -> Self {
        match result {
            Ok(report) => report.outcome,
            Err(_) => UpdateOutcome::Failed,
        }
    }
}

/// What a successful run did.
#[derive(Debug)]
pub struct CycleReport {
    pub outcome: UpdateOutcome,
    pub installed_version: String,
    pub release: Release,
    /// Set once the release has been staged.
    pub staged_path: Option<PathBuf>,
    /// True if the file came over the network this run (false = reused or up to date).
    pub downloaded: bool,
    /// Apply succeeded but the staged file could not be removed.
    pub cleanup_error: Option<UpdateError>,
}

/// Installed vs published version, without touching anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCheck {
    pub installed_version: String,
    pub release: Release,
}

impl VersionCheck {
    pub fn needs_update(&self) -> bool {
        !self.release.matches_installed(&self.installed_version)
    }
}

pub struct UpdateOrchestrator<C, F, T> {
    catalog: C,
    fetcher: F,
    tool: T,
    workspace: WorkspaceStore,
    settle_delay: Duration,
}

impl<C, F, T> UpdateOrchestrator<C, F, T>
where
    C: CatalogSource,
    F: Fetcher,
    T: ScannerTool,
{
    pub fn new(catalog: C, fetcher: F, tool: T, workspace: WorkspaceStore) -> Self {
        Self {
            catalog,
            fetcher,
            tool,
            workspace,
            settle_delay: Duration::from_secs(3),
        }
    }

    /// Pause before apply and before cleanup so file handles are released.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn workspace(&self) -> &WorkspaceStore {
        &self.workspace
    }

    /// Ask the tool and the catalog; no download, no filesystem changes.
    pub fn check(&self) -> Result<VersionCheck, UpdateError> {
        let installed_version = self.tool.installed_version()?;
        let release = self.catalog.fetch_latest()?;
        Ok(VersionCheck {
            installed_version,
            release,
        })
    }

    /// Run one full update cycle.
    pub fn run(&self) -> Result<CycleReport, UpdateError> {
        let check = self.check()?;
        if !check.needs_update() {
            tracing::info!("definitions are current ({})", check.installed_version);
            return Ok(CycleReport {
                outcome: UpdateOutcome::UpToDate,
                installed_version: check.installed_version,
                release: check.release,
                staged_path: None,
                downloaded: false,
                cleanup_error: None,
            });
        }
        let VersionCheck {
            installed_version,
            release,
        } = check;
        tracing::info!(
            "update needed: installed {}, latest {}",
            installed_version,
            release.version
        );

        self.workspace.ensure_ready()?;
        let staged = self.workspace.staged_path(&release)?;
        let downloaded = self.stage(&release, &staged)?;

        self.settle();
        self.tool.apply(&staged)?;
        self.settle();

        let cleanup_error = match self.workspace.cleanup(&staged) {
            Ok(()) => None,
            Err(e) => {
                tracing::error!("definitions applied, but cleanup failed: {}", e);
                Some(e)
            }
        };

        tracing::info!("definitions {} applied", release.version);
        Ok(CycleReport {
            outcome: UpdateOutcome::Applied,
            installed_version,
            release,
            staged_path: Some(staged),
            downloaded,
            cleanup_error,
        })
    }

    /// Make sure a verified copy of `release` sits at `staged`.
    /// Returns whether it had to be downloaded.
    fn stage(&self, release: &Release, staged: &Path) -> Result<bool, UpdateError> {
        if staged.is_file() {
            match checksum::verify(staged, &release.expected_checksum) {
                Ok(true) => {
                    tracing::info!("latest definitions already downloaded");
                    return Ok(false);
                }
                Ok(false) => {
                    tracing::info!("staged file is stale or partial; downloading again")
                }
                Err(e) => tracing::warn!("could not verify staged file ({}); downloading again", e),
            }
        }

        let url = self.catalog.download_url(release)?;
        self.fetcher.download(&url, staged)?;
        if !checksum::verify(staged, &release.expected_checksum)? {
            tracing::error!("downloaded file failed checksum verification");
            return Err(UpdateError::ChecksumMismatch {
                path: staged.to_path_buf(),
                expected: release.expected_checksum.clone(),
            });
        }
        Ok(true)
    }

    fn settle(&self) {
        if !self.settle_delay.is_zero() {
            thread::sleep(self.settle_delay);
        }
    }
}
