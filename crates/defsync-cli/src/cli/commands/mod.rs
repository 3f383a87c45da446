//! CLI command handlers, one per file.

mod check;
mod checksum;
mod completions;
mod update;

pub use check::run_check;
pub use checksum::run_checksum;
pub use completions::run_completions;
pub use update::run_update;

use defsync_core::catalog::CatalogClient;
use defsync_core::config::DefsyncConfig;
use defsync_core::downloader::Downloader;
use defsync_core::scanner::{platform, ExternalScannerTool};
use defsync_core::workspace::WorkspaceStore;
use defsync_core::{UpdateError, UpdateOrchestrator};

use super::{EXIT_FAILURE, EXIT_UNSUPPORTED_PLATFORM};

pub(crate) type Pipeline = UpdateOrchestrator<CatalogClient, Downloader, ExternalScannerTool>;

/// Wire the real collaborators from config. Fails before any network
/// activity when the scanner tool location is unknown.
pub(crate) fn build_pipeline(
    cfg: &DefsyncConfig,
    workspace: WorkspaceStore,
    downloader: Downloader,
) -> Result<Pipeline, UpdateError> {
    let tool_path = platform::resolve_tool_path(cfg.tool_path.clone())?;
    let tool = ExternalScannerTool::new(tool_path)
        .with_leading_args(cfg.tool_args.iter().cloned())
        .with_timeout(cfg.tool_timeout());
    let catalog = CatalogClient::new(cfg.catalog_url.clone(), &cfg.network);
    tracing::debug!(
        "scanner tool: {}, catalog: {}",
        tool.program().display(),
        catalog.url()
    );
    Ok(UpdateOrchestrator::new(catalog, downloader, tool, workspace)
        .with_settle_delay(cfg.settle_delay()))
}

/// Exit code for a failed run.
pub(crate) fn exit_code_for(err: &UpdateError) -> i32 {
    match err {
        UpdateError::UnsupportedPlatform { .. } => EXIT_UNSUPPORTED_PLATFORM,
        _ => EXIT_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_platform_has_its_own_exit_code() {
        let e = UpdateError::UnsupportedPlatform { os: "plan9".into() };
        assert_eq!(exit_code_for(&e), EXIT_UNSUPPORTED_PLATFORM);
        let e = UpdateError::CatalogParse {
            reason: "no table".into(),
        };
        assert_eq!(exit_code_for(&e), EXIT_FAILURE);
    }

    #[test]
    fn configured_tool_builds_pipeline() {
        let cfg = DefsyncConfig {
            tool_path: Some("/opt/scanner".into()),
            ..DefsyncConfig::default()
        };
        let ws = WorkspaceStore::new("/tmp/defsync-test");
        let p = build_pipeline(&cfg, ws, Downloader::new(&cfg.network)).unwrap();
        assert_eq!(p.workspace().root(), std::path::Path::new("/tmp/defsync-test"));
    }
}
