//! `defsync check` – compare installed and published versions.

use defsync_core::config::DefsyncConfig;
use defsync_core::downloader::Downloader;
use defsync_core::workspace::WorkspaceStore;

use super::{build_pipeline, exit_code_for};
use crate::cli::EXIT_OK;

pub fn run_check(cfg: &DefsyncConfig, workspace: WorkspaceStore) -> i32 {
    let check = build_pipeline(cfg, workspace, Downloader::new(&cfg.network))
        .and_then(|pipeline| pipeline.check());
    match check {
        Ok(check) => {
            println!("installed: {}", check.installed_version);
            println!(
                "latest:    {} ({})",
                check.release.version, check.release.download_url
            );
            println!(
                "update needed: {}",
                if check.needs_update() { "yes" } else { "no" }
            );
            EXIT_OK
        }
        Err(e) => {
            tracing::error!("check failed: {}", e);
            eprintln!("defsync: check failed: {}", e);
            exit_code_for(&e)
        }
    }
}
