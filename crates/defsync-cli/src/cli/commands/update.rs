//! `defsync update` – run one update cycle.

use defsync_core::config::DefsyncConfig;
use defsync_core::downloader::{DownloadProgress, Downloader};
use defsync_core::workspace::WorkspaceStore;
use defsync_core::UpdateOutcome;
use std::io::Write;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::{build_pipeline, exit_code_for};
use crate::cli::EXIT_OK;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

fn print_progress(stats: &DownloadProgress) {
    let done_mib = stats.bytes_done as f64 / 1_048_576.0;
    let rate_mib = stats.bytes_per_sec() / 1_048_576.0;
    let line = match (stats.total_bytes, stats.fraction()) {
        (Some(total), Some(fraction)) => {
            let eta = stats
                .eta_secs()
                .map(|s| format!("{:.0}s", s))
                .unwrap_or_else(|| "?".to_string());
            format!(
                "\r  {:.1} / {:.1} MiB ({:.1}%)  {:.2} MiB/s  ETA {}  ",
                done_mib,
                total as f64 / 1_048_576.0,
                fraction * 100.0,
                rate_mib,
                eta
            )
        }
        _ => format!("\r  {:.1} MiB  {:.2} MiB/s  ", done_mib, rate_mib),
    };
    let mut err = std::io::stderr().lock();
    let _ = err.write_all(line.as_bytes());
    let _ = err.flush();
}

/// Console progress, throttled; the final chunk is always shown.
fn progress_printer() -> Box<dyn Fn(&DownloadProgress) + Send + Sync> {
    let last_print: Mutex<Option<Instant>> = Mutex::new(None);
    Box::new(move |stats: &DownloadProgress| {
        let now = Instant::now();
        let Ok(mut last) = last_print.lock() else {
            return;
        };
        let due = last.map_or(true, |t| now.duration_since(t) >= PROGRESS_INTERVAL);
        if due || stats.is_complete() {
            print_progress(stats);
            *last = Some(now);
            if stats.is_complete() {
                eprintln!();
            }
        }
    })
}

pub fn run_update(cfg: &DefsyncConfig, workspace: WorkspaceStore, no_settle: bool) -> i32 {
    tracing::info!("starting definitions update");
    let downloader = Downloader::new(&cfg.network).with_progress(progress_printer());
    let pipeline = match build_pipeline(cfg, workspace, downloader) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("defsync: {}", e);
            return exit_code_for(&e);
        }
    };
    let pipeline = if no_settle {
        pipeline.with_settle_delay(Duration::ZERO)
    } else {
        pipeline
    };

    let result = pipeline.run();
    let outcome = UpdateOutcome::of(&result);
    tracing::info!(?outcome, "update finished");
    match result {
        Ok(report) => {
            match report.outcome {
                UpdateOutcome::UpToDate => {
                    println!("Definitions are current ({}).", report.installed_version)
                }
                _ => println!(
                    "Definitions updated: {} -> {}.",
                    report.installed_version, report.release.version
                ),
            }
            if let Some(e) = &report.cleanup_error {
                eprintln!("defsync: warning: {}", e);
            }
            EXIT_OK
        }
        Err(e) => {
            tracing::error!("update failed: {}", e);
            eprintln!("defsync: update failed: {}", e);
            exit_code_for(&e)
        }
    }
}
