//! Logging init: append to `defsync.log` in the workspace, or fall back to stderr.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,defsync=debug,defsync_core=debug";

/// Install the global subscriber writing through `writer`. `RUST_LOG`
/// overrides the default filter.
fn install<W>(writer: W) -> io::Result<()>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

/// Append timestamped records to `log_path`, creating it and its parent.
/// Errors leave no subscriber installed, so the caller can fall back to stderr.
pub fn init_logging(log_path: &Path) -> io::Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    install(Mutex::new(file))?;
    tracing::info!("defsync logging initialized at {}", log_path.display());
    Ok(())
}

/// Log to stderr only. A subscriber already installed is left in place.
pub fn init_logging_stderr() {
    let _ = install(io::stderr);
}
