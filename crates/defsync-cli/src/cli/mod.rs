//! CLI for the defsync signature updater.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use defsync_core::checksum::Algorithm;
use defsync_core::config::{self, DefsyncConfig};
use defsync_core::logging;
use defsync_core::workspace::WorkspaceStore;
use std::path::PathBuf;

use commands::{run_check, run_checksum, run_completions, run_update};

/// Definitions applied or already current.
pub const EXIT_OK: i32 = 0;
/// Any pipeline failure.
pub const EXIT_FAILURE: i32 = 1;
/// No scanner tool location known for this platform.
pub const EXIT_UNSUPPORTED_PLATFORM: i32 = -1;

/// Top-level CLI for the defsync signature updater.
#[derive(Debug, Parser)]
#[command(name = "defsync")]
#[command(about = "defsync: keep locally installed antivirus definitions current", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/defsync/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the catalog page URL.
    #[arg(long, global = true, value_name = "URL")]
    pub catalog_url: Option<String>,

    /// Override the scanner tool executable.
    #[arg(long = "tool", global = true, value_name = "PATH")]
    pub tool_path: Option<PathBuf>,

    /// Override the workspace directory (staged files and log).
    #[arg(long, global = true, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Defaults to `update`.
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run one update cycle: check, download, verify, apply, clean up.
    Update {
        /// Skip the settle pauses around the scanner tool.
        #[arg(long)]
        no_settle: bool,
    },

    /// Report installed and latest versions without downloading anything.
    Check,

    /// Print the digest of a file (e.g. to compare with the catalog).
    Checksum {
        /// Path to the file.
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = AlgoArg::Md5)]
        algo: AlgoArg,
    },

    /// Print shell completions.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlgoArg {
    Md5,
    Sha256,
}

impl From<AlgoArg> for Algorithm {
    fn from(a: AlgoArg) -> Self {
        match a {
            AlgoArg::Md5 => Algorithm::Md5,
            AlgoArg::Sha256 => Algorithm::Sha256,
        }
    }
}

impl Cli {
    /// Config file (explicit or XDG default) with command-line overrides applied.
    fn load_config(&self) -> Result<DefsyncConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        if let Some(url) = &self.catalog_url {
            cfg.catalog_url = url.clone();
        }
        if let Some(tool) = &self.tool_path {
            cfg.tool_path = Some(tool.clone());
        }
        if let Some(dir) = &self.workspace {
            cfg.workspace_dir = Some(dir.clone());
        }
        Ok(cfg)
    }

    /// Load config, resolve the workspace and start logging into it.
    fn prepare(&self) -> Result<(DefsyncConfig, WorkspaceStore)> {
        let cfg = self.load_config()?;
        let root = cfg
            .resolve_workspace_dir()
            .context("cannot determine workspace directory")?;
        let workspace = WorkspaceStore::new(root).with_cleanup_policy(cfg.cleanup.retry_policy());
        init_logging(&workspace);
        tracing::debug!("loaded config: {:?}", cfg);
        Ok((cfg, workspace))
    }
}

fn init_logging(workspace: &WorkspaceStore) {
    if let Err(e) = logging::init_logging(&workspace.log_path()) {
        logging::init_logging_stderr();
        tracing::warn!(
            "could not open log file {} ({}); logging to stderr",
            workspace.log_path().display(),
            e
        );
    }
}

/// Parse arguments, dispatch, and return the process exit code.
pub fn run() -> Result<i32> {
    let mut cli = Cli::parse();
    let command = cli
        .command
        .take()
        .unwrap_or(CliCommand::Update { no_settle: false });

    let code = match command {
        CliCommand::Update { no_settle } => {
            let (cfg, workspace) = cli.prepare()?;
            run_update(&cfg, workspace, no_settle)
        }
        CliCommand::Check => {
            let (cfg, workspace) = cli.prepare()?;
            run_check(&cfg, workspace)
        }
        CliCommand::Checksum { path, algo } => {
            run_checksum(&path, algo.into())?;
            EXIT_OK
        }
        CliCommand::Completions { shell } => {
            run_completions(shell);
            EXIT_OK
        }
    };
    Ok(code)
}

#[cfg(test)]
mod tests;
