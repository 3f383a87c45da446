//! Adapter for the installed command-line scanner.
//!
//! The tool is opaque: we only ask it for its local definitions version and
//! hand it a verified file to apply. Its exit code is the whole contract.

pub mod platform;
mod process;

pub use process::ToolOutput;

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::UpdateError;
use crate::orchestrator::ScannerTool;

/// Mode argument: print `"<version> - <details>"`.
pub const VERSION_ARG: &str = "/displaylocaldefversion";
/// Mode argument: apply the definitions file that follows.
pub const APPLY_ARG: &str = "/applydefs";
const VERSION_DELIMITER: &str = " - ";

#[derive(Debug, Clone)]
pub struct ExternalScannerTool {
    program: PathBuf,
    leading_args: Vec<OsString>,
    timeout: Option<Duration>,
}

impl ExternalScannerTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            timeout: None,
        }
    }

    /// Arguments placed before the mode argument (wrapper scripts, emulators).
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn invoke(&self, mode_args: &[&OsStr]) -> Result<ToolOutput, UpdateError> {
        let args = self
            .leading_args
            .iter()
            .map(OsString::as_os_str)
            .chain(mode_args.iter().copied());
        process::run(&self.program, args, self.timeout)
    }

    /// Definitions version currently installed, as reported by the tool.
    pub fn installed_version(&self) -> Result<String, UpdateError> {
        let out = self.invoke(&[OsStr::new(VERSION_ARG)])?;
        if !out.status.success() {
            tracing::warn!(
                "{} {} exited with {}",
                self.program.display(),
                VERSION_ARG,
                out.status
            );
        }
        let version = parse_version(&out.stdout);
        if version.is_empty() {
            tracing::warn!(
                "scanner tool printed no definitions version; treating as not installed"
            );
        }
        tracing::info!("installed definitions version: {}", version);
        Ok(version)
    }

    /// Apply a verified definitions file. Non-zero exit is `ApplyFailed`
    /// carrying everything the tool printed.
    pub fn apply(&self, staged: &Path) -> Result<ToolOutput, UpdateError> {
        tracing::info!("applying definitions from {}", staged.display());
        let out = self.invoke(&[OsStr::new(APPLY_ARG), staged.as_os_str()])?;
        let output = out.combined();
        if !output.trim().is_empty() {
            tracing::debug!("scanner tool output:\n{}", output.trim_end());
        }
        if out.status.success() {
            tracing::info!("definitions applied successfully");
            Ok(out)
        } else {
            tracing::error!("failed to apply definitions: tool exited with {}", out.status);
            Err(UpdateError::ApplyFailed {
                code: out.status.code(),
                output,
            })
        }
    }
}

impl ScannerTool for ExternalScannerTool {
    fn installed_version(&self) -> Result<String, UpdateError> {
        ExternalScannerTool::installed_version(self)
    }

    fn apply(&self, staged: &Path) -> Result<(), UpdateError> {
        ExternalScannerTool::apply(self, staged).map(|_| ())
    }
}

/// Version token: text before the first `" - "`, trimmed. Empty when the
/// tool printed nothing usable, which never equals a published version.
pub fn parse_version(stdout: &str) -> String {
    let head = match stdout.find(VERSION_DELIMITER) {
        Some(i) => &stdout[..i],
        None => stdout,
    };
    head.trim().to_string()
}
