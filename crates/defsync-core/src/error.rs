//! Error taxonomy for one update cycle.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure of an HTTP transfer (catalog page or definitions file).
#[derive(Debug)]
pub enum TransportError {
    /// Curl reported an error (timeout, connection, DNS, stalled transfer).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// Writing the received bytes to disk failed.
    Storage(io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Curl(e) => write!(f, "{}", e),
            TransportError::Http(code) => write!(f, "HTTP {}", code),
            TransportError::Storage(e) => write!(f, "storage: {}", e),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Curl(e) => Some(e),
            TransportError::Storage(e) => Some(e),
            TransportError::Http(_) => None,
        }
    }
}

impl From<curl::Error> for TransportError {
    fn from(e: curl::Error) -> Self {
        TransportError::Curl(e)
    }
}

#[derive(Debug, Error)]
pub enum UpdateError {
    /// No scanner tool location is known for this operating system.
    #[error("unsupported platform `{os}`: no known scanner tool location (set `tool_path` in config)")]
    UnsupportedPlatform { os: String },

    #[error("failed to fetch catalog {url}: {source}")]
    CatalogFetch {
        url: String,
        #[source]
        source: TransportError,
    },

    /// The catalog page did not have the expected table layout.
    #[error("malformed catalog page: {reason}")]
    CatalogParse { reason: String },

    #[error("download of {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: TransportError,
    },

    /// A freshly downloaded file did not match the published checksum.
    #[error("checksum of {} does not match expected {expected}", .path.display())]
    ChecksumMismatch { path: PathBuf, expected: String },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not start scanner tool {}: {source}", .tool.display())]
    ToolInvocation {
        tool: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("scanner tool {} did not finish within {timeout:?}", .tool.display())]
    ToolTimeout { tool: PathBuf, timeout: Duration },

    /// The tool ran but exited non-zero. `code` is `None` when it was killed by a signal.
    #[error("scanner tool failed to apply definitions (exit code {})", display_code(.code))]
    ApplyFailed { code: Option<i32>, output: String },

    #[error("could not remove staged file {}: {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("download url {url:?} has no usable filename segment")]
    InvalidStagedName { url: String },
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "none".to_string(),
    }
}

impl UpdateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        UpdateError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(reason: impl Into<String>) -> Self {
        UpdateError::CatalogParse {
            reason: reason.into(),
        }
    }
}
