use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Page listing the published definitions, newest first.
pub const DEFAULT_CATALOG_URL: &str = "http://definitions.vipreantivirus.com";

/// Errors loading or writing the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot locate XDG directories: {0}")]
    Xdg(#[from] xdg::BaseDirectoriesError),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("could not serialize default config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// HTTP timeouts (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    pub connect_timeout_secs: u64,
    /// Whole-request limit for the catalog page.
    pub catalog_timeout_secs: u64,
    /// A download slower than this many bytes/sec for `low_speed_time_secs` is aborted.
    pub low_speed_limit_bytes: u32,
    pub low_speed_time_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            catalog_timeout_secs: 30,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 60,
        }
    }
}

/// Retry for deleting the staged file after a successful apply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CleanupConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 1000,
        }
    }
}

impl CleanupConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        let base = Duration::from_millis(self.delay_ms);
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: base,
            max_delay: base.saturating_mul(8),
        }
    }
}

fn default_tool_timeout_secs() -> u64 {
    600
}

/// Configuration loaded from `~/.config/defsync/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DefsyncConfig {
    pub catalog_url: String,
    /// Staging root; `None` = `$XDG_DATA_HOME/defsync/workspace`.
    #[serde(default)]
    pub workspace_dir: Option<PathBuf>,
    /// Scanner tool executable; `None` = platform default location.
    #[serde(default)]
    pub tool_path: Option<PathBuf>,
    /// Arguments placed before the mode argument (e.g. when running through a wrapper).
    #[serde(default)]
    pub tool_args: Vec<String>,
    /// Pause before apply and before cleanup so the OS can release file handles.
    pub settle_delay_ms: u64,
    /// Kill the scanner tool after this long; 0 waits forever.
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

impl Default for DefsyncConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            workspace_dir: None,
            tool_path: None,
            tool_args: Vec::new(),
            settle_delay_ms: 3000,
            tool_timeout_secs: default_tool_timeout_secs(),
            network: NetworkConfig::default(),
            cleanup: CleanupConfig::default(),
        }
    }
}

impl DefsyncConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        (self.tool_timeout_secs > 0).then(|| Duration::from_secs(self.tool_timeout_secs))
    }

    /// Configured workspace, or the XDG data default (created if missing).
    pub fn resolve_workspace_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.workspace_dir {
            return Ok(dir.clone());
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix("defsync")?;
        xdg_dirs
            .create_data_directory("workspace")
            .map_err(|source| ConfigError::Io {
                path: PathBuf::from("workspace"),
                source,
            })
    }
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("defsync")?;
    xdg_dirs
        .place_config_file("config.toml")
        .map_err(|source| ConfigError::Io {
            path: PathBuf::from("config.toml"),
            source,
        })
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DefsyncConfig, ConfigError> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DefsyncConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, toml).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load an explicit config file; it must exist.
pub fn load_from_path(path: &Path) -> Result<DefsyncConfig, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = DefsyncConfig::default();
        assert_eq!(cfg.catalog_url, DEFAULT_CATALOG_URL);
        assert_eq!(cfg.settle_delay(), Duration::from_secs(3));
        assert_eq!(cfg.tool_timeout(), Some(Duration::from_secs(600)));
        assert_eq!(cfg.network.connect_timeout_secs, 15);
        assert_eq!(cfg.cleanup.max_attempts, 3);
        assert!(cfg.tool_args.is_empty());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = DefsyncConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: DefsyncConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_minimal_uses_defaults() {
        let toml = r#"
            catalog_url = "http://mirror.local/defs"
            settle_delay_ms = 0
        "#;
        let cfg: DefsyncConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.catalog_url, "http://mirror.local/defs");
        assert!(cfg.workspace_dir.is_none());
        assert!(cfg.tool_path.is_none());
        assert_eq!(cfg.tool_timeout(), Some(Duration::from_secs(600)));
        assert_eq!(cfg.network, NetworkConfig::default());
        assert_eq!(cfg.cleanup, CleanupConfig::default());
    }

    #[test]
    fn config_toml_custom_sections() {
        let toml = r#"
            catalog_url = "http://mirror.local/defs"
            workspace_dir = "/srv/defsync"
            tool_path = "/usr/bin/wine"
            tool_args = ["C:/Program Files (x86)/VIPRE/SBAMCommandLineScanner.exe"]
            settle_delay_ms = 500
            tool_timeout_secs = 120

            [network]
            connect_timeout_secs = 5
            catalog_timeout_secs = 10
            low_speed_limit_bytes = 512
            low_speed_time_secs = 30

            [cleanup]
            max_attempts = 5
            delay_ms = 200
        "#;
        let cfg: DefsyncConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.workspace_dir.as_deref(), Some(Path::new("/srv/defsync")));
        assert_eq!(cfg.tool_args.len(), 1);
        assert_eq!(cfg.tool_timeout(), Some(Duration::from_secs(120)));
        let forever: DefsyncConfig = toml::from_str(
            "catalog_url = \"x\"\nsettle_delay_ms = 0\ntool_timeout_secs = 0\n",
        )
        .unwrap();
        assert_eq!(forever.tool_timeout(), None);
        assert_eq!(cfg.network.low_speed_limit_bytes, 512);
        let policy = cfg.cleanup.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(200));
    }

    #[test]
    fn load_from_path_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "catalog_url = 42").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        let missing = load_from_path(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
