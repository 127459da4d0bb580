//! Settings store.
//!
//! The configuration lives in `~/.proxywatch/config.toml`. A missing file is
//! not an error: defaults apply until `--init` writes one. Probes read the
//! file again every time so edits take effect without a restart.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::{Config, ProbeSettings};
use crate::core::network::debug_logger::get_debug_logger;
use crate::core::network::health_monitor::MonitorOptions;
use crate::core::network::proxy_probe::{validate_target_url, ProbeTimeouts};
use crate::core::network::types::ProxySettings;

const CONFIG_DIR: &str = ".proxywatch";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Home directory not found")]
    HomeDirNotFound,
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Configuration file already exists: {0}")]
    AlreadyExists(PathBuf),
    #[error("Invalid configuration:\n  - {}", .0.join("\n  - "))]
    Invalid(Vec<String>),
}

/// Source of the proxy settings and test URL used by each probe
pub trait SettingsSource: Send + Sync {
    fn probe_settings(&self) -> ProbeSettings;
}

impl Config {
    /// `~/.proxywatch/config.toml`
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
        Ok(home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(io_error)
    }

    /// Write a default configuration file; never overwrites an existing one
    pub fn init_at(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        Self::default().save_to(path)
    }

    pub fn print(&self) -> Result<(), ConfigError> {
        println!("{}", toml::to_string_pretty(self)?);
        Ok(())
    }

    /// Report every problem at once rather than stopping at the first
    pub fn check(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if let Err(failure) = self.proxy_settings().validate() {
            problems.push(failure.message());
        }
        if validate_target_url(&self.proxy.test_url).is_err() {
            problems.push(format!(
                "test_url \"{}\" must be an http:// or https:// address",
                self.proxy.test_url.trim()
            ));
        }
        if self.proxy.interface.trim().is_empty() {
            problems.push("interface must not be empty".to_string());
        }
        if self.monitor.tick_interval_ms == 0 {
            problems.push("monitor.tick_interval_ms must be greater than 0".to_string());
        }
        if self.probe.request_timeout_secs == 0 || self.probe.resource_timeout_secs == 0 {
            problems.push("probe timeouts must be greater than 0".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }

    pub fn proxy_settings(&self) -> ProxySettings {
        ProxySettings::new(&self.proxy.ip, &self.proxy.port, &self.proxy.protocol)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.monitor.tick_interval_ms.max(1))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.monitor.settle_delay_ms)
    }

    pub fn probe_timeouts(&self) -> ProbeTimeouts {
        ProbeTimeouts::from_secs(self.probe.request_timeout_secs, self.probe.resource_timeout_secs)
    }

    pub fn monitor_options(&self) -> MonitorOptions {
        MonitorOptions {
            settle_delay: self.settle_delay(),
            notify_failures: self.monitor.notifications,
        }
    }
}

impl SettingsSource for Config {
    fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            proxy: self.proxy_settings(),
            test_url: self.proxy.test_url.clone(),
        }
    }
}

/// Settings read from the configuration file on every call
///
/// A file that cannot be read or parsed falls back to the defaults and the
/// error goes to the debug log.
#[derive(Debug, Clone)]
pub struct ConfigFileSettings {
    path: PathBuf,
}

impl ConfigFileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsSource for ConfigFileSettings {
    fn probe_settings(&self) -> ProbeSettings {
        match Config::load_from(&self.path) {
            Ok(config) => config.probe_settings(),
            Err(e) => {
                get_debug_logger().error_sync("ConfigFileSettings", "load_failed", &e.to_string());
                Config::default().probe_settings()
            }
        }
    }
}
