use serde::{Deserialize, Serialize};

use crate::core::network::types::ProxySettings;

/// Top-level configuration file (`~/.proxywatch/config.toml`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub proxy: ProxyConfig,
    pub monitor: MonitorConfig,
    pub probe: ProbeConfig,
}

/// The proxy the user intends to use, and where to test it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub ip: String,
    /// Kept as text so a bad value is reported by the probe, not the loader
    pub port: String,
    /// "http" | "https" | "socks"
    pub protocol: String,
    /// Network service name, e.g. "Wi-Fi"
    pub interface: String,
    pub test_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub tick_interval_ms: u64,
    pub settle_delay_ms: u64,
    /// Probe once at startup when a system proxy is already on
    pub startup_check: bool,
    pub notifications: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub request_timeout_secs: u64,
    pub resource_timeout_secs: u64,
}

/// What a probe needs from the settings store, read fresh for every probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub proxy: ProxySettings,
    pub test_url: String,
}
