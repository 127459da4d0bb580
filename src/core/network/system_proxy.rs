//! System proxy state reader.
//!
//! Read-only view of the OS proxy configuration for one network interface.
//! The production store shells out to macOS `networksetup`; each query is a
//! blocking process spawn with noticeable latency, so callers run it off the
//! async executor (see `HealthMonitor`).

use std::path::PathBuf;
use std::process::Command;

use crate::core::network::debug_logger::get_debug_logger;
use crate::core::network::types::{ProxyActivationState, ProxyEndpoint, ProxyProtocol};

pub const NETWORKSETUP_PATH: &str = "/usr/sbin/networksetup";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Network interface name is empty")]
    EmptyInterface,
    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{command} exited with status {code:?}: {output}")]
    ExitStatus {
        command: String,
        code: Option<i32>,
        output: String,
    },
}

/// Read access to the OS-level proxy configuration
pub trait SystemProxyStore: Send + Sync {
    /// True if any of the HTTP, HTTPS or SOCKS proxies is on for `interface`
    fn is_any_proxy_enabled(&self, interface: &str) -> Result<bool, StoreError>;

    /// Active endpoints in HTTP, HTTPS, SOCKS order; inactive modes are omitted
    fn current_active_endpoints(&self, interface: &str) -> Result<Vec<ProxyEndpoint>, StoreError>;

    /// Both queries as one snapshot
    fn activation_state(&self, interface: &str) -> Result<ProxyActivationState, StoreError> {
        Ok(ProxyActivationState {
            any_enabled: self.is_any_proxy_enabled(interface)?,
            endpoints: self.current_active_endpoints(interface)?,
        })
    }
}

/// One `networksetup -get…proxy` block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyBlock {
    pub enabled: bool,
    pub server: Option<String>,
    pub port: Option<String>,
}

impl ProxyBlock {
    /// Endpoint for an enabled block; `None` when disabled or the port is unusable
    pub fn endpoint(&self, protocol: ProxyProtocol) -> Option<ProxyEndpoint> {
        if !self.enabled {
            return None;
        }
        let ip = self.server.clone().unwrap_or_default();
        let port = self.port.as_deref()?.parse::<u16>().ok().filter(|p| *p != 0)?;
        Some(ProxyEndpoint::new(ip, port, protocol))
    }
}

/// Parse `networksetup` output such as:
///
/// ```text
/// Enabled: Yes
/// Server: 127.0.0.1
/// Port: 1080
/// Authenticated Proxy Enabled: 0
/// ```
pub fn parse_proxy_output(output: &str) -> ProxyBlock {
    let mut block = ProxyBlock::default();

    for line in output.lines().map(str::trim) {
        if let Some(value) = line.strip_prefix("Enabled:") {
            block.enabled = value.trim().eq_ignore_ascii_case("yes");
        } else if let Some(value) = line.strip_prefix("Server:") {
            block.server = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("Port:") {
            block.port = Some(value.trim().to_string());
        }
    }

    block
}

/// `networksetup` getter flag for each proxy mode
pub fn getter_flag(protocol: ProxyProtocol) -> &'static str {
    match protocol {
        ProxyProtocol::Http => "-getwebproxy",
        ProxyProtocol::Https => "-getsecurewebproxy",
        ProxyProtocol::Socks => "-getsocksfirewallproxy",
    }
}

/// Build a snapshot from the three blocks in HTTP, HTTPS, SOCKS order
pub fn activation_from_blocks(blocks: &[(ProxyProtocol, ProxyBlock)]) -> ProxyActivationState {
    let any_enabled = blocks.iter().any(|(_, block)| block.enabled);
    let endpoints = blocks
        .iter()
        .filter_map(|(protocol, block)| {
            let endpoint = block.endpoint(*protocol);
            if block.enabled && endpoint.is_none() {
                get_debug_logger().debug_sync(
                    "SystemProxyStore",
                    "unparsable_block",
                    &format!("{} proxy enabled but port {:?} is unusable", protocol.label(), block.port),
                );
            }
            endpoint
        })
        .collect();

    ProxyActivationState { any_enabled, endpoints }
}

/// Store backed by the macOS `networksetup` tool
#[derive(Debug, Clone)]
pub struct NetworkSetupStore {
    binary: PathBuf,
}

impl Default for NetworkSetupStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkSetupStore {
    pub fn new() -> Self {
        Self::with_binary(NETWORKSETUP_PATH)
    }

    /// Store using an alternative `networksetup` executable (for testing)
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }

    fn query(&self, protocol: ProxyProtocol, interface: &str) -> Result<ProxyBlock, StoreError> {
        if interface.trim().is_empty() {
            return Err(StoreError::EmptyInterface);
        }

        let flag = getter_flag(protocol);
        let command = format!("{} {} {}", self.binary.display(), flag, interface);

        let output = Command::new(&self.binary)
            .arg(flag)
            .arg(interface)
            .output()
            .map_err(|source| StoreError::Spawn {
                command: command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StoreError::ExitStatus {
                command,
                code: output.status.code(),
                output: format!("{}{}", stdout, stderr).trim().to_string(),
            });
        }

        Ok(parse_proxy_output(&stdout))
    }

    fn query_all(&self, interface: &str) -> Result<Vec<(ProxyProtocol, ProxyBlock)>, StoreError> {
        ProxyProtocol::ALL
            .iter()
            .map(|protocol| Ok((*protocol, self.query(*protocol, interface)?)))
            .collect()
    }
}

impl SystemProxyStore for NetworkSetupStore {
    fn is_any_proxy_enabled(&self, interface: &str) -> Result<bool, StoreError> {
        Ok(self.activation_state(interface)?.any_enabled)
    }

    fn current_active_endpoints(&self, interface: &str) -> Result<Vec<ProxyEndpoint>, StoreError> {
        Ok(self.activation_state(interface)?.endpoints)
    }

    fn activation_state(&self, interface: &str) -> Result<ProxyActivationState, StoreError> {
        Ok(activation_from_blocks(&self.query_all(interface)?))
    }
}
