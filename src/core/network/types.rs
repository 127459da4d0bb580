// Core types for proxy state monitoring and reachability probes
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Proxy kinds the system proxy store can activate on an interface.
///
/// Order matters: `ALL` is the fixed HTTP, HTTPS, SOCKS order used whenever
/// active endpoints are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    /// Web proxy, serves `http://` targets
    Http,
    /// Secure web proxy, serves `https://` targets
    Https,
    /// SOCKS proxy, serves every target
    Socks,
}

impl ProxyProtocol {
    pub const ALL: [ProxyProtocol; 3] = [ProxyProtocol::Http, ProxyProtocol::Https, ProxyProtocol::Socks];

    /// Settings-store spelling ("http" | "https" | "socks")
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks => "socks",
        }
    }

    /// Upper-case label used in notification titles and CLI output
    pub fn label(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "HTTP",
            ProxyProtocol::Https => "HTTPS",
            ProxyProtocol::Socks => "SOCKS",
        }
    }
}

impl fmt::Display for ProxyProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProxyProtocol {
    type Err = ProbeFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(ProxyProtocol::Http),
            "https" => Ok(ProxyProtocol::Https),
            "socks" => Ok(ProxyProtocol::Socks),
            _ => Err(ProbeFailure::UnsupportedProtocol(s.trim().to_string())),
        }
    }
}

/// A validated proxy endpoint (ip, port, protocol)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProxyEndpoint {
    pub ip: String,
    pub port: u16,
    pub protocol: ProxyProtocol,
}

impl ProxyEndpoint {
    pub fn new(ip: impl Into<String>, port: u16, protocol: ProxyProtocol) -> Self {
        Self {
            ip: ip.into(),
            port,
            protocol,
        }
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.protocol.label(), self.ip, self.port)
    }
}

/// Proxy parameters as the settings store holds them: raw, untrimmed strings.
///
/// Nothing here is validated until [`ProxySettings::validate`] runs, so a
/// half-edited configuration can still be carried around and reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    pub ip: String,
    pub port: String,
    pub protocol: String,
}

impl ProxySettings {
    pub fn new(ip: impl Into<String>, port: impl Into<String>, protocol: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            port: port.into(),
            protocol: protocol.into(),
        }
    }

    /// Validate into a [`ProxyEndpoint`] without touching the network.
    ///
    /// Checks run in order: address, port, protocol. The first failing check wins.
    pub fn validate(&self) -> Result<ProxyEndpoint, ProbeFailure> {
        let ip = self.ip.trim();
        if ip.is_empty() {
            return Err(ProbeFailure::EmptyAddress);
        }

        let port_str = self.port.trim();
        let port = port_str
            .parse::<i64>()
            .ok()
            .filter(|p| (1..=65535).contains(p))
            .ok_or_else(|| ProbeFailure::InvalidPort(port_str.to_string()))?;

        let protocol = ProxyProtocol::from_str(&self.protocol)?;

        Ok(ProxyEndpoint::new(ip, port as u16, protocol))
    }

    /// Human label for titles, tolerant of invalid values: "SOCKS 10.0.0.5:9050"
    pub fn label(&self) -> String {
        let protocol = ProxyProtocol::from_str(&self.protocol)
            .map(|p| p.label().to_string())
            .unwrap_or_else(|_| self.protocol.trim().to_uppercase());
        format!("{} {}:{}", protocol, self.ip.trim(), self.port.trim())
    }
}

impl From<&ProxyEndpoint> for ProxySettings {
    fn from(endpoint: &ProxyEndpoint) -> Self {
        Self {
            ip: endpoint.ip.clone(),
            port: endpoint.port.to_string(),
            protocol: endpoint.protocol.as_str().to_string(),
        }
    }
}

/// Snapshot of the system proxy store for one interface, replaced on every tick
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProxyActivationState {
    pub any_enabled: bool,
    /// Active endpoints in HTTP, HTTPS, SOCKS order
    pub endpoints: Vec<ProxyEndpoint>,
}

/// Failure classes of a proxy probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    InvalidTarget,
    EmptyAddress,
    InvalidPort,
    UnsupportedProtocol,
    Unreachable,
    TimedOut,
    BadResponse,
    Other,
    Cancelled,
}

impl FailureKind {
    /// Input/configuration failures are detected before any network access
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            FailureKind::InvalidTarget
                | FailureKind::EmptyAddress
                | FailureKind::InvalidPort
                | FailureKind::UnsupportedProtocol
        )
    }
}

/// Why a probe did not succeed. The `Display` text is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeFailure {
    #[error("Invalid test URL \"{0}\". Use an http:// or https:// address.")]
    InvalidTarget(String),
    #[error("Proxy address is empty.")]
    EmptyAddress,
    #[error("Invalid proxy port \"{0}\". Use a number between 1 and 65535.")]
    InvalidPort(String),
    #[error("Unknown protocol: {0}")]
    UnsupportedProtocol(String),
    #[error("Cannot reach the test URL through proxy. Check address/port and ensure the proxy server is running.")]
    Unreachable,
    #[error("Proxy test timed out. Check address/port and proxy availability.")]
    TimedOut,
    #[error("Test URL answered with HTTP {0}, expected 2xx.")]
    BadResponse(u16),
    #[error("{0}")]
    Other(String),
    /// Superseded by a newer probe or interrupted by shutdown
    #[error("Proxy test was cancelled.")]
    Cancelled,
}

impl ProbeFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProbeFailure::InvalidTarget(_) => FailureKind::InvalidTarget,
            ProbeFailure::EmptyAddress => FailureKind::EmptyAddress,
            ProbeFailure::InvalidPort(_) => FailureKind::InvalidPort,
            ProbeFailure::UnsupportedProtocol(_) => FailureKind::UnsupportedProtocol,
            ProbeFailure::Unreachable => FailureKind::Unreachable,
            ProbeFailure::TimedOut => FailureKind::TimedOut,
            ProbeFailure::BadResponse(_) => FailureKind::BadResponse,
            ProbeFailure::Other(_) => FailureKind::Other,
            ProbeFailure::Cancelled => FailureKind::Cancelled,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Result of one completed probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthCheckOutcome {
    /// Trimmed UTF-8 body of the 2xx response (usually the external IP)
    Success { observed_body: String },
    Failure(ProbeFailure),
}

impl HealthCheckOutcome {
    pub fn success(observed_body: impl Into<String>) -> Self {
        HealthCheckOutcome::Success {
            observed_body: observed_body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, HealthCheckOutcome::Success { .. })
    }

    pub fn failure(&self) -> Option<&ProbeFailure> {
        match self {
            HealthCheckOutcome::Success { .. } => None,
            HealthCheckOutcome::Failure(failure) => Some(failure),
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure().map(ProbeFailure::kind)
    }
}

impl From<ProbeFailure> for HealthCheckOutcome {
    fn from(failure: ProbeFailure) -> Self {
        HealthCheckOutcome::Failure(failure)
    }
}

/// Generate standardized local timezone ISO-8601 timestamp
///
/// ```text
/// "2025-01-25T10:30:45-08:00"
/// ```
pub fn get_local_timestamp() -> String {
    chrono::Local::now().to_rfc3339()
}

/// Boolean environment flag: true/false, 1/0, yes/no, on/off (case insensitive)
///
/// Unset or unrecognized values read as false.
pub fn parse_env_bool(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on"))
        .unwrap_or(false)
}
