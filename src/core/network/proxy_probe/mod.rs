//! Proxy Reachability Probe Module
//!
//! One-shot reachability checks of a forward proxy:
//! - Pre-flight validation with no network access
//! - Per-protocol proxy channel selection (HTTP, HTTPS, SOCKS)
//! - Isolated client per probe with request and resource timeouts
//! - Failure classification into user-facing messages

pub mod checker;
pub mod client;
pub mod config;
pub mod url;

// Re-export public API
pub use checker::{classify_transport_error, ProxyProbe};
pub use client::{IsahcProbeTransport, ProbeRequest, ProbeResponse, ProbeTransport, TransportError};
pub use config::ProbeTimeouts;
pub use url::{build_proxy_uri, channel_covers, proxy_uri_for, validate_target_url, UrlError};
