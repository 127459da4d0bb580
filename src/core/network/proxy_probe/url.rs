//! URL Utilities for Proxy Probes
//!
//! - Target URL validation (http/https only, host required)
//! - Proxy channel selection per protocol and target scheme
//! - Proxy URI construction for the HTTP client

use crate::core::network::types::{ProxyEndpoint, ProxyProtocol};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum UrlError {
    #[error("Invalid URL format: {0}")]
    ParseError(#[from] url::ParseError),
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("Missing host in URL")]
    MissingHost,
}

/// Parse and validate a probe target URL
///
/// Surrounding whitespace is ignored. Only `http` and `https` are accepted,
/// and the URL must name a host.
///
/// # Examples
/// - `" https://ifconfig.co/ip "` → `https://ifconfig.co/ip`
/// - `"ftp://example.com"` → `UnsupportedScheme("ftp")`
/// - `"ifconfig.co"` → `ParseError(RelativeUrlWithoutBase)`
pub fn validate_target_url(raw: &str) -> Result<Url, UrlError> {
    let url = Url::parse(raw.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::UnsupportedScheme(other.to_string())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Whether a proxy of `protocol` carries requests for targets with `scheme`
///
/// Each channel is enabled on its own: a web proxy serves plain `http`,
/// a secure web proxy serves `https`, SOCKS serves both.
pub fn channel_covers(protocol: ProxyProtocol, scheme: &str) -> bool {
    match protocol {
        ProxyProtocol::Http => scheme == "http",
        ProxyProtocol::Https => scheme == "https",
        ProxyProtocol::Socks => true,
    }
}

/// Build the proxy URI the HTTP client understands
///
/// # Examples
/// - `HTTP 127.0.0.1:8080` → `http://127.0.0.1:8080`
/// - `HTTPS proxy.lan:3128` → `http://proxy.lan:3128` (CONNECT tunnel over plain HTTP)
/// - `SOCKS 10.0.0.5:9050` → `socks5h://10.0.0.5:9050` (names resolved by the proxy)
/// - `SOCKS ::1:1080` → `socks5h://[::1]:1080`
pub fn build_proxy_uri(endpoint: &ProxyEndpoint) -> String {
    let scheme = match endpoint.protocol {
        ProxyProtocol::Http | ProxyProtocol::Https => "http",
        ProxyProtocol::Socks => "socks5h",
    };
    format!("{}://{}:{}", scheme, bracket_ipv6(&endpoint.ip), endpoint.port)
}

/// Proxy URI to use for `target`, or `None` when the request goes direct
pub fn proxy_uri_for(endpoint: Option<&ProxyEndpoint>, target: &Url) -> Option<String> {
    endpoint
        .filter(|e| channel_covers(e.protocol, target.scheme()))
        .map(build_proxy_uri)
}

fn bracket_ipv6(host: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    }
}
