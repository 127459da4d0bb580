//! Probe Transport Implementations
//!
//! HTTP client abstraction specialized for proxy reachability probes:
//! one GET, optional proxy, response body access, transport errors already
//! sorted into the classes the checker reports.

use crate::core::network::proxy_probe::config::ProbeTimeouts;
use std::time::{Duration, Instant};

use isahc::config::{Configurable, RedirectPolicy};
use isahc::error::ErrorKind;
use isahc::{AsyncReadResponseExt, HttpClient, Request};

const USER_AGENT: &str = concat!("proxywatch/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTS: u32 = 10;

/// One outbound probe request
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRequest {
    /// Validated http(s) target URL
    pub url: String,
    /// Proxy URI (`http://…`, `socks5h://…`); `None` sends the request direct
    pub proxy: Option<String>,
    pub timeouts: ProbeTimeouts,
}

/// Probe response with the full body for the checker
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    /// HTTP status code of the final response
    pub status_code: u16,
    /// Raw response body
    pub body: Vec<u8>,
    /// Request duration for logging
    pub duration: Duration,
}

/// Transport-level failure, classified by the transport that saw it
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No route, host not found, connection refused or lost
    #[error("unreachable: {0}")]
    Unreachable(String),
    #[error("timed out")]
    TimedOut,
    /// Anything else, carrying the client's own description
    #[error("{0}")]
    Other(String),
}

/// HTTP transport used by [`super::checker::ProxyProbe`]
///
/// # Implementation Requirements
/// * Exactly one GET per call, no retries
/// * No state shared between calls (cookies, caches, pooled connections)
/// * `request.proxy == None` must bypass any environment proxy
#[async_trait::async_trait]
pub trait ProbeTransport: Send + Sync {
    async fn get(&self, request: ProbeRequest) -> Result<ProbeResponse, TransportError>;
}

/// Production transport using isahc; builds a fresh client for every probe
#[derive(Debug, Default, Clone, Copy)]
pub struct IsahcProbeTransport;

impl IsahcProbeTransport {
    pub fn new() -> Self {
        Self
    }

    fn build_client(request: &ProbeRequest) -> Result<HttpClient, TransportError> {
        let proxy = match &request.proxy {
            Some(uri) => Some(
                uri.parse::<isahc::http::Uri>()
                    .map_err(|e| TransportError::Other(format!("Invalid proxy URI {}: {}", uri, e)))?,
            ),
            None => None,
        };

        HttpClient::builder()
            .connect_timeout(request.timeouts.request)
            .low_speed_timeout(1, request.timeouts.request)
            .timeout(request.timeouts.resource)
            .redirect_policy(RedirectPolicy::Limit(MAX_REDIRECTS))
            .proxy(proxy)
            .build()
            .map_err(|e| TransportError::Other(format!("Failed to create probe client: {}", e)))
    }
}

#[async_trait::async_trait]
impl ProbeTransport for IsahcProbeTransport {
    async fn get(&self, request: ProbeRequest) -> Result<ProbeResponse, TransportError> {
        let client = Self::build_client(&request)?;
        let start = Instant::now();

        let http_request = Request::get(&request.url)
            .header("User-Agent", USER_AGENT)
            .header("Cache-Control", "no-cache")
            .body(())
            .map_err(|e| TransportError::Other(format!("Probe request creation failed: {}", e)))?;

        let mut response = client
            .send_async(http_request)
            .await
            .map_err(|e| classify_isahc_error(&e))?;

        let status_code = response.status().as_u16();

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_io_error(&e))?
            .to_vec();

        Ok(ProbeResponse {
            status_code,
            body,
            duration: start.elapsed(),
        })
    }
}

fn classify_isahc_error(error: &isahc::Error) -> TransportError {
    match error.kind() {
        ErrorKind::ConnectionFailed | ErrorKind::NameResolution | ErrorKind::Io => {
            TransportError::Unreachable(error.to_string())
        }
        ErrorKind::Timeout => TransportError::TimedOut,
        _ => TransportError::Other(error.to_string()),
    }
}

// Body read failures: the connection was lost mid-transfer unless it stalled
fn classify_io_error(error: &std::io::Error) -> TransportError {
    match error.kind() {
        std::io::ErrorKind::TimedOut => TransportError::TimedOut,
        _ => TransportError::Unreachable(error.to_string()),
    }
}
