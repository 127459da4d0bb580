//! Proxy Reachability Check
//!
//! Single-attempt probe through a configured proxy (or direct) with:
//! - Pre-flight validation of target URL, address, port and protocol
//! - Protocol-specific proxy channel selection
//! - 2xx-only acceptance and trimmed UTF-8 body extraction
//! - Transport failure classification into user-facing messages

use std::sync::Arc;

use crate::core::network::debug_logger::get_debug_logger;
use crate::core::network::proxy_probe::{
    client::{IsahcProbeTransport, ProbeRequest, ProbeTransport, TransportError},
    config::ProbeTimeouts,
    url::{proxy_uri_for, validate_target_url},
};
use crate::core::network::types::{HealthCheckOutcome, ProbeFailure, ProxyEndpoint, ProxySettings};

/// Reachability probe for a proxy endpoint
///
/// Never fails past its own boundary: every path resolves to a
/// [`HealthCheckOutcome`]. Input problems are reported without any network
/// access; runtime problems after exactly one request.
#[derive(Clone)]
pub struct ProxyProbe {
    transport: Arc<dyn ProbeTransport>,
    timeouts: ProbeTimeouts,
}

impl Default for ProxyProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxyProbe {
    /// Probe backed by isahc with the default 6s/8s timeouts
    pub fn new() -> Self {
        Self::with_transport(Arc::new(IsahcProbeTransport::new()))
    }

    /// Probe with a custom transport (for testing)
    pub fn with_transport(transport: Arc<dyn ProbeTransport>) -> Self {
        Self {
            transport,
            timeouts: ProbeTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: ProbeTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn timeouts(&self) -> ProbeTimeouts {
        self.timeouts
    }

    /// Test reachability of `target_url` through `proxy`, or direct when `proxy` is `None`
    ///
    /// # Arguments
    /// * `proxy` - Raw proxy settings (address, port and protocol as strings)
    /// * `target_url` - http(s) URL fetched with a single GET
    ///
    /// # Behavior
    /// 1. Validate target URL, then address, port and protocol (no network)
    /// 2. Select the proxy channel for the target's scheme
    /// 3. Issue one GET on an isolated client
    /// 4. Accept 2xx only; return the trimmed body
    pub async fn test(&self, proxy: Option<&ProxySettings>, target_url: &str) -> HealthCheckOutcome {
        let target = match validate_target_url(target_url) {
            Ok(url) => url,
            Err(_) => return ProbeFailure::InvalidTarget(target_url.trim().to_string()).into(),
        };

        let endpoint = match proxy.map(ProxySettings::validate).transpose() {
            Ok(endpoint) => endpoint,
            Err(failure) => return failure.into(),
        };

        self.run(endpoint.as_ref(), target).await
    }

    /// Test with an already validated endpoint
    pub async fn test_endpoint(&self, endpoint: Option<&ProxyEndpoint>, target_url: &str) -> HealthCheckOutcome {
        let settings = endpoint.map(ProxySettings::from);
        self.test(settings.as_ref(), target_url).await
    }

    async fn run(&self, endpoint: Option<&ProxyEndpoint>, target: url::Url) -> HealthCheckOutcome {
        let debug_logger = get_debug_logger();
        let probe_id = format!("probe_{}", uuid::Uuid::new_v4());

        let proxy = proxy_uri_for(endpoint, &target);
        if let (Some(endpoint), None) = (endpoint, &proxy) {
            debug_logger.debug_sync(
                "ProxyProbe",
                "channel_not_covering",
                &format!(
                    "{} proxy does not carry {} targets, probing {} direct",
                    endpoint.protocol.label(),
                    target.scheme(),
                    target
                ),
            );
        }

        let mode = if proxy.is_some() { "proxy" } else { "direct" };
        debug_logger.probe_start(mode, target.as_str(), self.timeouts.resource.as_millis() as u64, probe_id.clone());

        let request = ProbeRequest {
            url: target.to_string(),
            proxy,
            timeouts: self.timeouts,
        };

        match self.transport.get(request).await {
            Ok(response) if (200..=299).contains(&response.status_code) => {
                let text = String::from_utf8_lossy(&response.body).trim().to_string();
                debug_logger.probe_end(mode, Some(response.status_code), response.duration.as_millis() as u64, probe_id);
                HealthCheckOutcome::success(text)
            }
            Ok(response) => {
                debug_logger.probe_end(mode, Some(response.status_code), response.duration.as_millis() as u64, probe_id);
                ProbeFailure::BadResponse(response.status_code).into()
            }
            Err(error) => {
                debug_logger.error_sync("ProxyProbe", "transport_error", &format!("{} probe failed: {}", mode, error));
                debug_logger.probe_end(mode, None, 0, probe_id);
                classify_transport_error(error).into()
            }
        }
    }
}

/// Map a transport error to the failure reported to the user
pub fn classify_transport_error(error: TransportError) -> ProbeFailure {
    match error {
        TransportError::Unreachable(_) => ProbeFailure::Unreachable,
        TransportError::TimedOut => ProbeFailure::TimedOut,
        TransportError::Other(description) => ProbeFailure::Other(description),
    }
}
