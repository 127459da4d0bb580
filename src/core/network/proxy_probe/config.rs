//! Proxy Probe Configuration

use std::time::Duration;

/// Timeouts applied to the isolated client of a single probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTimeouts {
    /// Connect and idle-transfer timeout: the request fails when the
    /// connection cannot be made, or stalls, for this long
    /// Default: 6s
    pub request: Duration,

    /// Hard ceiling for the whole exchange, body included
    /// Default: 8s
    pub resource: Duration,
}

impl Default for ProbeTimeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(6),
            resource: Duration::from_secs(8),
        }
    }
}

impl ProbeTimeouts {
    /// Timeouts from configured seconds; zero falls back to the default,
    /// since a zero timeout means "no limit" to the HTTP client
    pub fn from_secs(request_secs: u64, resource_secs: u64) -> Self {
        let defaults = Self::default();
        let request = non_zero_or(request_secs, defaults.request);
        // resource ceiling never below the request timeout
        let resource = non_zero_or(resource_secs, defaults.resource).max(request);
        Self { request, resource }
    }
}

fn non_zero_or(secs: u64, fallback: Duration) -> Duration {
    if secs == 0 {
        fallback
    } else {
        Duration::from_secs(secs)
    }
}
