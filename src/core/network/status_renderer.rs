// One-line terminal rendering for proxy state and probe results
use crate::core::network::health_monitor::TestMode;
use crate::core::network::types::{FailureKind, HealthCheckOutcome, ProxyActivationState};

/// Renders monitor output for the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusRenderer;

impl StatusRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Emoji: 🟢 proxy on, ⚪ proxy off
    /// Text: interface, on/off, then each active endpoint
    pub fn render_activation(&self, interface: &str, state: &ProxyActivationState) -> String {
        if !state.any_enabled {
            return format!("⚪ {} | proxy off", interface);
        }

        let mut line = format!("🟢 {} | proxy on", interface);
        if state.endpoints.is_empty() {
            // enabled but nothing parsable
            line.push_str(" | no usable endpoint");
        }
        for endpoint in &state.endpoints {
            line.push_str(" | ");
            line.push_str(&endpoint.to_string());
        }
        line
    }

    /// Emoji: 🟢/🔴/⚪ map to `success/failure/cancelled`
    pub fn render_outcome(&self, mode: TestMode, outcome: &HealthCheckOutcome) -> String {
        let route = self.route_label(mode);
        match outcome {
            HealthCheckOutcome::Success { observed_body } if observed_body.is_empty() => {
                format!("🟢 {} | OK", route)
            }
            HealthCheckOutcome::Success { observed_body } => {
                format!("🟢 {} | External IP: {}", route, observed_body)
            }
            HealthCheckOutcome::Failure(failure) if failure.kind() == FailureKind::Cancelled => {
                format!("⚪ {} | {}", route, failure.message())
            }
            HealthCheckOutcome::Failure(failure) => format!("🔴 {} | {}", route, failure.message()),
        }
    }

    pub fn route_label(&self, mode: TestMode) -> &'static str {
        match mode {
            TestMode::Proxy => "Via proxy",
            TestMode::Direct => "Direct",
        }
    }
}
