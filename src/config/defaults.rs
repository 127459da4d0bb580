use super::types::{Config, MonitorConfig, ProbeConfig, ProxyConfig};

pub const DEFAULT_IP: &str = "127.0.0.1";
pub const DEFAULT_PORT: &str = "1080";
pub const DEFAULT_PROTOCOL: &str = "socks";
pub const DEFAULT_INTERFACE: &str = "Wi-Fi";
pub const DEFAULT_TEST_URL: &str = "https://ifconfig.co/ip";

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy: ProxyConfig::default(),
            monitor: MonitorConfig::default(),
            probe: ProbeConfig::default(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            ip: DEFAULT_IP.to_string(),
            port: DEFAULT_PORT.to_string(),
            protocol: DEFAULT_PROTOCOL.to_string(),
            interface: DEFAULT_INTERFACE.to_string(),
            test_url: DEFAULT_TEST_URL.to_string(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 4_000,
            settle_delay_ms: 400,
            startup_check: true,
            notifications: true,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 6,
            resource_timeout_secs: 8,
        }
    }
}
