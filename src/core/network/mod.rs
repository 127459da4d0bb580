pub mod debug_logger;
pub mod health_monitor;
pub mod notifier;
pub mod proxy_probe;
pub mod status_renderer;
pub mod system_proxy;
pub mod types;

// Re-export commonly used items
pub use debug_logger::{get_debug_logger, EnhancedDebugLogger};
pub use health_monitor::{HealthMonitor, MonitorHandle, MonitorOptions, MonitorState, TestMode, TickError, Transition};
pub use notifier::{DesktopNotifier, LogNotifier, NotificationSink};
pub use proxy_probe::{ProbeTimeouts, ProbeTransport, ProxyProbe};
pub use status_renderer::StatusRenderer;
pub use system_proxy::{NetworkSetupStore, StoreError, SystemProxyStore};
pub use types::*;
