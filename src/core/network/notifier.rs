//! User notifications for failed proxy checks.
//!
//! Delivery is fire-and-forget: sinks must return quickly and never report
//! errors back to the monitor.

use crate::core::network::debug_logger::get_debug_logger;
use crate::core::network::types::{ProbeFailure, ProxySettings};

/// Destination for user-visible notifications
pub trait NotificationSink: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Title naming the protocol, address and port of the failing proxy
pub fn failure_title(proxy: &ProxySettings) -> String {
    format!("Proxy check failed: {}", proxy.label())
}

pub fn failure_body(failure: &ProbeFailure) -> String {
    failure.message()
}

/// Desktop notifications through the platform notification service.
///
/// Each notification is shown from its own thread so a slow notification
/// daemon never stalls the caller.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    app_name: String,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new("proxywatch")
    }
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl NotificationSink for DesktopNotifier {
    #[cfg(feature = "desktop-notifications")]
    fn notify(&self, title: &str, body: &str) {
        use notify_rust::Notification;

        let (app_name, title, body) = (self.app_name.clone(), title.to_string(), body.to_string());
        std::thread::spawn(move || {
            let result = Notification::new()
                .summary(&title)
                .body(&body)
                .appname(&app_name)
                .timeout(notify_rust::Timeout::Milliseconds(5000))
                .show();

            let logger = get_debug_logger();
            match result {
                Ok(_) => logger.notification_sent(&title, true),
                Err(e) => {
                    logger.error_sync("Notifier", "notification_failed", &format!("{}: {}", title, e));
                    logger.notification_sent(&title, false);
                }
            }
        });
    }

    #[cfg(not(feature = "desktop-notifications"))]
    fn notify(&self, title: &str, body: &str) {
        LogNotifier.notify(title, body);
    }
}

/// Writes notifications to stderr and the debug log; for headless runs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        eprintln!("{}: {}", title, body);
        get_debug_logger().notification_sent(title, true);
    }
}
