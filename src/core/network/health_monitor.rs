/*!
Proxy state monitor with edge-triggered reachability probes.

HealthMonitor polls the system proxy store on a fixed cadence, detects
off→on transitions of "any proxy enabled", and after a short settle delay
probes the *configured* proxy. Failed probes produce exactly one
notification per transition.

## State machine

- **Idle**: no probe scheduled or running
- **Probing**: one probe waiting out its settle delay or in flight

| tick observation                | action                                   |
|---------------------------------|------------------------------------------|
| first observation               | remember it, never probe                 |
| off → on                        | cancel active probe, schedule a new one  |
| on → off                        | remember it                              |
| unchanged                       | nothing                                  |
| store query failed              | keep last known state, log               |

## Cancellation

Probes are cooperative: each checks its token while waiting out the settle
delay, while the request runs, and again before acting on the result. A
cancelled probe never notifies. Shutdown stops the loop and cancels any
probe; nothing is delivered afterwards.

## Concurrency

`MonitorSession` is the only shared mutable state. It lives behind a
mutex that is never held across an await, so the poll loop, probe tasks and
interactive `test_now` callers can run side by side.
*/

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::SettingsSource;
use crate::core::network::debug_logger::get_debug_logger;
use crate::core::network::notifier::{failure_body, failure_title, NotificationSink};
use crate::core::network::proxy_probe::ProxyProbe;
use crate::core::network::system_proxy::{StoreError, SystemProxyStore};
use crate::core::network::types::{HealthCheckOutcome, ProbeFailure, ProxyActivationState, ProxySettings};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(4);
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(400);

/// What one tick observed relative to the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// First observation since start; never triggers a probe
    Initial(bool),
    /// off → on; a probe was scheduled
    Enabled,
    /// on → off
    Disabled,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Probing,
}

/// How an interactive test reached the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestMode {
    Proxy,
    Direct,
}

#[derive(Debug, thiserror::Error)]
pub enum TickError {
    #[error("System proxy query failed: {0}")]
    Store(#[from] StoreError),
    #[error("System proxy query task failed: {0}")]
    Task(String),
    #[error("Monitor is shut down")]
    ShutDown,
}

#[derive(Debug, Clone)]
pub struct MonitorOptions {
    /// Wait between an observed off→on edge and the probe
    pub settle_delay: Duration,
    /// Deliver failed background probes to the notification sink
    pub notify_failures: bool,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            notify_failures: true,
        }
    }
}

#[derive(Debug)]
struct ActiveProbe {
    id: u64,
    token: CancellationToken,
}

/// Monitor-owned state: last observation and the probe in flight
#[derive(Debug, Default)]
pub struct MonitorSession {
    last_any_enabled: Option<bool>,
    active_probe: Option<ActiveProbe>,
    next_probe_id: u64,
    shut_down: bool,
}

impl MonitorSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation and classify it against the previous one
    pub fn observe(&mut self, any_enabled: bool) -> Transition {
        let previous = self.last_any_enabled.replace(any_enabled);
        match previous {
            None => Transition::Initial(any_enabled),
            Some(prev) if prev == any_enabled => Transition::Unchanged,
            Some(_) if any_enabled => Transition::Enabled,
            Some(_) => Transition::Disabled,
        }
    }

    pub fn last_any_enabled(&self) -> Option<bool> {
        self.last_any_enabled
    }

    pub fn state(&self) -> MonitorState {
        if self.active_probe.is_some() {
            MonitorState::Probing
        } else {
            MonitorState::Idle
        }
    }

    /// Cancel whatever is in flight and register a new probe; `None` once shut down
    fn begin_probe(&mut self) -> Option<(u64, CancellationToken)> {
        if self.shut_down {
            return None;
        }
        if let Some(previous) = self.active_probe.take() {
            previous.token.cancel();
            get_debug_logger().probe_cancelled(previous.id, "superseded");
        }
        self.next_probe_id += 1;
        let token = CancellationToken::new();
        self.active_probe = Some(ActiveProbe {
            id: self.next_probe_id,
            token: token.clone(),
        });
        Some((self.next_probe_id, token))
    }

    /// Clear the active probe if it is still `id`; false when superseded
    fn finish_probe(&mut self, id: u64) -> bool {
        match &self.active_probe {
            Some(active) if active.id == id => {
                self.active_probe = None;
                true
            }
            _ => false,
        }
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
        if let Some(active) = self.active_probe.take() {
            active.token.cancel();
            get_debug_logger().probe_cancelled(active.id, "shutdown");
        }
    }
}

/// Clears an interactive probe from the session even if the caller drops the future
struct ProbeGuard<'a> {
    session: &'a Mutex<MonitorSession>,
    id: u64,
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        lock_session(self.session).finish_probe(self.id);
    }
}

fn lock_session(session: &Mutex<MonitorSession>) -> MutexGuard<'_, MonitorSession> {
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Proxy state monitor
///
/// Cheap to clone; clones share one session.
#[derive(Clone)]
pub struct HealthMonitor {
    store: Arc<dyn SystemProxyStore>,
    probe: ProxyProbe,
    notifier: Arc<dyn NotificationSink>,
    settings: Arc<dyn SettingsSource>,
    options: MonitorOptions,
    session: Arc<Mutex<MonitorSession>>,
}

impl HealthMonitor {
    pub fn new(
        store: Arc<dyn SystemProxyStore>,
        probe: ProxyProbe,
        notifier: Arc<dyn NotificationSink>,
        settings: Arc<dyn SettingsSource>,
    ) -> Self {
        Self {
            store,
            probe,
            notifier,
            settings,
            options: MonitorOptions::default(),
            session: Arc::new(Mutex::new(MonitorSession::new())),
        }
    }

    pub fn with_options(mut self, options: MonitorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn state(&self) -> MonitorState {
        self.session().state()
    }

    pub fn last_any_enabled(&self) -> Option<bool> {
        self.session().last_any_enabled()
    }

    pub fn is_shut_down(&self) -> bool {
        self.session().shut_down
    }

    fn session(&self) -> MutexGuard<'_, MonitorSession> {
        lock_session(&self.session)
    }

    /// Query the store off the async executor
    pub async fn query_state(&self, interface: &str) -> Result<ProxyActivationState, TickError> {
        let store = Arc::clone(&self.store);
        let interface = interface.to_string();

        tokio::task::spawn_blocking(move || store.activation_state(&interface))
            .await
            .map_err(|e| TickError::Task(e.to_string()))?
            .map_err(TickError::from)
    }

    /// One poll of the state machine
    ///
    /// Store failures leave the session untouched and are returned for logging.
    pub async fn tick(&self, interface: &str) -> Result<Transition, TickError> {
        let debug_logger = get_debug_logger();

        if self.is_shut_down() {
            return Err(TickError::ShutDown);
        }

        let state = match self.query_state(interface).await {
            Ok(state) => state,
            Err(e) => {
                debug_logger.store_query_failed(interface, &e.to_string());
                return Err(e);
            }
        };

        let labels: Vec<String> = state.endpoints.iter().map(ToString::to_string).collect();
        debug_logger.monitor_tick(interface, state.any_enabled, &labels);

        let (previous, transition) = {
            let mut session = self.session();
            if session.shut_down {
                return Err(TickError::ShutDown);
            }
            let previous = session.last_any_enabled;
            let transition = session.observe(state.any_enabled);
            (previous, transition)
        };

        match transition {
            Transition::Enabled => {
                debug_logger.transition(interface, previous, true);
                self.schedule_probe();
            }
            Transition::Disabled => debug_logger.transition(interface, previous, false),
            Transition::Initial(_) | Transition::Unchanged => {}
        }

        Ok(transition)
    }

    /// Replace any active probe with a new debounced background probe
    fn schedule_probe(&self) {
        // shutdown may have landed since the tick released the session
        let Some((id, token)) = self.session().begin_probe() else {
            return;
        };
        let monitor = self.clone();
        tokio::spawn(async move { monitor.run_background_probe(id, token).await });
    }

    async fn run_background_probe(&self, id: u64, token: CancellationToken) {
        let debug_logger = get_debug_logger();

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug_logger.probe_cancelled(id, "settle_delay");
                return;
            }
            _ = tokio::time::sleep(self.options.settle_delay) => {}
        }

        let settings = self.settings.probe_settings();

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug_logger.probe_cancelled(id, "request");
                return;
            }
            outcome = self.probe.test(Some(&settings.proxy), &settings.test_url) => outcome,
        };

        // Result is acted on under the lock so shutdown cannot interleave
        let mut session = self.session();
        if token.is_cancelled() || session.shut_down || !session.finish_probe(id) {
            debug_logger.probe_cancelled(id, "result");
            return;
        }

        if let Some(failure) = outcome.failure() {
            if self.options.notify_failures {
                self.notifier.notify(&failure_title(&settings.proxy), &failure_body(failure));
            }
        }
    }

    /// Interactive probe, not gated by tick logic
    ///
    /// Cancels any probe in flight, runs unconditionally and returns the
    /// outcome to the caller; `last_any_enabled` is left alone. Returns
    /// `Failure(Cancelled)` when superseded by a newer probe or shutdown.
    pub async fn test_now(&self, proxy: Option<&ProxySettings>, test_url: &str) -> HealthCheckOutcome {
        let Some((id, token)) = self.session().begin_probe() else {
            return ProbeFailure::Cancelled.into();
        };
        let _guard = ProbeGuard {
            session: &self.session,
            id,
        };

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => return ProbeFailure::Cancelled.into(),
            outcome = self.probe.test(proxy, test_url) => outcome,
        };

        let cancelled = token.is_cancelled() || self.session().shut_down;
        if cancelled {
            return ProbeFailure::Cancelled.into();
        }
        outcome
    }

    /// Interactive test of the configured proxy
    ///
    /// Probes through the configured proxy when any system proxy is on for
    /// `interface`, otherwise direct. `force_direct` skips the store query.
    /// A failed store query falls back to proxy mode.
    pub async fn test_configured(&self, interface: &str, force_direct: bool) -> (TestMode, HealthCheckOutcome) {
        let settings = self.settings.probe_settings();

        let mode = if force_direct {
            TestMode::Direct
        } else {
            match self.query_state(interface).await {
                Ok(state) if !state.any_enabled => TestMode::Direct,
                Ok(_) => TestMode::Proxy,
                Err(e) => {
                    get_debug_logger().store_query_failed(interface, &e.to_string());
                    TestMode::Proxy
                }
            }
        };

        let proxy = match mode {
            TestMode::Proxy => Some(&settings.proxy),
            TestMode::Direct => None,
        };
        (mode, self.test_now(proxy, &settings.test_url).await)
    }

    /// One-shot check at process start
    ///
    /// If a system proxy is on, tests the configured proxy, notifies on
    /// failure and returns the outcome. `None` when no proxy is on or the
    /// store cannot be read.
    pub async fn startup_check(&self, interface: &str) -> Option<HealthCheckOutcome> {
        let state = match self.query_state(interface).await {
            Ok(state) => state,
            Err(e) => {
                get_debug_logger().store_query_failed(interface, &e.to_string());
                return None;
            }
        };
        if !state.any_enabled {
            return None;
        }

        let settings = self.settings.probe_settings();
        let outcome = self.test_now(Some(&settings.proxy), &settings.test_url).await;

        if let Some(failure) = outcome.failure() {
            if failure != &ProbeFailure::Cancelled && self.options.notify_failures {
                self.notifier.notify(&failure_title(&settings.proxy), &failure_body(failure));
            }
        }
        Some(outcome)
    }

    /// Start the poll loop; runs until the returned handle is shut down
    pub fn spawn(&self, interface: impl Into<String>, tick_interval: Duration) -> MonitorHandle {
        let stop = CancellationToken::new();
        let monitor = self.clone();
        let interface = interface.into();
        let loop_stop = stop.clone();

        let task = tokio::spawn(async move { monitor.run_loop(interface, tick_interval, loop_stop).await });

        MonitorHandle {
            monitor: self.clone(),
            stop,
            task,
        }
    }

    async fn run_loop(&self, interface: String, tick_interval: Duration, stop: CancellationToken) {
        let mut ticker = tokio::time::interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                result = self.tick(&interface) => result,
            };

            // other failures are logged by tick and never end the loop
            if let Err(TickError::ShutDown) = result {
                break;
            }
        }

        get_debug_logger().debug_sync("HealthMonitor", "loop_stopped", &format!("Monitor for {} stopped", interface));
    }

    /// Stop accepting work and cancel any probe in flight
    pub fn shutdown(&self) {
        self.session().shutdown();
    }
}

/// Handle to a running poll loop
pub struct MonitorHandle {
    monitor: HealthMonitor,
    stop: CancellationToken,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn monitor(&self) -> &HealthMonitor {
        &self.monitor
    }

    /// Stop the timer, cancel any probe and wait for the loop to exit
    pub async fn shutdown(self) {
        self.monitor.shutdown();
        self.stop.cancel();
        if let Err(e) = self.task.await {
            get_debug_logger().error_sync("HealthMonitor", "loop_join_failed", &e.to_string());
        }
    }
}
