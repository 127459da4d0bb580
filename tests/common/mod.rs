//! Common test doubles for the monitor seams: transport, proxy store,
//! notification sink and settings source.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use proxywatch::config::{ProbeSettings, SettingsSource};
use proxywatch::core::network::health_monitor::{HealthMonitor, MonitorOptions};
use proxywatch::core::network::notifier::NotificationSink;
use proxywatch::core::network::proxy_probe::{ProbeRequest, ProbeResponse, ProbeTransport, ProxyProbe, TransportError};
use proxywatch::core::network::system_proxy::{StoreError, SystemProxyStore};
use proxywatch::core::network::types::{ProxyActivationState, ProxyEndpoint, ProxyProtocol, ProxySettings};
use tempfile::TempDir;

pub const TEST_URL: &str = "https://ifconfig.co/ip";
pub const EXTERNAL_IP: &str = "203.0.113.7";

/// Test helper to create a temporary directory for test files
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

pub fn ok_response(status: u16, body: &str) -> Result<ProbeResponse, TransportError> {
    Ok(ProbeResponse {
        status_code: status,
        body: body.as_bytes().to_vec(),
        duration: Duration::from_millis(50),
    })
}

/// Scripted transport; answers 200 with [`EXTERNAL_IP`] once the script runs out
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Result<ProbeResponse, TransportError>>>,
    requests: Mutex<Vec<ProbeRequest>>,
    delay: Duration,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call waits `delay` before answering
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn push(&self, result: Result<ProbeResponse, TransportError>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn failing(error: TransportError) -> Self {
        let transport = Self::new();
        for _ in 0..8 {
            transport.push(Err(error.clone()));
        }
        transport
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProbeRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ProbeTransport for MockTransport {
    async fn get(&self, request: ProbeRequest) -> Result<ProbeResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        let result = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ok_response(200, EXTERNAL_IP));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        result
    }
}

/// One scripted store answer
#[derive(Debug, Clone)]
pub enum StoreStep {
    State(ProxyActivationState),
    Fail,
}

pub fn socks_state(enabled: bool) -> ProxyActivationState {
    ProxyActivationState {
        any_enabled: enabled,
        endpoints: if enabled {
            vec![ProxyEndpoint::new("127.0.0.1", 1080, ProxyProtocol::Socks)]
        } else {
            Vec::new()
        },
    }
}

/// Scripted proxy store; repeats the last state once the script runs out
pub struct FakeStore {
    script: Mutex<VecDeque<StoreStep>>,
    last: Mutex<ProxyActivationState>,
    queries: AtomicUsize,
}

impl FakeStore {
    pub fn new(steps: Vec<StoreStep>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
            last: Mutex::new(socks_state(false)),
            queries: AtomicUsize::new(0),
        }
    }

    pub fn sequence(enabled: &[bool]) -> Self {
        Self::new(enabled.iter().map(|e| StoreStep::State(socks_state(*e))).collect())
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl SystemProxyStore for FakeStore {
    fn is_any_proxy_enabled(&self, interface: &str) -> Result<bool, StoreError> {
        Ok(self.activation_state(interface)?.any_enabled)
    }

    fn current_active_endpoints(&self, interface: &str) -> Result<Vec<ProxyEndpoint>, StoreError> {
        Ok(self.activation_state(interface)?.endpoints)
    }

    fn activation_state(&self, _interface: &str) -> Result<ProxyActivationState, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(StoreStep::State(state)) => {
                *self.last.lock().unwrap() = state.clone();
                Ok(state)
            }
            Some(StoreStep::Fail) => Err(StoreError::ExitStatus {
                command: "networksetup -getwebproxy Wi-Fi".to_string(),
                code: Some(4),
                output: "Wi-Fi is not a recognized network service.".to_string(),
            }),
            None => Ok(self.last.lock().unwrap().clone()),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) {
        self.sent.lock().unwrap().push((title.to_string(), body.to_string()));
    }
}

/// In-memory settings that tests can change between probes
pub struct TestSettings {
    current: Mutex<ProbeSettings>,
}

impl TestSettings {
    pub fn new(proxy: ProxySettings) -> Self {
        Self {
            current: Mutex::new(ProbeSettings {
                proxy,
                test_url: TEST_URL.to_string(),
            }),
        }
    }

    pub fn set_proxy(&self, proxy: ProxySettings) {
        self.current.lock().unwrap().proxy = proxy;
    }
}

impl SettingsSource for TestSettings {
    fn probe_settings(&self) -> ProbeSettings {
        self.current.lock().unwrap().clone()
    }
}

pub fn socks_settings() -> ProxySettings {
    ProxySettings::new("10.0.0.5", "9050", "socks")
}

/// Monitor wired to test doubles
pub struct Harness {
    pub monitor: HealthMonitor,
    pub store: Arc<FakeStore>,
    pub transport: Arc<MockTransport>,
    pub notifier: Arc<RecordingNotifier>,
    pub settings: Arc<TestSettings>,
}

impl Harness {
    pub fn new(store: FakeStore, transport: MockTransport) -> Self {
        Self::with_options(store, transport, MonitorOptions::default())
    }

    pub fn with_options(store: FakeStore, transport: MockTransport, options: MonitorOptions) -> Self {
        let store = Arc::new(store);
        let transport = Arc::new(transport);
        let notifier = Arc::new(RecordingNotifier::default());
        let settings = Arc::new(TestSettings::new(socks_settings()));

        let monitor = HealthMonitor::new(
            store.clone(),
            ProxyProbe::with_transport(transport.clone()),
            notifier.clone(),
            settings.clone(),
        )
        .with_options(options);

        Self {
            monitor,
            store,
            transport,
            notifier,
            settings,
        }
    }
}
