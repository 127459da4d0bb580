use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, OnceLock};

use chrono::Local;
use flate2::{write::GzEncoder, Compression};
use fs2::FileExt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::network::types::{get_local_timestamp, parse_env_bool};

const LOG_ROTATION_SIZE_MB: u64 = 8;
const MAX_ARCHIVES: u32 = 5;
const ROTATION_CHECK_INTERVAL: u32 = 200;

pub const DEBUG_ENV_VAR: &str = "PROXYWATCH_DEBUG";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,                             // ISO-8601 with timezone
    pub level: String,                                 // DEBUG, ERROR, MONITOR, PROBE
    pub component: String,
    pub event: String,
    pub message: String,                               // redacted
    pub correlation_id: Option<String>,
    pub fields: HashMap<String, serde_json::Value>,
}

struct RotatingLogger {
    log_path: PathBuf,
    write_count: AtomicU32,
}

impl RotatingLogger {
    fn new(log_path: PathBuf) -> Self {
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        Self {
            log_path,
            write_count: AtomicU32::new(0),
        }
    }

    fn write_with_rotation(&self, json_line: &str) -> Result<(), std::io::Error> {
        if self.write_count.fetch_add(1, Ordering::Relaxed) % ROTATION_CHECK_INTERVAL == 0 {
            let _ = self.rotate_if_needed();
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        writeln!(file, "{}", json_line)
    }

    fn rotate_if_needed(&self) -> Result<(), std::io::Error> {
        if !self.needs_rotation()? {
            return Ok(());
        }

        // Another process may be rotating; the lock file keeps it to one
        let lock_path = self.log_path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;

        if lock_file.try_lock_exclusive().is_ok() {
            if self.needs_rotation()? {
                self.perform_rotation()?;
            }
            let _ = std::fs::remove_file(&lock_path);
        }
        Ok(())
    }

    fn needs_rotation(&self) -> Result<bool, std::io::Error> {
        if !self.log_path.exists() {
            return Ok(false);
        }

        let metadata = std::fs::metadata(&self.log_path)?;
        Ok(metadata.len() >= LOG_ROTATION_SIZE_MB * 1024 * 1024)
    }

    fn log_dir_and_stem(&self) -> Result<(&Path, String), std::io::Error> {
        let dir = self.log_path.parent().unwrap_or_else(|| Path::new("."));
        let stem = self
            .log_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "log path has no file name"))?;
        Ok((dir, stem.to_string()))
    }

    fn perform_rotation(&self) -> Result<(), std::io::Error> {
        let (log_dir, base_name) = self.log_dir_and_stem()?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let archive_path = log_dir.join(format!("{}.{}.gz", base_name, timestamp));

        // move aside, compress, then drop the uncompressed copy
        let temp_path = self.log_path.with_extension("rotating");
        std::fs::rename(&self.log_path, &temp_path)?;

        let source_file = File::open(&temp_path)?;
        let target_file = File::create(&archive_path)?;
        let mut encoder = GzEncoder::new(target_file, Compression::default());
        std::io::copy(&mut BufReader::new(source_file), &mut encoder)?;
        encoder.finish()?;

        std::fs::remove_file(&temp_path)?;

        let _ = self.cleanup_old_archives();
        Ok(())
    }

    fn cleanup_old_archives(&self) -> Result<(), std::io::Error> {
        let (log_dir, base_name) = self.log_dir_and_stem()?;
        let prefix = format!("{}.", base_name);

        let mut archives = Vec::new();
        for entry in std::fs::read_dir(log_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();

            if name.starts_with(&prefix) && name.ends_with(".gz") {
                archives.push((entry.path(), entry.metadata()?.modified()?));
            }
        }

        archives.sort_by_key(|(_, modified)| *modified);
        if archives.len() > MAX_ARCHIVES as usize {
            let to_remove = archives.len() - MAX_ARCHIVES as usize;
            for (path, _) in archives.iter().take(to_remove) {
                let _ = std::fs::remove_file(path);
            }
        }

        Ok(())
    }
}

/// JSON-Lines debug logger for the monitor and probes.
///
/// Disabled unless `PROXYWATCH_DEBUG` is set to `true|1|yes|on`. Writing never
/// fails the caller; I/O errors are swallowed.
pub struct EnhancedDebugLogger {
    enabled: bool,
    rotating_logger: Option<Mutex<RotatingLogger>>,
    session_id: String,
    redaction_patterns: Vec<Regex>,
}

impl Default for EnhancedDebugLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl EnhancedDebugLogger {
    pub fn new() -> Self {
        let enabled = parse_env_bool(DEBUG_ENV_VAR);
        let log_path = if enabled { Some(Self::get_log_path()) } else { None };
        Self::build(enabled, log_path)
    }

    /// Logger writing to an explicit file, regardless of the environment
    pub fn with_path(log_path: PathBuf) -> Self {
        Self::build(true, Some(log_path))
    }

    fn build(enabled: bool, log_path: Option<PathBuf>) -> Self {
        let session_id = Uuid::new_v4().to_string()[..8].to_string();

        Self {
            enabled,
            rotating_logger: log_path.map(|path| Mutex::new(RotatingLogger::new(path))),
            session_id,
            redaction_patterns: Self::compile_redaction_patterns(),
        }
    }

    fn get_log_path() -> PathBuf {
        let mut log_path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        log_path.push(".proxywatch");
        log_path.push("proxywatch-debug.log");
        log_path
    }

    fn compile_redaction_patterns() -> Vec<Regex> {
        let patterns = [
            r"(?i)(://)[^/@\s:]+:[^/@\s]+@",           // user:pass@ in proxy URIs
            r"(?i)proxy-authorization[:\s]+(?:basic\s+|bearer\s+)?[^\s]+",
            r"(?i)authorization[:\s]+(?:basic\s+|bearer\s+)?[^\s]+",
            r"(?i)password[:\s=]+[^\s\n]+",
            r"(?i)token[:\s=]+[^\s\n]+",
        ];

        patterns
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect()
    }

    /// Redaction guardrails for sensitive data
    pub fn redact_sensitive_data(&self, text: &str) -> String {
        let mut redacted = text.to_string();
        for (index, regex) in self.redaction_patterns.iter().enumerate() {
            let replacement = if index == 0 { "${1}[REDACTED]@" } else { "[REDACTED]" };
            redacted = regex.replace_all(&redacted, replacement).to_string();
        }
        redacted
    }

    fn log_sync(
        &self,
        level: &str,
        component: &str,
        event: &str,
        message: &str,
        correlation_id: Option<String>,
        fields: HashMap<String, serde_json::Value>,
    ) {
        if !self.enabled {
            return;
        }

        let entry = LogEntry {
            timestamp: get_local_timestamp(),
            level: level.to_string(),
            component: component.to_string(),
            event: event.to_string(),
            message: self.redact_sensitive_data(message),
            correlation_id: correlation_id.or_else(|| Some(self.session_id.clone())),
            fields,
        };

        if let Some(logger) = &self.rotating_logger {
            if let Ok(logger) = logger.lock() {
                if let Ok(json_line) = serde_json::to_string(&entry) {
                    let _ = logger.write_with_rotation(&json_line);
                }
            }
        }
    }

    pub fn debug_sync(&self, component: &str, event: &str, message: &str) {
        self.log_sync("DEBUG", component, event, message, None, HashMap::new());
    }

    pub fn error_sync(&self, component: &str, event: &str, message: &str) {
        self.log_sync("ERROR", component, event, message, None, HashMap::new());
    }

    // Typed events

    pub fn monitor_tick(&self, interface: &str, any_enabled: bool, active_endpoints: &[String]) {
        let mut fields = HashMap::new();
        fields.insert("interface".to_string(), serde_json::Value::String(interface.to_string()));
        fields.insert("any_enabled".to_string(), serde_json::Value::Bool(any_enabled));
        fields.insert("active_endpoints".to_string(), serde_json::json!(active_endpoints));

        self.log_sync("MONITOR", "HealthMonitor", "monitor_tick",
                      &format!("{}: proxy {}", interface, if any_enabled { "on" } else { "off" }),
                      None, fields);
    }

    pub fn transition(&self, interface: &str, from: Option<bool>, to: bool) {
        let mut fields = HashMap::new();
        fields.insert("interface".to_string(), serde_json::Value::String(interface.to_string()));
        fields.insert("from".to_string(), serde_json::json!(from));
        fields.insert("to".to_string(), serde_json::Value::Bool(to));

        self.log_sync("MONITOR", "HealthMonitor", "transition",
                      &format!("{}: proxy state {:?} -> {}", interface, from, to),
                      None, fields);
    }

    pub fn store_query_failed(&self, interface: &str, error: &str) {
        let mut fields = HashMap::new();
        fields.insert("interface".to_string(), serde_json::Value::String(interface.to_string()));

        self.log_sync("ERROR", "HealthMonitor", "store_query_failed",
                      &format!("Keeping last known state, query failed: {}", error),
                      None, fields);
    }

    pub fn probe_start(&self, mode: &str, target: &str, timeout_ms: u64, correlation_id: String) {
        let mut fields = HashMap::new();
        fields.insert("mode".to_string(), serde_json::Value::String(mode.to_string()));
        fields.insert("target".to_string(), serde_json::Value::String(target.to_string()));
        fields.insert("timeout_ms".to_string(), serde_json::Value::Number(timeout_ms.into()));

        self.log_sync("PROBE", "ProxyProbe", "probe_start",
                      &format!("Starting {} probe of {}", mode, target),
                      Some(correlation_id), fields);
    }

    pub fn probe_end(&self, mode: &str, http_status: Option<u16>, duration_ms: u64, correlation_id: String) {
        let mut fields = HashMap::new();
        fields.insert("mode".to_string(), serde_json::Value::String(mode.to_string()));
        fields.insert("duration_ms".to_string(), serde_json::Value::Number(duration_ms.into()));

        if let Some(code) = http_status {
            fields.insert("http_status".to_string(), serde_json::Value::Number(code.into()));
        }

        self.log_sync("PROBE", "ProxyProbe", "probe_end",
                      &format!("{} probe completed: {:?} ({}ms)", mode, http_status, duration_ms),
                      Some(correlation_id), fields);
    }

    pub fn probe_cancelled(&self, probe_id: u64, stage: &str) {
        let mut fields = HashMap::new();
        fields.insert("probe_id".to_string(), serde_json::Value::Number(probe_id.into()));
        fields.insert("stage".to_string(), serde_json::Value::String(stage.to_string()));

        self.log_sync("PROBE", "HealthMonitor", "probe_cancelled",
                      &format!("Probe #{} cancelled during {}", probe_id, stage),
                      None, fields);
    }

    pub fn notification_sent(&self, title: &str, delivered: bool) {
        let mut fields = HashMap::new();
        fields.insert("delivered".to_string(), serde_json::Value::Bool(delivered));

        self.log_sync("MONITOR", "Notifier", "notification_sent",
                      title, None, fields);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get_session_id(&self) -> &str {
        &self.session_id
    }
}

static DEBUG_LOGGER: OnceLock<EnhancedDebugLogger> = OnceLock::new();

/// Process-wide logger, configured from the environment on first use
pub fn get_debug_logger() -> &'static EnhancedDebugLogger {
    DEBUG_LOGGER.get_or_init(EnhancedDebugLogger::new)
}
