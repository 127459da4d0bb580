use std::fs;
use std::time::Duration;

use proxywatch::config::{Config, ConfigError, ConfigFileSettings, SettingsSource};
use proxywatch::core::network::types::ProxySettings;

use crate::common::create_temp_dir;

#[test]
fn test_missing_file_yields_defaults() {
    let dir = create_temp_dir();
    let config = Config::load_from(&dir.path().join("config.toml")).unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.proxy_settings(), ProxySettings::new("127.0.0.1", "1080", "socks"));
    assert_eq!(config.proxy.interface, "Wi-Fi");
    assert_eq!(config.proxy.test_url, "https://ifconfig.co/ip");
    assert_eq!(config.tick_interval(), Duration::from_secs(4));
    assert_eq!(config.settle_delay(), Duration::from_millis(400));
}

#[test]
fn test_init_writes_defaults_once() {
    let dir = create_temp_dir();
    let path = dir.path().join("nested").join("config.toml");

    Config::init_at(&path).unwrap();
    assert_eq!(Config::load_from(&path).unwrap(), Config::default());

    assert!(matches!(Config::init_at(&path), Err(ConfigError::AlreadyExists(_))));
}

#[test]
fn test_load_partial_file() {
    let dir = create_temp_dir();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "[proxy]\nip = \"10.0.0.5\"\nport = \"9050\"\n\n[monitor]\nsettle_delay_ms = 1000\nnotifications = false\n",
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();

    assert_eq!(config.proxy_settings(), ProxySettings::new("10.0.0.5", "9050", "socks"));
    assert_eq!(config.monitor.tick_interval_ms, 4_000);

    let options = config.monitor_options();
    assert_eq!(options.settle_delay, Duration::from_secs(1));
    assert!(!options.notify_failures);
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let dir = create_temp_dir();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[proxy\nip = ").unwrap();

    assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse { .. })));
}

#[test]
fn test_check_reports_problems() {
    let mut config = Config::default();
    config.proxy.protocol = "ftp".to_string();
    config.monitor.tick_interval_ms = 0;

    match config.check() {
        Err(ConfigError::Invalid(problems)) => {
            assert_eq!(problems.len(), 2);
            assert_eq!(problems[0], "Unknown protocol: ftp");
        }
        other => panic!("expected Invalid, got {:?}", other),
    }
}

#[test]
fn test_probe_timeouts_from_config() {
    let mut config = Config::default();
    config.probe.request_timeout_secs = 3;
    config.probe.resource_timeout_secs = 5;

    let timeouts = config.probe_timeouts();
    assert_eq!(timeouts.request, Duration::from_secs(3));
    assert_eq!(timeouts.resource, Duration::from_secs(5));
}

#[test]
fn test_file_settings_reread_on_every_call() {
    let dir = create_temp_dir();
    let path = dir.path().join("config.toml");
    let settings = ConfigFileSettings::new(&path);

    assert_eq!(settings.probe_settings().proxy.port, "1080");

    fs::write(&path, "[proxy]\nport = \"9050\"\ntest_url = \"http://example.com/ip\"\n").unwrap();
    let current = settings.probe_settings();
    assert_eq!(current.proxy.port, "9050");
    assert_eq!(current.test_url, "http://example.com/ip");
}

#[test]
fn test_file_settings_fall_back_on_invalid_file() {
    let dir = create_temp_dir();
    let path = dir.path().join("config.toml");
    fs::write(&path, "not toml at all [").unwrap();

    let settings = ConfigFileSettings::new(&path).probe_settings();

    assert_eq!(settings, Config::default().probe_settings());
}

#[test]
fn test_zero_timeouts_in_file_stay_bounded() {
    let config: Config = toml::from_str("[probe]\nrequest_timeout_secs = 0\nresource_timeout_secs = 0\n").unwrap();

    let timeouts = config.probe_timeouts();
    assert!(!timeouts.request.is_zero());
    assert!(!timeouts.resource.is_zero());
    assert_eq!(timeouts.resource, Duration::from_secs(8));
}
