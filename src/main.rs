use proxywatch::cli::Cli;
use proxywatch::config::{Config, ConfigFileSettings};
use proxywatch::core::network::{
    DesktopNotifier, HealthMonitor, NetworkSetupStore, ProxyProbe, StatusRenderer, SystemProxyStore, TestMode,
};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_args();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    // Handle configuration commands
    if cli.init {
        Config::init_at(&config_path)?;
        println!("Created {}", config_path.display());
        return Ok(());
    }

    if cli.print {
        Config::load_from(&config_path).unwrap_or_default().print()?;
        return Ok(());
    }

    if cli.check {
        Config::load_from(&config_path)?.check()?;
        println!("✓ Configuration valid");
        return Ok(());
    }

    let config = Config::load_from(&config_path).unwrap_or_else(|e| {
        eprintln!("Warning: {}; using defaults", e);
        Config::default()
    });
    let interface = cli.interface.clone().unwrap_or_else(|| config.proxy.interface.clone());
    let renderer = StatusRenderer::new();

    if cli.status {
        let state = NetworkSetupStore::new().activation_state(&interface)?;
        println!("{}", renderer.render_activation(&interface, &state));
        return Ok(());
    }

    let monitor = build_monitor(&config, config_path);

    if cli.test {
        let (mode, outcome) = monitor.test_configured(&interface, cli.direct).await;
        println!("{}", renderer.render_outcome(mode, &outcome));
        if !outcome.is_success() {
            std::process::exit(1);
        }
        return Ok(());
    }

    if config.monitor.startup_check {
        if let Some(outcome) = monitor.startup_check(&interface).await {
            println!("{}", renderer.render_outcome(TestMode::Proxy, &outcome));
        }
    }

    println!("Watching {} every {}ms, Ctrl-C to stop", interface, config.monitor.tick_interval_ms);
    let handle = monitor.spawn(interface, config.tick_interval());

    tokio::signal::ctrl_c().await?;
    handle.shutdown().await;

    Ok(())
}

fn build_monitor(config: &Config, config_path: PathBuf) -> HealthMonitor {
    HealthMonitor::new(
        Arc::new(NetworkSetupStore::new()),
        ProxyProbe::new().with_timeouts(config.probe_timeouts()),
        Arc::new(DesktopNotifier::default()),
        Arc::new(ConfigFileSettings::new(config_path)),
    )
    .with_options(config.monitor_options())
}
