use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "proxywatch")]
#[command(version = concat!("Ver:", env!("CARGO_PKG_VERSION")))]
#[command(about = "Watches the system proxy and checks it can reach the internet when it turns on")]
pub struct Cli {
    /// Write a default configuration file
    #[arg(long = "init")]
    pub init: bool,

    /// Print the effective configuration
    #[arg(long = "print")]
    pub print: bool,

    /// Validate the configuration file
    #[arg(long = "check")]
    pub check: bool,

    /// Run one reachability test and exit
    #[arg(short = 't', long = "test")]
    pub test: bool,

    /// With --test, bypass the proxy
    #[arg(long = "direct", requires = "test")]
    pub direct: bool,

    /// Show which system proxies are on
    #[arg(short = 's', long = "status")]
    pub status: bool,

    /// Configuration file (default: ~/.proxywatch/config.toml)
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Network service to watch, overriding the configuration
    #[arg(short = 'i', long = "interface", value_name = "NAME")]
    pub interface: Option<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
