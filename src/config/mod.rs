pub mod defaults;
pub mod loader;
pub mod types;

pub use loader::{ConfigError, ConfigFileSettings, SettingsSource};
pub use types::*;
