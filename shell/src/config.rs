use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_APP_ID: &str = "org.edrlab.thorium";
pub const DEFAULT_URL_SCHEME: &str = "thorium";
pub const DEFAULT_DEVICE_NAME: &str = "Thorium";

/// Root configuration structure. Deserialized from `<data dir>/Thorium/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub instance: InstanceConfig,
    #[serde(default)]
    pub device: DeviceConfig,
}

/// Single-instance arbitration settings.
#[derive(Debug, Deserialize)]
pub struct InstanceConfig {
    /// Application identity; every process sharing it competes for one lock.
    #[serde(default = "default_app_id")]
    pub app_id: String,
    /// Custom URL scheme registered with the OS, without the trailing colon.
    #[serde(default = "default_url_scheme")]
    pub url_scheme: String,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            app_id: DEFAULT_APP_ID.to_string(),
            url_scheme: DEFAULT_URL_SCHEME.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeviceConfig {
    /// Name reported alongside the device identifier.
    #[serde(default = "default_device_name")]
    pub name: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_DEVICE_NAME.to_string(),
        }
    }
}

/// Loads the config file at `path`, returning `Config::default()` if the file does not exist.
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn default_app_id() -> String {
    DEFAULT_APP_ID.to_string()
}

fn default_url_scheme() -> String {
    DEFAULT_URL_SCHEME.to_string()
}

fn default_device_name() -> String {
    DEFAULT_DEVICE_NAME.to_string()
}
