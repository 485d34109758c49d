//! Canonical file locations for the shell's per-user data.
//!
//! Everything lives under `<data dir>/Thorium/`:
//!   - config.toml   Read at startup.
//!   - status.toml   Written by the primary instance for external UIs.
//!   - device.toml   Device identity store.
//!   - handoff.sock  Second-instance endpoint (Unix), or handoff.port elsewhere.
use std::path::PathBuf;

const APP_DIR_NAME: &str = "Thorium";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const STATUS_FILE_NAME: &str = "status.toml";
pub const DEVICE_FILE_NAME: &str = "device.toml";

/// Returns the per-user application data directory.
///
/// Falls back to the temp directory when the platform reports no data dir.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

pub fn config_file_path() -> PathBuf {
    app_data_dir().join(CONFIG_FILE_NAME)
}

pub fn status_file_path() -> PathBuf {
    app_data_dir().join(STATUS_FILE_NAME)
}

pub fn device_file_path() -> PathBuf {
    app_data_dir().join(DEVICE_FILE_NAME)
}
