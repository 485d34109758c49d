//! Device identity store.
//!
//! A flat TOML table of strings in `device.toml`. The device's own identifier
//! lives under `device_id`; identifiers recorded on behalf of a named service
//! live under `device_id_<key>`. All identifiers are UUID v4.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};
use uuid::Uuid;

const DEVICE_ID_KEY: &str = "device_id";
const DEVICE_ID_PREFIX: &str = "device_id_";

pub struct DeviceIdentity {
    path: PathBuf,
    name: String,
}

impl DeviceIdentity {
    pub fn new(path: PathBuf, name: impl Into<String>) -> Self {
        Self {
            path,
            name: name.into(),
        }
    }

    pub fn device_name(&self) -> &str {
        &self.name
    }

    /// Returns this device's identifier, generating and storing one on first use.
    pub fn device_id(&self) -> Result<String> {
        let mut values = self.load();
        if let Some(id) = values.get(DEVICE_ID_KEY) {
            return Ok(id.clone());
        }

        let id = Uuid::new_v4().to_string();
        values.insert(DEVICE_ID_KEY.to_string(), id.clone());
        self.save(&values)?;
        info!(device_id = id.as_str(), "generated device identifier");
        Ok(id)
    }

    /// Returns the identifier recorded for `key`, if any.
    pub fn check_device_id(&self, key: &str) -> Option<String> {
        self.load().remove(&format!("{DEVICE_ID_PREFIX}{key}"))
    }

    /// Records an identifier for `key`, reusing an existing one.
    pub fn record_device_id(&self, key: &str) -> Result<String> {
        let mut values = self.load();
        let entry = format!("{DEVICE_ID_PREFIX}{key}");
        let id = values
            .get(&entry)
            .cloned()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        values.insert(entry, id.clone());
        self.save(&values)?;
        Ok(id)
    }

    /// An unreadable or missing document counts as empty.
    fn load(&self) -> BTreeMap<String, String> {
        match read_document(&self.path) {
            Ok(values) => values,
            Err(e) => {
                debug!("device store unavailable, starting empty: {e:#}");
                BTreeMap::new()
            }
        }
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create device store directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(values).context("Failed to serialize device store")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write device store: {}", self.path.display()))
    }
}

fn read_document(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read device store: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse device store: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path) -> DeviceIdentity {
        DeviceIdentity::new(dir.join("device.toml"), "Test Device")
    }

    // ── device_id ─────────────────────────────────────────────────────────────

    #[test]
    fn device_id_is_generated_once_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let first = store(dir.path()).device_id().unwrap();
        let second = store(dir.path()).device_id().unwrap();
        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn device_id_survives_corrupt_document_by_starting_over() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("device.toml"), "][ not toml").unwrap();
        let id = store(dir.path()).device_id().unwrap();
        assert_eq!(store(dir.path()).device_id().unwrap(), id);
    }

    // ── check / record ────────────────────────────────────────────────────────

    #[test]
    fn check_unknown_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store(dir.path()).check_device_id("lsd"), None);
    }

    #[test]
    fn record_then_check_returns_same_id() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        let recorded = s.record_device_id("provider-a").unwrap();
        assert_eq!(s.check_device_id("provider-a"), Some(recorded));
    }

    #[test]
    fn record_reuses_existing_id() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        let first = s.record_device_id("provider-a").unwrap();
        let second = s.record_device_id("provider-a").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn record_keeps_other_entries() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        let device = s.device_id().unwrap();
        let a = s.record_device_id("a").unwrap();
        let b = s.record_device_id("b").unwrap();

        assert_ne!(a, b);
        assert_eq!(s.device_id().unwrap(), device);
        assert_eq!(s.check_device_id("a"), Some(a));
        assert_eq!(s.check_device_id("b"), Some(b));
    }

    #[test]
    fn stored_document_uses_prefixed_keys() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        s.record_device_id("lsd").unwrap();
        let content = std::fs::read_to_string(dir.path().join("device.toml")).unwrap();
        assert!(content.contains("device_id_lsd"));
    }

    #[test]
    fn device_name_is_configured_name() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store(dir.path()).device_name(), "Test Device");
    }
}
