//! Typed "open this resource" requests and the channels that carry them.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::channel::EventChannel;

/// A deep link with the application scheme prefix already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenUrlEvent(String);

impl OpenUrlEvent {
    /// Normalizes an OS payload of the form `<scheme>:<uri>`.
    ///
    /// Everything after the first occurrence of `<scheme>:` is the URI. No
    /// decoding or validation happens here. Returns `None` when the prefix is
    /// absent or nothing follows it.
    pub fn from_payload(payload: &str, scheme: &str) -> Option<Self> {
        let prefix = format!("{scheme}:");
        let (_, uri) = payload.split_once(prefix.as_str())?;
        if uri.is_empty() {
            return None;
        }
        Some(Self(uri.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// A filesystem path handed to the process by the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFileEvent(PathBuf);

impl OpenFileEvent {
    /// Returns `None` for an empty payload.
    pub fn from_payload(payload: &str) -> Option<Self> {
        if payload.is_empty() {
            return None;
        }
        Some(Self(PathBuf::from(payload)))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// The two per-kind channels, created once for the life of the process.
#[derive(Clone)]
pub struct OpenChannels {
    scheme: String,
    pub urls: Arc<EventChannel<OpenUrlEvent>>,
    pub files: Arc<EventChannel<OpenFileEvent>>,
}

impl OpenChannels {
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            urls: Arc::new(EventChannel::new()),
            files: Arc::new(EventChannel::new()),
        }
    }

    /// Normalizes and pushes a URL payload. Returns whether anything was pushed.
    pub fn push_url_payload(&self, payload: &str) -> bool {
        match OpenUrlEvent::from_payload(payload, &self.scheme) {
            Some(event) => {
                debug!(url = event.as_str(), "queued open-url request");
                self.urls.push(event);
                true
            }
            None => {
                debug!(payload, "dropped open-url payload without a usable URI");
                false
            }
        }
    }

    /// Pushes a file payload unless it is empty. Returns whether anything was pushed.
    pub fn push_file_payload(&self, payload: &str) -> bool {
        match OpenFileEvent::from_payload(payload) {
            Some(event) => {
                debug!(path = %event.path().display(), "queued open-file request");
                self.files.push(event);
                true
            }
            None => {
                debug!("dropped empty open-file payload");
                false
            }
        }
    }

    /// Whether `payload` carries this application's scheme prefix.
    pub fn is_deep_link(&self, payload: &str) -> bool {
        is_deep_link(payload, &self.scheme)
    }
}

/// Whether `payload` starts with the `<scheme>:` prefix used for deep links.
///
/// A path that merely contains the prefix somewhere is still a document.
pub fn is_deep_link(payload: &str, scheme: &str) -> bool {
    payload
        .strip_prefix(scheme)
        .is_some_and(|rest| rest.starts_with(':'))
}
