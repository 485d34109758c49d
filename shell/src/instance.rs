//! Process-wide primary-instance arbitration.
use std::sync::Arc;

use tracing::{debug, info};

use crate::open_request::OpenChannels;
use crate::platform::InstancePlatform;
use crate::second_instance::SecondInstanceHandler;

/// Outcome of the one-time lock attempt made at startup.
///
/// Owned by the startup routine and passed by reference to whatever needs to
/// know whether this process is primary. It never changes after `acquire`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceLock {
    primary: bool,
}

impl InstanceLock {
    /// Requests the OS lock and, on success, arms the three platform hooks.
    ///
    /// A process that is not primary gets no hooks and should exit without
    /// creating windows or opening persistent storage.
    pub fn acquire<P: InstancePlatform>(
        platform: &mut P,
        channels: &OpenChannels,
        handler: Arc<SecondInstanceHandler>,
    ) -> Self {
        if !platform.request_exclusive_lock() {
            info!("another instance holds the lock");
            return Self { primary: false };
        }

        let urls = channels.clone();
        platform.on_pre_launch_url_open(Box::new(move |payload| {
            debug!(payload = payload.as_str(), "open-url");
            urls.push_url_payload(&payload);
        }));

        let files = channels.clone();
        platform.on_pre_launch_file_open(Box::new(move |payload| {
            debug!(payload = payload.as_str(), "open-file");
            files.push_file_payload(&payload);
        }));

        platform.on_second_instance(Box::new(move |argv, working_dir| {
            handler.handle(&argv, &working_dir);
        }));

        info!("acquired primary instance lock");
        Self { primary: true }
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }
}
