//! Startup wiring: the open-request plumbing, the instance lock, and the
//! consumers that feed the event loop.
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

use crate::cli::{Args, LaunchDispatcher};
use crate::device::DeviceIdentity;
use crate::event::ShellEvent;
use crate::instance::InstanceLock;
use crate::open_request::OpenChannels;
use crate::platform::InstancePlatform;
use crate::second_instance::{CommandLine, SecondInstanceHandler, WindowProvider};
use crate::window::WindowRegistry;

pub struct Launch {
    pub lock: InstanceLock,
    pub channels: OpenChannels,
    pub windows: Arc<WindowRegistry>,
}

impl Launch {
    /// Builds everything the platform hooks feed, then requests the lock.
    pub fn start<P: InstancePlatform>(platform: &mut P, scheme: &str) -> Self {
        let channels = OpenChannels::new(scheme);
        let windows = Arc::new(WindowRegistry::default());

        let window_provider: Arc<dyn WindowProvider> = windows.clone();
        let command_line: Arc<dyn CommandLine> =
            Arc::new(LaunchDispatcher::new(channels.clone()));
        let handler = Arc::new(SecondInstanceHandler::new(window_provider, command_line));

        let lock = InstanceLock::acquire(platform, &channels, handler);
        Self {
            lock,
            channels,
            windows,
        }
    }

    /// Drains whatever the hooks buffered into `events`, then forwards live
    /// requests as they arrive.
    pub fn attach_consumers(&self, events: &UnboundedSender<ShellEvent>) {
        info!(
            pending_urls = self.channels.urls.pending_len(),
            pending_files = self.channels.files.pending_len(),
            "attaching open-request consumers"
        );

        let tx = events.clone();
        self.channels.urls.attach(move |url| {
            let _ = tx.send(ShellEvent::OpenUrl(url));
        });

        let tx = events.clone();
        self.channels.files.attach(move |file| {
            let _ = tx.send(ShellEvent::OpenFile(file));
        });
    }
}

/// Handles the device-identity flags. Returns the exit code when one was given.
///
/// The store belongs to the primary; a process that lost the lock refuses
/// without opening it.
pub fn run_device_command(args: &Args, lock: &InstanceLock, device: &DeviceIdentity) -> Option<i32> {
    if !args.device_id && args.check_device_id.is_none() && args.record_device_id.is_none() {
        return None;
    }

    if !lock.is_primary() {
        warn!("device commands need the primary instance; close the running reader first");
        return Some(1);
    }

    let result = if let Some(key) = &args.record_device_id {
        device.record_device_id(key).map(Some)
    } else if let Some(key) = &args.check_device_id {
        Ok(device.check_device_id(key))
    } else {
        device.device_id().map(Some)
    };

    match result {
        Ok(Some(id)) => {
            println!("{id}");
            Some(0)
        }
        Ok(None) => Some(1),
        Err(e) => {
            error!("{e:#}");
            Some(1)
        }
    }
}
