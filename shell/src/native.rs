//! The real [`InstancePlatform`]: an OS-level single-instance lock plus the
//! local hand-off endpoint.
//!
//! The lock comes from the `single-instance` crate (named mutex on Windows,
//! abstract socket on Linux, `flock` on macOS). It is held for as long as the
//! `NativePlatform` value lives and released by the OS on exit.
//!
//! Deep links and documents reach this process as launch arguments, so the
//! open-url/open-file hooks are fed by replaying the launch targets the
//! platform was built with. Replay happens when the hook is registered, which
//! is before any window exists.
//!
//! The hand-off endpoint is bound as soon as the lock is won. Second launches
//! that arrive before the second-instance hook is registered wait in a
//! buffer and are replayed to it in arrival order.
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use single_instance::SingleInstance;
use tracing::{debug, info, warn};

use crate::channel::EventChannel;
use crate::handoff::{self, HandoffMessage};
use crate::open_request::is_deep_link;
use crate::platform::{FileHook, InstancePlatform, SecondInstanceHook, UrlHook};

const FORWARD_ATTEMPTS: u32 = 5;
const FORWARD_RETRY_DELAY: Duration = Duration::from_millis(200);

pub struct NativePlatform {
    app_id: String,
    scheme: String,
    handoff_dir: PathBuf,
    launch_targets: Vec<String>,
    /// Keeps the OS lock alive.
    _instance: Option<SingleInstance>,
    _listener: Option<JoinHandle<()>>,
    second_launches: Arc<EventChannel<HandoffMessage>>,
}

impl NativePlatform {
    pub fn new(
        app_id: impl Into<String>,
        scheme: impl Into<String>,
        handoff_dir: PathBuf,
        launch_targets: Vec<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            scheme: scheme.into(),
            handoff_dir,
            launch_targets,
            _instance: None,
            _listener: None,
            second_launches: Arc::new(EventChannel::new()),
        }
    }

    fn deep_links(&self) -> impl Iterator<Item = &String> {
        self.launch_targets
            .iter()
            .filter(|t| is_deep_link(t, &self.scheme))
    }

    fn documents(&self) -> impl Iterator<Item = &String> {
        self.launch_targets
            .iter()
            .filter(|t| !is_deep_link(t, &self.scheme))
    }

    /// Starts accepting second launches into the buffer.
    fn listen_for_second_launches(&mut self) {
        let second_launches = Arc::clone(&self.second_launches);
        let served = handoff::serve(&self.handoff_dir, move |message| {
            second_launches.push(message)
        });
        match served {
            Ok(handle) => self._listener = Some(handle),
            Err(e) => warn!("second launches will not be detected: {e:#}"),
        }
    }

    /// Hands this launch's arguments to the running primary.
    ///
    /// The primary binds its endpoint just after winning the lock, so the
    /// first attempts may land before it exists. Gives up after
    /// `FORWARD_ATTEMPTS`.
    fn forward_to_primary(&self) {
        let message = HandoffMessage::from_current_process();
        for attempt in 1..=FORWARD_ATTEMPTS {
            match handoff::send(&self.handoff_dir, &message) {
                Ok(()) => {
                    info!(argv = ?message.argv, attempt, "forwarded launch to primary instance");
                    return;
                }
                Err(e) if attempt == FORWARD_ATTEMPTS => {
                    warn!("could not reach primary instance: {e:#}");
                }
                Err(e) => {
                    debug!(attempt, "primary not reachable yet: {e:#}");
                    std::thread::sleep(FORWARD_RETRY_DELAY);
                }
            }
        }
    }
}

/// Name handed to `SingleInstance`. On macOS it is a lock file path, so keep
/// it out of the working directory.
pub fn lock_name(app_id: &str) -> String {
    #[cfg(target_os = "macos")]
    {
        std::env::temp_dir()
            .join(format!("{app_id}.lock"))
            .to_string_lossy()
            .into_owned()
    }
    #[cfg(not(target_os = "macos"))]
    {
        app_id.to_string()
    }
}

/// Returns the held lock if this process is the only holder of `name`.
pub fn acquire_os_lock(name: &str) -> Option<SingleInstance> {
    match SingleInstance::new(name) {
        Ok(instance) if instance.is_single() => Some(instance),
        Ok(_) => None,
        Err(e) => {
            warn!("single-instance primitive failed, treating as lock denied: {e}");
            None
        }
    }
}

impl InstancePlatform for NativePlatform {
    fn request_exclusive_lock(&mut self) -> bool {
        match acquire_os_lock(&lock_name(&self.app_id)) {
            Some(instance) => {
                self._instance = Some(instance);
                self.listen_for_second_launches();
                true
            }
            None => {
                self.forward_to_primary();
                false
            }
        }
    }

    fn on_pre_launch_url_open(&mut self, hook: UrlHook) {
        for target in self.deep_links() {
            debug!(target = target.as_str(), "replaying launch deep link");
            hook(target.clone());
        }
    }

    fn on_pre_launch_file_open(&mut self, hook: FileHook) {
        for target in self.documents() {
            debug!(target = target.as_str(), "replaying launch document");
            hook(target.clone());
        }
    }

    fn on_second_instance(&mut self, hook: SecondInstanceHook) {
        let buffered = self.second_launches.pending_len();
        if buffered > 0 {
            debug!(buffered, "replaying second launches received during startup");
        }
        self.second_launches
            .attach(move |message| hook(message.argv, message.working_dir));
    }
}
