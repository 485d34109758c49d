//! The OS single-instance primitive, as seen by [`crate::instance::InstanceLock`].
//!
//! The real implementation lives in [`crate::native`]; tests substitute
//! [`testing::FakePlatform`], which fires hooks synchronously.
use std::path::PathBuf;

/// Receives a raw URL-open payload (scheme prefix still attached).
pub type UrlHook = Box<dyn Fn(String) + Send + Sync>;
/// Receives a raw file-open payload.
pub type FileHook = Box<dyn Fn(String) + Send + Sync>;
/// Receives the argument list and working directory of a second launch.
pub type SecondInstanceHook = Box<dyn Fn(Vec<String>, PathBuf) + Send + Sync>;

pub trait InstancePlatform {
    /// Tries to become the single primary instance for this application
    /// identity. Any OS failure must surface as `false`.
    fn request_exclusive_lock(&mut self) -> bool;

    fn on_pre_launch_url_open(&mut self, hook: UrlHook);

    fn on_pre_launch_file_open(&mut self, hook: FileHook);

    fn on_second_instance(&mut self, hook: SecondInstanceHook);
}

#[cfg(test)]
pub mod testing {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::{FileHook, InstancePlatform, SecondInstanceHook, UrlHook};

    /// Machine-wide lock stand-in shared by every fake "process".
    #[derive(Clone, Default)]
    pub struct FakeLockAuthority {
        held: Arc<AtomicBool>,
    }

    impl FakeLockAuthority {
        fn try_take(&self) -> bool {
            self.held
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        }
    }

    /// Records hook registrations and lets tests fire them on demand.
    #[derive(Default)]
    pub struct FakePlatform {
        authority: FakeLockAuthority,
        fail_lock: bool,
        pub lock_requests: usize,
        url_hook: Option<UrlHook>,
        file_hook: Option<FileHook>,
        second_instance_hook: Option<SecondInstanceHook>,
    }

    impl FakePlatform {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_authority(authority: FakeLockAuthority) -> Self {
            Self {
                authority,
                ..Self::default()
            }
        }

        /// A platform whose OS primitive errors out.
        pub fn failing() -> Self {
            Self {
                fail_lock: true,
                ..Self::default()
            }
        }

        pub fn hooks_armed(&self) -> bool {
            self.url_hook.is_some()
                && self.file_hook.is_some()
                && self.second_instance_hook.is_some()
        }

        pub fn any_hook_armed(&self) -> bool {
            self.url_hook.is_some()
                || self.file_hook.is_some()
                || self.second_instance_hook.is_some()
        }

        pub fn fire_url_open(&self, payload: &str) {
            if let Some(hook) = &self.url_hook {
                hook(payload.to_string());
            }
        }

        pub fn fire_file_open(&self, payload: &str) {
            if let Some(hook) = &self.file_hook {
                hook(payload.to_string());
            }
        }

        pub fn fire_second_instance(&self, argv: &[&str], working_dir: &str) {
            if let Some(hook) = &self.second_instance_hook {
                hook(
                    argv.iter().map(|s| s.to_string()).collect(),
                    PathBuf::from(working_dir),
                );
            }
        }
    }

    impl InstancePlatform for FakePlatform {
        fn request_exclusive_lock(&mut self) -> bool {
            self.lock_requests += 1;
            !self.fail_lock && self.authority.try_take()
        }

        fn on_pre_launch_url_open(&mut self, hook: UrlHook) {
            self.url_hook = Some(hook);
        }

        fn on_pre_launch_file_open(&mut self, hook: FileHook) {
            self.file_hook = Some(hook);
        }

        fn on_second_instance(&mut self, hook: SecondInstanceHook) {
            self.second_instance_hook = Some(hook);
        }
    }
}
