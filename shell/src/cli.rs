//! Command-line surface: startup flags and the dispatcher that turns
//! application arguments into open requests.
//!
//! Options take their value with `=` so that a forwarded second-launch argv,
//! stripped of `--` tokens, never leaves a dangling option value behind.
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::debug;

use crate::open_request::OpenChannels;
use crate::second_instance::CommandLine;

#[derive(Debug, Parser)]
#[command(name = "thorium-shell", version, about = "Single-instance process host for the Thorium reader")]
pub struct Args {
    /// Config file to use instead of the one in the data directory.
    #[arg(long, value_name = "PATH", require_equals = true)]
    pub config: Option<PathBuf>,

    /// Print this device's identifier and exit.
    #[arg(long)]
    pub device_id: bool,

    /// Print the identifier recorded for KEY, if any, and exit.
    #[arg(long, value_name = "KEY", require_equals = true)]
    pub check_device_id: Option<String>,

    /// Record (or reuse) an identifier for KEY, print it and exit.
    #[arg(long, value_name = "KEY", require_equals = true)]
    pub record_device_id: Option<String>,

    /// Deep links (`<scheme>:<uri>`) or documents to open.
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,
}

/// Routes application arguments into the open-request channels, the same way
/// for a first launch and for launches forwarded by a second instance.
pub struct LaunchDispatcher {
    channels: OpenChannels,
}

impl LaunchDispatcher {
    pub fn new(channels: OpenChannels) -> Self {
        Self { channels }
    }

    /// Relative documents are joined onto `base` when one is given.
    fn dispatch(&self, arg: &str, base: Option<&Path>) {
        if arg.is_empty() {
            debug!("skipping empty argument");
        } else if self.channels.is_deep_link(arg) {
            self.channels.push_url_payload(arg);
        } else {
            match base {
                Some(dir) if Path::new(arg).is_relative() => {
                    let resolved = dir.join(arg);
                    debug!(arg, resolved = %resolved.display(), "resolved relative document");
                    self.channels.push_file_payload(&resolved.to_string_lossy());
                }
                _ => {
                    self.channels.push_file_payload(arg);
                }
            }
        }
    }
}

impl CommandLine for LaunchDispatcher {
    fn process(&self, args: &[String]) {
        for arg in args {
            self.dispatch(arg, None);
        }
    }

    /// A second launch's relative paths belong to its own working directory,
    /// not to this process's.
    fn process_in(&self, args: &[String], working_dir: &Path) {
        for arg in args {
            self.dispatch(arg, Some(working_dir));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // ── Args ──────────────────────────────────────────────────────────────────

    #[test]
    fn args_collect_targets_in_order() {
        let args = Args::try_parse_from(["thorium-shell", "b.epub", "thorium:opds://x", "a.pdf"])
            .unwrap();
        assert_eq!(args.targets, strings(&["b.epub", "thorium:opds://x", "a.pdf"]));
        assert!(args.config.is_none());
    }

    #[test]
    fn args_config_requires_equals() {
        let args = Args::try_parse_from(["thorium-shell", "--config=/etc/thorium.toml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/etc/thorium.toml")));

        assert!(Args::try_parse_from(["thorium-shell", "--config", "/etc/thorium.toml"]).is_err());
    }

    #[test]
    fn args_device_flags() {
        let args = Args::try_parse_from(["thorium-shell", "--record-device-id=lsd"]).unwrap();
        assert_eq!(args.record_device_id.as_deref(), Some("lsd"));
        assert!(!args.device_id);

        let args = Args::try_parse_from(["thorium-shell", "--device-id"]).unwrap();
        assert!(args.device_id);
    }

    #[test]
    fn args_reject_unknown_flags() {
        assert!(Args::try_parse_from(["thorium-shell", "--bogus"]).is_err());
    }

    // ── LaunchDispatcher ──────────────────────────────────────────────────────

    #[test]
    fn dispatcher_routes_links_and_documents() {
        let channels = OpenChannels::new("thorium");
        let dispatcher = LaunchDispatcher::new(channels.clone());

        dispatcher.process(&strings(&[
            "thorium:https://example.com/book.opds",
            "",
            "/books/a.epub",
            "thorium:",
        ]));

        let urls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&urls);
        channels
            .urls
            .attach(move |e| sink.lock().unwrap().push(e.into_inner()));

        let files = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&files);
        channels
            .files
            .attach(move |e| sink.lock().unwrap().push(e.path().to_path_buf()));

        assert_eq!(
            *urls.lock().unwrap(),
            strings(&["https://example.com/book.opds"])
        );
        assert_eq!(*files.lock().unwrap(), vec![PathBuf::from("/books/a.epub")]);
    }

    #[test]
    fn document_path_containing_scheme_is_not_a_link() {
        let channels = OpenChannels::new("thorium");
        let dispatcher = LaunchDispatcher::new(channels.clone());

        dispatcher.process(&strings(&["/home/me/Books/thorium: the novel.epub"]));

        assert_eq!(channels.urls.pending_len(), 0);
        let files = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&files);
        channels
            .files
            .attach(move |e| sink.lock().unwrap().push(e.path().to_path_buf()));
        assert_eq!(
            *files.lock().unwrap(),
            vec![PathBuf::from("/home/me/Books/thorium: the novel.epub")]
        );
    }

    #[test]
    fn relative_documents_resolve_against_launch_directory() {
        let channels = OpenChannels::new("thorium");
        let dispatcher = LaunchDispatcher::new(channels.clone());
        let launch_dir = std::env::temp_dir().join("reader-launch");
        let absolute = launch_dir.join("elsewhere.epub");

        dispatcher.process_in(
            &[
                "books/a.epub".to_string(),
                absolute.to_string_lossy().into_owned(),
                "thorium:opds://feed".to_string(),
            ],
            &launch_dir,
        );

        let files = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&files);
        channels
            .files
            .attach(move |e| sink.lock().unwrap().push(e.path().to_path_buf()));
        assert_eq!(
            *files.lock().unwrap(),
            vec![launch_dir.join("books/a.epub"), absolute]
        );
        assert_eq!(channels.urls.pending_len(), 1);
    }

    #[test]
    fn first_launch_documents_are_left_relative() {
        let channels = OpenChannels::new("thorium");
        let dispatcher = LaunchDispatcher::new(channels.clone());
        dispatcher.process(&strings(&["books/a.epub"]));

        let files = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&files);
        channels
            .files
            .attach(move |e| sink.lock().unwrap().push(e.path().to_path_buf()));
        assert_eq!(*files.lock().unwrap(), vec![PathBuf::from("books/a.epub")]);
    }

    #[test]
    fn dispatcher_can_run_repeatedly() {
        let channels = OpenChannels::new("thorium");
        let dispatcher = LaunchDispatcher::new(channels.clone());
        dispatcher.process(&strings(&["a.epub"]));
        dispatcher.process(&strings(&["a.epub"]));
        assert_eq!(channels.files.pending_len(), 2);
    }
}
