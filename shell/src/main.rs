mod channel;
mod cli;
mod config;
mod device;
mod event;
mod handoff;
mod instance;
mod launch;
mod logging;
mod native;
mod open_request;
mod paths;
mod platform;
mod second_instance;
mod status;
mod window;

use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::Args;
use crate::device::DeviceIdentity;
use crate::event::ShellEvent;
use crate::launch::{run_device_command, Launch};
use crate::native::NativePlatform;
use crate::status::{ShellState, StatusBoard};
use crate::window::LibraryWindow;

#[tokio::main]
async fn main() {
    logging::init();
    let args = Args::parse();

    // ── Configuration ─────────────────────────────────────────────────────────
    let config_path = args.config.clone().unwrap_or_else(paths::config_file_path);
    let config = config::load_or_default(&config_path).unwrap_or_else(|e| {
        warn!("config error (using defaults): {e:#}");
        config::Config::default()
    });

    // ── Instance lock ─────────────────────────────────────────────────────────
    // Everything the OS hooks feed is built before the lock is requested.
    let mut platform = NativePlatform::new(
        &config.instance.app_id,
        &config.instance.url_scheme,
        paths::app_data_dir(),
        args.targets.clone(),
    );
    let launch = Launch::start(&mut platform, &config.instance.url_scheme);

    let device = DeviceIdentity::new(paths::device_file_path(), config.device.name.clone());
    if let Some(code) = run_device_command(&args, &launch.lock, &device) {
        drop(platform);
        std::process::exit(code);
    }

    if !launch.lock.is_primary() {
        info!("another instance is running; exiting");
        return;
    }

    // ── Device identity ───────────────────────────────────────────────────────
    match device.device_id() {
        Ok(id) => info!(
            device_id = id.as_str(),
            device_name = device.device_name(),
            "device identity ready"
        ),
        Err(e) => warn!("device identity unavailable: {e:#}"),
    }

    // ── Status + library window ───────────────────────────────────────────────
    let board = Arc::new(StatusBoard::new(paths::status_file_path()));
    let window = Arc::new(LibraryWindow::open(Arc::clone(&board)));
    launch.windows.install(Arc::clone(&window));
    info!(focused = window.is_focused(), "library window open");

    // ── Consumers ─────────────────────────────────────────────────────────────
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ShellEvent>();
    launch.attach_consumers(&event_tx);

    // Graceful shutdown on Ctrl+C.
    {
        let tx = event_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(ShellEvent::Shutdown);
            }
        });
    }

    board.update(|s| s.state = ShellState::Running);
    info!("thorium-shell v{} started", env!("CARGO_PKG_VERSION"));

    // ── Event loop ────────────────────────────────────────────────────────────
    while let Some(evt) = event_rx.recv().await {
        match evt {
            ShellEvent::OpenUrl(url) => {
                info!(url = url.as_str(), "opening publication link");
                let now = chrono::Local::now().to_rfc3339();
                board.update(|s| {
                    s.last_opened_url = Some(url.into_inner());
                    s.last_opened_at = Some(now);
                    s.error = None;
                });
            }

            ShellEvent::OpenFile(file) => {
                let path = file.path();
                if !path.exists() {
                    warn!(path = %path.display(), "requested document does not exist");
                    board.update(|s| {
                        s.error = Some(format!("Document not found: {}", path.display()));
                    });
                    continue;
                }

                info!(path = %path.display(), "opening document");
                let now = chrono::Local::now().to_rfc3339();
                board.update(|s| {
                    s.last_opened_file = Some(path.display().to_string());
                    s.last_opened_at = Some(now);
                    s.error = None;
                });
            }

            ShellEvent::Shutdown => {
                info!("shutting down");
                break;
            }
        }
    }

    if let Some(window) = launch.windows.take() {
        window.close();
    }
    board.update(|s| s.state = ShellState::Stopped);
    let last = board.snapshot();
    info!(
        last_url = ?last.last_opened_url,
        last_file = ?last.last_opened_file,
        "final status written"
    );
    // Releases the OS lock.
    drop(platform);
}
