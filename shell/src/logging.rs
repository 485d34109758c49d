//! Logging initialization using the `tracing` crate.
//!
//! `RUST_LOG` overrides the default filter. Output goes to stderr.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber. Call once, before anything logs.
///
/// Default level is `info` for release builds and `debug` for debug builds,
/// for this crate only; everything else is held at `warn`.
pub fn init() {
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,thorium_shell={default_level}")));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(true)
        .compact();

    tracing_subscriber::registry().with(filter).with(layer).init();
}
