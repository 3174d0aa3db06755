//! Tracing setup for the `wx` binary.
//!
//! Library code only emits `tracing` events; installing a subscriber is left to
//! the binary. Output goes to stderr so stdout stays clean for reports.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Filter directive for a `-v` count: 0 → warn, 1 → info, 2 → debug, more → trace.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `verbosity` when set.
///
/// Calling this twice is harmless; the second install is ignored.
pub fn init(verbosity: u8) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init();
}
