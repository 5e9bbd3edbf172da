//! Development-time tracing for debugging `cram`.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: Dev diagnostics via `RUST_LOG`, output to stderr.
//!   Not persisted, not part of the session trail.
//!
//! - **Event log (`io/event_log`)**: Product artifact (`cram.log`). Written for
//!   every session unless disabled, unaffected by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset.
/// Output: stderr, compact format. Stderr shares the screen with the prompts,
/// so verbose levels are best combined with `2>cram-debug.log`.
///
/// # Example
/// ```bash
/// RUST_LOG=cram=debug cargo run -- deck.txt 2>cram-debug.log
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
