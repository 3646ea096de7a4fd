//! Tracing subscriber setup for the binary
//!
//! The filter comes from `RUST_LOG` and defaults to `info`. Library code only
//! emits events; installing a subscriber is the embedding program's call.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: OnceLock<()> = OnceLock::new();

/// Install a stderr `fmt` subscriber once; later calls are no-ops
pub fn init() {
    INIT.get_or_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);

        // another subscriber may already be installed by the host program
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .try_init();
    });
}
