//! Logging setup for applications embedding the router
//!
//! `RUST_LOG` wins when set; otherwise `default_filter` applies
//! (e.g. "info" or "amm_router=debug").

use tracing_subscriber::{fmt, EnvFilter};

fn filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Install a human-readable subscriber. Returns false if one was already set.
pub fn init_tracing(default_filter: &str) -> bool {
    fmt()
        .with_env_filter(filter(default_filter))
        .with_target(false)
        .try_init()
        .is_ok()
}

/// Install a JSON-lines subscriber. Returns false if one was already set.
pub fn init_json_tracing(default_filter: &str) -> bool {
    fmt()
        .json()
        .with_env_filter(filter(default_filter))
        .try_init()
        .is_ok()
}
