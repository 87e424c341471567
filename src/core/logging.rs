//! Logging setup
//!
//! The engine only ever emits through the `log` facade: tree rebuilds and
//! refits at debug/trace, suppressed callback panics and failed deferred
//! commands at error/warn. Hosts that already install their own `log`
//! backend get all of that for free and should not call into this module.

/// Install an env_logger backend for hosts that have none
///
/// Filtering defaults to `info`; set `RUST_LOG=zonic=trace` to watch the
/// scheduler hand out entity slices, or `RUST_LOG=zonic=debug` for tree
/// rebuilds only. Panics if a logger is already installed.
pub fn init() {
    builder().init();
}

/// Fallible variant for tests and embedders where another logger may
/// already be registered; returns whether this call installed the backend
pub fn try_init() -> bool {
    builder().try_init().is_ok()
}

fn builder() -> env_logger::Builder {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
}
