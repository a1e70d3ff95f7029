//! Thin wrapper around the `tracing` crate's logging macros.
//!
//! Modules that log import `crate::tracing::prelude::*` rather than the
//! `tracing` crate directly, so a future switch in logging backend touches
//! one place.

pub mod prelude {
    pub use tracing::{debug, error, info, trace, warn};
}

/// Install a global `tracing` subscriber reading its filter from
/// [`crate::config::LogLevel`].
pub fn init(level: crate::config::LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(level.as_filter_directive())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
