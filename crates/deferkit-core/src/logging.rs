//! Structured logging re-exports and subscriber setup.
//!
//! With the `tracing` feature, the crate's internal `debug!`/`trace!`
//! calls resolve to the real `tracing` macros. With `tracing-json`, [`init`]
//! installs a JSON subscriber filtered by the [`LOG_ENV`] variable.

pub use tracing::{debug, trace};

/// Environment variable holding the `EnvFilter` directives.
#[cfg(feature = "tracing-json")]
pub const LOG_ENV: &str = "DEFERKIT_LOG";

/// Install a global JSON subscriber.
///
/// Reads filter directives from `DEFERKIT_LOG` and falls back to `info`.
/// Returns an error if a global subscriber is already set.
#[cfg(feature = "tracing-json")]
pub fn init() -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json())
        .try_init()
}
