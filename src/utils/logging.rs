// ============================================================================
// Logging Setup
// ============================================================================

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a global `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"info"` or `"exchange_settlement=debug"`).
///
/// Fails if a global subscriber is already set.
///
/// # Example
/// ```no_run
/// exchange_settlement::utils::init_tracing("info").unwrap();
/// ```
pub fn init_tracing(default_directive: &str) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .try_init()
}
