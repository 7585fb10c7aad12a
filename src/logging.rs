// src/logging.rs
use tracing_subscriber::EnvFilter;

/// Installs the global stderr subscriber. Respects `RUST_LOG`, defaults to `info`.
/// Returns false if a subscriber was already set.
pub fn init() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
