use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber for structured logging.
///
/// - Debug builds: human-readable output
/// - Release builds: JSON-formatted output for log aggregation
///
/// The log level is controlled by `RUST_LOG`, defaulting to `info`.
/// Safe to call more than once — later calls are no-ops, so test binaries
/// can initialize freely.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if cfg!(debug_assertions) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init();
    }
}
