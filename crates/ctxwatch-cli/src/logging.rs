use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr; stdout is the hook protocol channel and must
/// stay clean. RUST_LOG overrides the settings-driven default.
pub fn init(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
