use tracing_subscriber::EnvFilter;

/// Initialize logging to stderr.
///
/// Honours `RUST_LOG`; defaults to `info` so the probe diagnostic is always shown.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
