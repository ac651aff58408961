use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr so stdout carries only the echoed names.
///
/// The level defaults to `warn` and follows `RUST_LOG` when set.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
