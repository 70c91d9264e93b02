//! Tracing initialization for host binaries. The library itself only
//! emits events; installing a subscriber is the embedding process's call.

/// Install a global fmt subscriber writing to stderr, filtered by
/// RUST_LOG (default "info"). Call once at process start; subsequent
/// calls are ignored.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
