use tracing_subscriber::EnvFilter;

/// Install the global subscriber, writing to stderr
///
/// `RUST_LOG` wins over `level`. Calling twice is harmless.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("rock_git={}", level)))
        .unwrap_or_else(|_| EnvFilter::new("rock_git=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
