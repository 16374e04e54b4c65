//! Log output for the `retail-etl` binary

use tracing_subscriber::EnvFilter;

/// Send pipeline events to stderr, filtered by `RUST_LOG` or else `log_level`
pub fn init(log_level: &str) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => EnvFilter::new(log_level),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
