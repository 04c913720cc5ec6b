//! Log output for the library and its front ends.
use tracing_subscriber::EnvFilter;

/// Installs a stderr subscriber filtered at `level`.
///
/// `RUST_LOG` takes precedence when set. A second call leaves the first
/// subscriber in place and returns `false`.
pub fn init(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
