// 📝 Logging - tracing subscriber setup shared by the binaries

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when RUST_LOG is unset
pub const DEFAULT_DIRECTIVE: &str = "address_import=info";

/// Install a console subscriber filtered by RUST_LOG
///
/// Logs go to stderr so command output on stdout stays clean.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    // A second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
