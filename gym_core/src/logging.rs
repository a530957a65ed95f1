//! Logging infrastructure for Gymlog.
//!
//! Both binaries log to stderr so stdout stays free for command output.
//! `RUST_LOG` always takes precedence over the built-in default level.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Server logging: `info` by default, compact lines with targets
pub fn init() {
    init_with_level("info")
}

/// Server-style logging with a different default level
pub fn init_with_level(default_level: &str) {
    tracing_subscriber::registry()
        .with(filter(default_level))
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Terminal client logging: warnings only, no timestamps or targets
pub fn init_cli() {
    tracing_subscriber::registry()
        .with(filter("warn"))
        .with(
            fmt::layer()
                .without_time()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
