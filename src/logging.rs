//! Tracing subscriber setup for binaries and examples.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Legacy log level knob, honoured when `RUST_LOG` is unset.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Install a fmt subscriber. Filter comes from `RUST_LOG`, then `LOG_LEVEL`,
/// then `warn`. Does nothing if a subscriber is already installed.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var(LOG_LEVEL_ENV)
            .ok()
            .and_then(|raw| parse_level(&raw))
            .unwrap_or(Level::WARN);
        EnvFilter::default().add_directive(level.into())
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Accepts level names or 1 (error) through 5 (trace).
fn parse_level(raw: &str) -> Option<Level> {
    let raw = raw.trim();
    match raw.parse::<u8>() {
        Ok(1) => Some(Level::ERROR),
        Ok(2) => Some(Level::WARN),
        Ok(3) => Some(Level::INFO),
        Ok(4) => Some(Level::DEBUG),
        Ok(5) => Some(Level::TRACE),
        Ok(_) => None,
        Err(_) => raw.parse().ok(),
    }
}
