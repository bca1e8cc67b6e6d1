//! # Structured Logging Module
//!
//! Environment-aware structured logging for debugging the console's
//! interleaved async flows (debounce timers, fetch generations, refresh
//! cycles).

use std::sync::OnceLock;

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
///
/// Filter level comes from `CONSOLE_LOG` (falling back to `RUST_LOG`, then
/// `info`). Safe to call more than once; only the first call installs a
/// subscriber.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = std::env::var("CONSOLE_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string());

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_filter(EnvFilter::new(filter.clone())),
        );

        // Use try_init to avoid panic if a global subscriber already exists
        // (e.g. in tests or when embedded in a host application).
        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized");
        } else {
            tracing::info!(filter = %filter, "Structured logging initialized");
        }
    });
}
