//! Logging bootstrap.
//!
//! Translators only emit `tracing` events; installing a subscriber is left to
//! the embedding process. [`init_logging`] is provided for standalone use and
//! mirrors the filter defaults of the gateway binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,llm_proxy_translator=debug";

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT` (`json` selects JSON, anything else text).
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// Build the env filter from `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`].
pub fn build_filter() -> EnvFilter {
    let base = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
    EnvFilter::new(base)
}

/// Install a global subscriber.
///
/// Returns `false` when a subscriber was already installed, which is not an
/// error for an embedded library.
pub fn init_logging() -> bool {
    let no_color = std::env::var("NO_COLOR").is_ok();
    let filter = build_filter();

    let result = match LogFormat::from_env() {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_ansi(false))
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_ansi(!no_color))
            .try_init(),
    };

    result.is_ok()
}
