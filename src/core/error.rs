//! Error types and handling for the translator core.
//!
//! This module provides a unified error type [`AppError`] covering every failure
//! a translator can report back to the calling filter. Response parse failures
//! and malformed SSE lines are not errors and never reach this type.

use thiserror::Error;

/// Main error type for the translator core.
///
/// Every variant is terminal for the exchange it was raised in. The caller
/// surfaces it as a gateway-side failure and forwards nothing to the backend.
#[derive(Error, Debug)]
pub enum AppError {
    /// Backend binding is incomplete or the configuration source is invalid
    /// (missing `anthropic_version`, unknown backend, unreadable file, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Inbound request could not be parsed as a Messages request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Reading the backend response body failed
    #[error("Failed to read response body: {0}")]
    ResponseRead(#[source] std::io::Error),
}

impl AppError {
    /// HTTP status the gateway should answer with when this error aborts an exchange.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Config(_) => 500,
            AppError::Serialization(_) => 500,
            AppError::InvalidRequest(_) => 400,
            AppError::ResponseRead(_) => 502,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Keep the whole context chain in the message.
        AppError::Config(format!("{:#}", err))
    }
}

/// Convenience type alias for Results using [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
