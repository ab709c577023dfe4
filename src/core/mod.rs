//! Core functionality shared by the translators.
//!
//! This module contains the ambient components used throughout the crate:
//! - Backend binding configuration
//! - Error handling
//! - Logging bootstrap

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{BackendBinding, BackendSchema, TranslatorConfig};
pub use error::{AppError, Result};
pub use logging::init_logging;
