//! LLM Proxy Translator - Messages API translation for an external-processing filter
//!
//! This library converts Messages API exchanges between the gateway's public
//! format and the backends that serve it:
//!
//! - **Direct passthrough**: Forward the request on its own path, optionally pinning the model
//! - **AWS Bedrock**: `InvokeModel` / `InvokeModelWithResponseStream` paths with `anthropic_version`
//! - **GCP Vertex AI**: `rawPredict` / `streamRawPredict` paths with `anthropic_version`
//! - **Token usage**: Extracted from final bodies and accumulated across SSE chunks
//!
//! # Architecture
//!
//! The codebase is organized into two layers:
//!
//! - [`core`]: Ambient functionality (config, errors, logging)
//! - [`transformer`]: Request/response translators and their registry
//!
//! # Usage
//!
//! ```
//! use llm_proxy_translator::{BackendBinding, BackendSchema, MessagesRequest, new_messages_translator};
//!
//! let binding = BackendBinding::new("bedrock", BackendSchema::AwsAnthropic)
//!     .with_api_version("bedrock-2023-05-31");
//! let mut translator = new_messages_translator(&binding);
//!
//! let raw = br#"{"model":"anthropic.claude-3-haiku-20240307-v1:0","max_tokens":64,"messages":[]}"#;
//! let request = MessagesRequest::from_slice(raw).unwrap();
//! let (headers, _body) = translator.request_body(raw, &request, false).unwrap();
//!
//! assert_eq!(
//!     headers.unwrap().get(":path"),
//!     Some("/model/anthropic.claude-3-haiku-20240307-v1:0/invoke")
//! );
//! ```
//!
//! # Configuration
//!
//! Bindings can be loaded from YAML with [`TranslatorConfig::load`]. Optional
//! environment variables:
//! - `RUST_LOG`: Log filter (default: `info,llm_proxy_translator=debug`)
//! - `LOG_FORMAT`: `json` for JSON log lines
//! - `TRANSLATOR_MODEL_NAME_OVERRIDE_<BACKEND>`: Model override per backend

pub mod core;
pub mod transformer;

// Re-export commonly used types for convenience
pub use core::{init_logging, AppError, BackendBinding, BackendSchema, Result, TranslatorConfig};
pub use transformer::{
    new_messages_translator, LLMTokenUsage, MessagesRequest, MessagesTranslator,
    ResponseBodyOutput, TranslatorRegistry,
};
