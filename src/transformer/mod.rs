//! Translator module for Messages API backends.
//!
//! A translator rewrites one exchange between a client speaking the Messages
//! API and a backend that serves it, possibly hosted by a cloud provider.
//!
//! # Architecture
//!
//! Each exchange gets its own translator instance, driven in order by the
//! external-processing filter:
//!
//! ```text
//! Client Request
//!     ↓
//! [request_body]      ← Rewrite body (and path, for hosted backends)
//!     ↓
//! Backend
//!     ↓
//! [response_headers]  ← No-op for all Messages backends
//!     ↓
//! [response_body] ×N  ← Extract usage, report model, pass body through
//!     ↓
//! Client Response
//! ```
//!
//! The direct backend ([`passthrough`]) forwards the body as is. The hosted
//! backends ([`bedrock`], [`gcp_vertex`]) share [`hosted`] and only differ in
//! the request path.

pub mod bedrock;
pub mod gcp_vertex;
pub mod hosted;
pub mod messages;
pub mod mutation;
pub mod passthrough;
pub mod response;
pub mod stream;
pub mod usage;

use std::collections::HashMap;
use std::io::Read;

pub use bedrock::{AwsAnthropicTranslator, BedrockPath};
pub use gcp_vertex::{GcpAnthropicTranslator, VertexPath, GCP_MODEL_PUBLISHER_ANTHROPIC};
pub use hosted::{escape_path_segment, HostedAnthropicTranslator, HostedPath};
pub use messages::{
    apply_model_name_override, MessagesRequest, MessagesResponse, MessagesUsage,
    ModelNameOverride, RequestModel, ANTHROPIC_VERSION_KEY,
};
pub use mutation::{
    build_body_mutations, build_request_mutations, set_content_length, BodyMutation, HeaderMutation,
    HeaderValueOption, CONTENT_LENGTH_HEADER, PATH_HEADER,
};
pub use passthrough::AnthropicPassthroughTranslator;
pub use response::{MessagesResponseHandler, ResponseBodyOutput};
pub use stream::StreamUsageAccumulator;
pub use usage::LLMTokenUsage;

use crate::core::config::{BackendBinding, BackendSchema, TranslatorConfig};
use crate::core::error::Result;
use crate::core::AppError;

// ============================================================================
// Translator Trait
// ============================================================================

/// Translator for one Messages API exchange.
///
/// Instances hold exchange state (the resolved request model and the
/// streaming usage counters) and must not be reused across exchanges.
pub trait MessagesTranslator: Send {
    /// Schema of the backend this translator targets.
    fn schema(&self) -> BackendSchema;

    /// Rewrite the request body for the backend.
    ///
    /// `(None, None)` leaves the request untouched. With
    /// `force_body_mutation` the body is re-encoded even when nothing changed.
    fn request_body(
        &mut self,
        raw: &[u8],
        body: &MessagesRequest,
        force_body_mutation: bool,
    ) -> Result<(Option<HeaderMutation>, Option<BodyMutation>)>;

    /// Rewrite the response headers.
    fn response_headers(&mut self, headers: &HashMap<String, String>)
        -> Result<Option<HeaderMutation>>;

    /// Process one delivery of the response body.
    ///
    /// Called once for a buffered response (`end_of_stream == true`) or once
    /// per chunk of a streamed one.
    fn response_body(
        &mut self,
        headers: &HashMap<String, String>,
        body: &mut dyn Read,
        end_of_stream: bool,
    ) -> Result<ResponseBodyOutput>;

    /// Model resolved by the last `request_body` call; empty before it.
    fn request_model(&self) -> &str;
}

/// Build a fresh translator for `binding`.
pub fn new_messages_translator(binding: &BackendBinding) -> Box<dyn MessagesTranslator> {
    match binding.schema {
        BackendSchema::Anthropic => Box::new(AnthropicPassthroughTranslator::new(
            binding.model_name_override.clone(),
        )),
        BackendSchema::AwsAnthropic => Box::new(AwsAnthropicTranslator::new(
            binding.api_version.clone(),
            binding.model_name_override.clone(),
        )),
        BackendSchema::GcpAnthropic => Box::new(GcpAnthropicTranslator::new(
            binding.api_version.clone(),
            binding.model_name_override.clone(),
        )),
    }
}

// ============================================================================
// Translator Registry
// ============================================================================

/// Registry of configured backends.
///
/// Bindings are read-only once loaded; every lookup builds a new translator.
#[derive(Debug, Clone, Default)]
pub struct TranslatorRegistry {
    bindings: HashMap<String, BackendBinding>,
    /// Backend names in configuration order
    order: Vec<String>,
}

impl TranslatorRegistry {
    /// Create an empty registry (for testing).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a registry from a validated configuration.
    pub fn from_config(config: &TranslatorConfig) -> Result<Self> {
        config.validate()?;

        let mut registry = Self::empty();
        for binding in &config.backends {
            registry.register(binding.clone());
        }
        Ok(registry)
    }

    /// Register a binding, replacing one with the same name.
    ///
    /// A hosted binding without `api_version` is accepted with a warning; its
    /// translators fail on the first request.
    pub fn register(&mut self, binding: BackendBinding) {
        if binding.schema.requires_api_version() && binding.api_version.is_empty() {
            tracing::warn!(
                backend = %binding.name,
                schema = %binding.schema,
                "Hosted backend has no api_version, requests will be rejected"
            );
        }
        tracing::debug!(
            backend = %binding.name,
            schema = %binding.schema,
            has_override = !binding.model_name_override.is_empty(),
            "Registered backend binding"
        );
        if !self.bindings.contains_key(&binding.name) {
            self.order.push(binding.name.clone());
        }
        self.bindings.insert(binding.name.clone(), binding);
    }

    /// Get a binding by backend name.
    pub fn binding(&self, name: &str) -> Option<&BackendBinding> {
        self.bindings.get(name)
    }

    /// Build a fresh translator for the named backend.
    pub fn translator_for(&self, name: &str) -> Result<Box<dyn MessagesTranslator>> {
        self.binding(name)
            .map(new_messages_translator)
            .ok_or_else(|| AppError::Config(format!("Unknown backend: {}", name)))
    }

    /// List configured backend names.
    pub fn backends(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
