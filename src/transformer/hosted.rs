//! Request translation shared by the cloud-hosted Anthropic backends.
//!
//! Bedrock and Vertex AI both take the model from the request path rather than
//! the body and require an `anthropic_version` body field. They only differ in
//! how the path is spelled, which [`HostedPath`] captures.

use std::collections::HashMap;
use std::io::Read;
use std::marker::PhantomData;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

use crate::core::config::BackendSchema;
use crate::core::{AppError, Result};

use super::messages::{
    apply_model_name_override, is_streaming, MessagesRequest, ModelNameOverride, RequestModel,
    ANTHROPIC_VERSION_KEY,
};
use super::mutation::{build_request_mutations, BodyMutation, HeaderMutation};
use super::response::{MessagesResponseHandler, ResponseBodyOutput};
use super::MessagesTranslator;

/// Bytes escaped in a model path segment: everything except unreserved
/// characters and the sub-delimiters `$ & + = : @`.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'=')
    .remove(b':')
    .remove(b'@');

/// Path layout of a hosted backend.
pub trait HostedPath {
    /// Schema this layout belongs to.
    const SCHEMA: BackendSchema;

    /// Request path for an already escaped model id.
    fn request_path(escaped_model: &str, stream: bool) -> String;
}

/// Messages translator for a backend addressed by model path.
pub struct HostedAnthropicTranslator<P> {
    api_version: String,
    model_name_override: ModelNameOverride,
    request_model: RequestModel,
    response_handler: MessagesResponseHandler,
    _path: PhantomData<fn() -> P>,
}

impl<P: HostedPath> HostedAnthropicTranslator<P> {
    /// An empty `api_version` is accepted here and rejected on the first
    /// request body.
    pub fn new(api_version: impl Into<String>, model_name_override: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            model_name_override: model_name_override.into(),
            request_model: RequestModel::new(),
            response_handler: MessagesResponseHandler::new(),
            _path: PhantomData,
        }
    }
}

impl<P: HostedPath> std::fmt::Debug for HostedAnthropicTranslator<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedAnthropicTranslator")
            .field("schema", &P::SCHEMA)
            .field("api_version", &self.api_version)
            .field("model_name_override", &self.model_name_override)
            .field("request_model", &self.request_model)
            .finish()
    }
}

impl<P: HostedPath> MessagesTranslator for HostedAnthropicTranslator<P> {
    fn schema(&self) -> BackendSchema {
        P::SCHEMA
    }

    fn request_body(
        &mut self,
        _raw: &[u8],
        body: &MessagesRequest,
        _force_body_mutation: bool,
    ) -> Result<(Option<HeaderMutation>, Option<BodyMutation>)> {
        self.request_model = apply_model_name_override(body.model(), &self.model_name_override);

        let mut doc = body.to_map();
        doc.shift_remove("model");

        if self.api_version.is_empty() {
            return Err(AppError::Config(format!(
                "{} is required for {} but not provided in backend configuration",
                ANTHROPIC_VERSION_KEY,
                P::SCHEMA
            )));
        }
        doc.insert(
            ANTHROPIC_VERSION_KEY.to_string(),
            Value::String(self.api_version.clone()),
        );

        let mutated_body = serde_json::to_vec(&doc)?;
        let stream = is_streaming(&doc);
        let path = P::request_path(&escape_path_segment(&self.request_model), stream);

        let backend = P::SCHEMA;
        tracing::debug!(
            backend = %backend,
            model = %self.request_model,
            path = %path,
            stream,
            body_len = mutated_body.len(),
            "Translated hosted Messages request"
        );

        let (header_mutation, body_mutation) = build_request_mutations(&path, mutated_body);
        Ok((Some(header_mutation), Some(body_mutation)))
    }

    fn response_headers(
        &mut self,
        _headers: &HashMap<String, String>,
    ) -> Result<Option<HeaderMutation>> {
        Ok(None)
    }

    fn response_body(
        &mut self,
        _headers: &HashMap<String, String>,
        body: &mut dyn Read,
        end_of_stream: bool,
    ) -> Result<ResponseBodyOutput> {
        self.response_handler
            .handle(body, end_of_stream, &self.request_model)
    }

    fn request_model(&self) -> &str {
        &self.request_model
    }
}

/// Percent-escape `segment` so it stays a single path segment.
///
/// `/`, `%`, `?`, `;`, `,`, whitespace and controls are escaped; `:` and `@`
/// are kept. Dot segments are not special.
pub fn escape_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}
