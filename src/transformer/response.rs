//! Response-side handling shared by every Messages backend.
//!
//! All three backends answer in the Messages response format, so the body is
//! never rewritten: the handler only extracts usage and decides which model to
//! report.

use std::io::Read;

use crate::core::{AppError, Result};

use super::messages::MessagesResponse;
use super::mutation::{set_content_length, BodyMutation, HeaderMutation};
use super::stream::StreamUsageAccumulator;
use super::usage::LLMTokenUsage;

/// Result of one `response_body` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseBodyOutput {
    pub header_mutation: Option<HeaderMutation>,
    pub body_mutation: Option<BodyMutation>,
    pub token_usage: LLMTokenUsage,
    pub response_model: String,
}

/// Per-exchange response state.
#[derive(Debug, Clone, Default)]
pub struct MessagesResponseHandler {
    accumulator: StreamUsageAccumulator,
    /// Report the model named by the backend instead of the request model.
    prefer_backend_model: bool,
}

impl MessagesResponseHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler that reports the backend's own model name when it gives one.
    pub fn preferring_backend_model() -> Self {
        Self {
            prefer_backend_model: true,
            ..Self::default()
        }
    }

    /// Cumulative streaming usage seen so far.
    pub fn stream_usage(&self) -> LLMTokenUsage {
        self.accumulator.usage()
    }

    /// Process one response body delivery.
    ///
    /// `end_of_stream == false` marks a streaming chunk; `true` marks a final,
    /// complete body. Read failures are the only error.
    pub fn handle(
        &mut self,
        body: &mut dyn Read,
        end_of_stream: bool,
        request_model: &str,
    ) -> Result<ResponseBodyOutput> {
        let mut raw = Vec::new();
        body.read_to_end(&mut raw).map_err(AppError::ResponseRead)?;

        if !end_of_stream {
            return Ok(self.stream_chunk(raw, request_model));
        }

        let output = self.final_body(raw, request_model);
        self.accumulator.reset();
        Ok(output)
    }

    fn stream_chunk(&mut self, raw: Vec<u8>, request_model: &str) -> ResponseBodyOutput {
        let token_usage = self.accumulator.consume(&raw);
        let response_model = match self.accumulator.model() {
            Some(model) if self.prefer_backend_model => model.to_string(),
            _ => request_model.to_string(),
        };

        ResponseBodyOutput {
            header_mutation: None,
            body_mutation: Some(BodyMutation::Body(raw.into())),
            token_usage,
            response_model,
        }
    }

    fn final_body(&self, raw: Vec<u8>, request_model: &str) -> ResponseBodyOutput {
        let response = match MessagesResponse::from_slice(&raw) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    body_len = raw.len(),
                    "Response body is not a Messages response, passing through"
                );
                return ResponseBodyOutput {
                    header_mutation: None,
                    body_mutation: Some(BodyMutation::Body(raw.into())),
                    token_usage: LLMTokenUsage::default(),
                    response_model: request_model.to_string(),
                };
            }
        };

        let mut header_mutation = HeaderMutation::new();
        set_content_length(&mut header_mutation, &raw);

        let response_model = if self.prefer_backend_model && !response.model.is_empty() {
            response.model.clone()
        } else {
            request_model.to_string()
        };

        ResponseBodyOutput {
            header_mutation: Some(header_mutation),
            body_mutation: Some(BodyMutation::Body(raw.into())),
            token_usage: LLMTokenUsage::from(&response.usage),
            response_model,
        }
    }
}
