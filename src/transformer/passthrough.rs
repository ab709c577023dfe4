//! Direct Anthropic backend.
//!
//! The backend speaks the Messages API natively, so the request is only
//! rewritten when the model must be overridden or the caller asks for a
//! re-encoded body. The client's path is never changed.

use std::collections::HashMap;
use std::io::Read;

use serde_json::Value;

use crate::core::config::BackendSchema;
use crate::core::Result;

use super::messages::{apply_model_name_override, MessagesRequest, ModelNameOverride, RequestModel};
use super::mutation::{build_body_mutations, BodyMutation, HeaderMutation};
use super::response::{MessagesResponseHandler, ResponseBodyOutput};
use super::MessagesTranslator;

/// Messages translator for the vendor's own API.
#[derive(Debug)]
pub struct AnthropicPassthroughTranslator {
    model_name_override: ModelNameOverride,
    request_model: RequestModel,
    response_handler: MessagesResponseHandler,
}

impl AnthropicPassthroughTranslator {
    pub fn new(model_name_override: impl Into<String>) -> Self {
        Self {
            model_name_override: model_name_override.into(),
            request_model: RequestModel::new(),
            // The native API reports the concrete model version it served.
            response_handler: MessagesResponseHandler::preferring_backend_model(),
        }
    }
}

impl Default for AnthropicPassthroughTranslator {
    fn default() -> Self {
        Self::new("")
    }
}

impl MessagesTranslator for AnthropicPassthroughTranslator {
    fn schema(&self) -> BackendSchema {
        BackendSchema::Anthropic
    }

    fn request_body(
        &mut self,
        _raw: &[u8],
        body: &MessagesRequest,
        force_body_mutation: bool,
    ) -> Result<(Option<HeaderMutation>, Option<BodyMutation>)> {
        self.request_model = apply_model_name_override(body.model(), &self.model_name_override);

        let mutated_body = if !self.model_name_override.is_empty() {
            let mut doc = body.to_map();
            doc.insert(
                "model".to_string(),
                Value::String(self.model_name_override.clone()),
            );
            tracing::debug!(
                original = %body.model(),
                model = %self.request_model,
                "Applied model name override"
            );
            serde_json::to_vec(&doc)?
        } else if force_body_mutation {
            serde_json::to_vec(body)?
        } else {
            return Ok((None, None));
        };

        let backend = self.schema();
        tracing::debug!(
            backend = %backend,
            model = %self.request_model,
            body_len = mutated_body.len(),
            "Rewrote passthrough Messages request"
        );

        let (header_mutation, body_mutation) = build_body_mutations(mutated_body);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformer::mutation::{CONTENT_LENGTH_HEADER, PATH_HEADER};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn request() -> MessagesRequest {
        MessagesRequest::try_from(json!({
            "model": "claude-3-opus-20240229",
            "max_tokens": 1024,
            "messages": [{"role": "user", "content": "Hello"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_no_override_no_mutation() {
        let mut translator = AnthropicPassthroughTranslator::default();
        let (headers, body) = translator.request_body(b"", &request(), false).unwrap();
        assert!(headers.is_none());
        assert!(body.is_none());
        assert_eq!(translator.request_model(), "claude-3-opus-20240229");
    }

    #[test]
    fn test_override_rewrites_model_in_place() {
        let mut translator = AnthropicPassthroughTranslator::new("claude-3-5-sonnet-latest");
        let (headers, body) = translator.request_body(b"", &request(), false).unwrap();

        let expected: &[u8] = br#"{"model":"claude-3-5-sonnet-latest","max_tokens":1024,"messages":[{"role":"user","content":"Hello"}]}"#;
        let headers = headers.unwrap();
        assert!(headers.get(PATH_HEADER).is_none());
        assert_eq!(
            headers.get(CONTENT_LENGTH_HEADER),
            Some(expected.len().to_string().as_str())
        );
        assert_eq!(body.unwrap().body(), expected);
        assert_eq!(translator.request_model(), "claude-3-5-sonnet-latest");
    }

    #[test]
    fn test_force_body_mutation_reencodes() {
        let mut translator = AnthropicPassthroughTranslator::default();
        let req = request();
        let (headers, body) = translator.request_body(b"ignored", &req, true).unwrap();

        let headers = headers.unwrap();
        assert_eq!(headers.set_headers.len(), 1);
        assert!(headers.get(PATH_HEADER).is_none());
        assert_eq!(body.unwrap().body(), serde_json::to_vec(&req).unwrap().as_slice());
    }

    #[test]
    fn test_response_model_prefers_backend() {
        let mut translator = AnthropicPassthroughTranslator::default();
        translator.request_body(b"", &request(), false).unwrap();

        let response = br#"{"model":"claude-3-opus-20240229-served","usage":{"input_tokens":1,"output_tokens":2}}"#;
        let out = translator
            .response_body(&HashMap::new(), &mut &response[..], true)
            .unwrap();
        assert_eq!(out.response_model, "claude-3-opus-20240229-served");

        let out = translator
            .response_body(&HashMap::new(), &mut &b"not json"[..], true)
            .unwrap();
        assert_eq!(out.response_model, "claude-3-opus-20240229");
    }
}
