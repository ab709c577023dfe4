//! GCP Vertex AI hosted Anthropic models.
//!
//! Vertex serves Claude through the publisher model endpoints
//! `rawPredict` and `streamRawPredict`. The project and location prefix is
//! added by the route, so only the publisher-relative suffix is produced here.

use crate::core::config::BackendSchema;

use super::hosted::{HostedAnthropicTranslator, HostedPath};

/// Publisher segment for Anthropic models on Vertex AI.
pub const GCP_MODEL_PUBLISHER_ANTHROPIC: &str = "anthropic";

/// `/publishers/anthropic/models/{id}:rawPredict` and `:streamRawPredict`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexPath;

impl HostedPath for VertexPath {
    const SCHEMA: BackendSchema = BackendSchema::GcpAnthropic;

    fn request_path(escaped_model: &str, stream: bool) -> String {
        let action = if stream { "streamRawPredict" } else { "rawPredict" };
        format!(
            "/publishers/{}/models/{}:{}",
            GCP_MODEL_PUBLISHER_ANTHROPIC, escaped_model, action
        )
    }
}

pub type GcpAnthropicTranslator = HostedAnthropicTranslator<VertexPath>;
