//! AWS Bedrock hosted Anthropic models.
//!
//! `InvokeModel` and `InvokeModelWithResponseStream` take the model id (or an
//! inference profile ARN) as a path segment.

use crate::core::config::BackendSchema;

use super::hosted::{HostedAnthropicTranslator, HostedPath};

/// `/model/{id}/invoke` and `/model/{id}/invoke-stream`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BedrockPath;

impl HostedPath for BedrockPath {
    const SCHEMA: BackendSchema = BackendSchema::AwsAnthropic;

    fn request_path(escaped_model: &str, stream: bool) -> String {
        if stream {
            format!("/model/{}/invoke-stream", escaped_model)
        } else {
            format!("/model/{}/invoke", escaped_model)
        }
    }
}

pub type AwsAnthropicTranslator = HostedAnthropicTranslator<BedrockPath>;
