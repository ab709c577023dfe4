//! Canonical Messages API request and response shapes.
//!
//! The request is kept as an ordered JSON object so provider-specific optional
//! fields (`thinking`, `cache_control`, beta flags) survive translation without
//! the core having to know about them. Accessors return a zero value on type
//! mismatch instead of failing.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::core::error::Result;
use crate::core::AppError;

/// Model identifier resolved for one exchange.
pub type RequestModel = String;

/// Configured replacement for the request model; empty means "no override".
pub type ModelNameOverride = String;

/// Body key carrying the API version for hosted backends.
pub const ANTHROPIC_VERSION_KEY: &str = "anthropic_version";

/// Resolve the model used for an exchange: the override wins when non-empty.
pub fn apply_model_name_override(original: &str, model_name_override: &str) -> RequestModel {
    if model_name_override.is_empty() {
        original.to_string()
    } else {
        model_name_override.to_string()
    }
}

// ============================================================================
// Request
// ============================================================================

/// Messages API request as received from the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessagesRequest(Map<String, Value>);

impl MessagesRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Parse a request body. Anything other than a JSON object is rejected.
    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(raw)?;
        Self::try_from(value)
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Raw field access.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying ordered map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Copy the fields into a fresh, independently mutable document.
    pub fn to_map(&self) -> Map<String, Value> {
        self.0.clone()
    }

    /// Requested model, or `""` when absent or not a string.
    pub fn model(&self) -> &str {
        self.0.get("model").and_then(Value::as_str).unwrap_or("")
    }

    /// `true` only for the JSON boolean `true`.
    pub fn stream(&self) -> bool {
        is_streaming(&self.0)
    }

    pub fn messages(&self) -> Option<&Vec<Value>> {
        self.0.get("messages").and_then(Value::as_array)
    }

    /// System prompt; either a string or an array of text blocks.
    pub fn system(&self) -> Option<&Value> {
        self.0.get("system")
    }

    pub fn max_tokens(&self) -> Option<u64> {
        self.0.get("max_tokens").and_then(Value::as_u64)
    }

    pub fn temperature(&self) -> Option<f64> {
        self.0.get("temperature").and_then(Value::as_f64)
    }

    pub fn top_p(&self) -> Option<f64> {
        self.0.get("top_p").and_then(Value::as_f64)
    }

    pub fn top_k(&self) -> Option<u64> {
        self.0.get("top_k").and_then(Value::as_u64)
    }

    /// Stop sequences; non-string entries are ignored.
    pub fn stop_sequences(&self) -> Vec<&str> {
        self.0
            .get("stop_sequences")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn tools(&self) -> Option<&Vec<Value>> {
        self.0.get("tools").and_then(Value::as_array)
    }

    pub fn tool_choice(&self) -> Option<&Value> {
        self.0.get("tool_choice")
    }

    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.0.get("metadata").and_then(Value::as_object)
    }

    pub fn thinking(&self) -> Option<&Map<String, Value>> {
        self.0.get("thinking").and_then(Value::as_object)
    }

    pub fn cache_control(&self) -> Option<&Map<String, Value>> {
        self.0.get("cache_control").and_then(Value::as_object)
    }
}

impl TryFrom<Value> for MessagesRequest {
    type Error = AppError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(AppError::InvalidRequest(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

impl From<Map<String, Value>> for MessagesRequest {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Streaming flag of an already-copied request document.
pub(crate) fn is_streaming(doc: &Map<String, Value>) -> bool {
    matches!(doc.get("stream"), Some(Value::Bool(true)))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Response
// ============================================================================

/// Usage block of a final Messages API response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagesUsage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub input_tokens: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_creation_input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u64>,
}

/// The parts of a final Messages API response the translators read.
///
/// Content blocks are left as raw JSON; the body is never rewritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagesResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub model: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<Value>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub usage: MessagesUsage,
}

impl MessagesResponse {
    /// Parse a final response body. Fails on anything that is not a JSON
    /// object or whose known fields have the wrong type.
    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(raw)?;
        if !value.is_object() {
            return Err(AppError::InvalidRequest(format!(
                "expected a JSON object response, got {}",
                json_kind(&value)
            )));
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// `null` behaves like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
