//! Token usage extraction from Messages API SSE streams.
//!
//! Usage is split across `message_start` (input tokens, sometimes a first
//! output count) and one or more `message_delta` events (output increments).
//! [`StreamUsageAccumulator`] keeps the running counters for one stream.

use serde_json::{Map, Value};

use super::usage::{saturate, LLMTokenUsage};

/// SSE field prefix of event payload lines.
pub const DATA_PREFIX: &[u8] = b"data:";

/// Upper bound for a held partial line; longer fragments are dropped.
const MAX_PENDING_BYTES: usize = 256 * 1024;

/// Running usage counters for one logical response stream.
///
/// Chunks do not have to be aligned to SSE lines: an unterminated trailing
/// line that does not parse yet is held and completed by the next chunk.
#[derive(Debug, Clone, Default)]
pub struct StreamUsageAccumulator {
    usage: LLMTokenUsage,
    /// Set once `input_tokens` was taken from a `message_start`
    input_seen: bool,
    /// Model reported by `message_start`
    model: Option<String>,
    /// Unterminated tail of the previous chunk
    pending: Vec<u8>,
}

impl StreamUsageAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one received chunk and return the cumulative usage after it.
    pub fn consume(&mut self, chunk: &[u8]) -> LLMTokenUsage {
        let mut data = std::mem::take(&mut self.pending);
        data.extend_from_slice(chunk);

        let terminated = data.ends_with(b"\n");
        let mut lines: Vec<&[u8]> = data.split(|b| *b == b'\n').collect();
        let tail = if terminated { None } else { lines.pop() };

        for line in lines {
            self.process_line(line);
        }

        if let Some(tail) = tail {
            if !self.process_line(tail) && is_partial_data_line(tail) {
                if tail.len() <= MAX_PENDING_BYTES {
                    self.pending = tail.to_vec();
                } else {
                    tracing::debug!(len = tail.len(), "Dropping oversized partial SSE line");
                }
            }
        }

        self.usage
    }

    /// Cumulative usage so far.
    pub fn usage(&self) -> LLMTokenUsage {
        self.usage
    }

    /// Model named by the stream's `message_start`, if any.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Whether a partial line is waiting for the next chunk.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Forget everything; the next chunk starts a new stream.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns `true` when the line carried a JSON event object.
    fn process_line(&mut self, line: &[u8]) -> bool {
        let Ok(text) = std::str::from_utf8(line) else {
            return false;
        };
        let Some(payload) = text.trim().strip_prefix("data:") else {
            return false;
        };

        let event = match serde_json::from_str::<Value>(payload) {
            Ok(Value::Object(event)) => event,
            Ok(_) => return false,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unparseable SSE data line");
                return false;
            }
        };

        self.apply_event(&event);
        true
    }

    fn apply_event(&mut self, event: &Map<String, Value>) {
        match event.get("type").and_then(Value::as_str) {
            Some("message_start") => {
                let message = event.get("message").and_then(Value::as_object);

                if self.model.is_none() {
                    if let Some(model) = message
                        .and_then(|m| m.get("model"))
                        .and_then(Value::as_str)
                        .filter(|m| !m.is_empty())
                    {
                        self.model = Some(model.to_string());
                    }
                }

                if let Some(usage) = message
                    .and_then(|m| m.get("usage"))
                    .and_then(Value::as_object)
                {
                    if !self.input_seen {
                        if let Some(input) = token_count(usage.get("input_tokens")) {
                            self.usage.input_tokens = input;
                            self.usage.cached_input_tokens =
                                token_count(usage.get("cache_read_input_tokens")).unwrap_or(0);
                            self.input_seen = true;
                        }
                    }
                    // Some backends report the first output tokens up front.
                    if let Some(output) = token_count(usage.get("output_tokens")) {
                        if output > 0 {
                            self.usage.output_tokens = self.usage.output_tokens.saturating_add(output);
                        }
                    }
                }
            }
            Some("message_delta") => {
                if let Some(output) = event
                    .get("usage")
                    .and_then(Value::as_object)
                    .and_then(|usage| token_count(usage.get("output_tokens")))
                {
                    self.usage.output_tokens = self.usage.output_tokens.saturating_add(output);
                }
            }
            _ => {}
        }

        self.usage.refresh_total();
    }
}

/// Read a non-negative JSON number as a token count.
fn token_count(value: Option<&Value>) -> Option<u32> {
    let value = value?;
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
        .map(saturate)
}

/// Whether an unterminated tail may be the beginning of a `data:` line.
fn is_partial_data_line(tail: &[u8]) -> bool {
    let start = tail
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(tail.len());
    let tail = &tail[start..];
    !tail.is_empty() && (tail.starts_with(DATA_PREFIX) || DATA_PREFIX.starts_with(tail))
}

// ============================================================================
// Tests
// ============================================================================
