//! Integration tests for streamed responses.
//!
//! Streamed chunks are passed through untouched while token usage is
//! accumulated across calls on the same translator.

use llm_proxy_translator::transformer::{
    AnthropicPassthroughTranslator, AwsAnthropicTranslator, GcpAnthropicTranslator,
    LLMTokenUsage, MessagesRequest, MessagesTranslator, ResponseBodyOutput,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;

// ============================================================================
// Test Utilities
// ============================================================================

const STREAM_EVENTS: [&str; 7] = [
    "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_bdrk_01\",\"type\":\"message\",\"role\":\"assistant\",\"model\":\"claude-3-sonnet-20240229\",\"content\":[],\"stop_reason\":null,\"usage\":{\"input_tokens\":50,\"output_tokens\":1}}}\n\n",
    "event: content_block_start\ndata: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}\n\n",
    "event: ping\ndata: {\"type\": \"ping\"}\n\n",
    "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hello\"}}\n\n",
    "event: content_block_stop\ndata: {\"type\":\"content_block_stop\",\"index\":0}\n\n",
    "event: message_delta\ndata: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\",\"stop_sequence\":null},\"usage\":{\"output_tokens\":83}}\n\n",
    "event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n",
];

fn streaming_request(model: &str) -> MessagesRequest {
    MessagesRequest::try_from(json!({
        "model": model,
        "max_tokens": 256,
        "stream": true,
        "messages": [{"role": "user", "content": "Hi"}]
    }))
    .unwrap()
}

fn feed(translator: &mut dyn MessagesTranslator, chunk: &[u8]) -> ResponseBodyOutput {
    let mut reader = chunk;
    translator
        .response_body(&HashMap::new(), &mut reader, false)
        .unwrap()
}

fn hosted_translators() -> Vec<Box<dyn MessagesTranslator>> {
    vec![
        Box::new(AwsAnthropicTranslator::new("bedrock-2023-05-31", "")),
        Box::new(GcpAnthropicTranslator::new("vertex-2023-10-16", "")),
    ]
}

// ============================================================================
// Accumulation
// ============================================================================

#[test]
fn test_usage_accumulates_across_chunks() {
    for mut translator in hosted_translators() {
        translator
            .request_body(b"", &streaming_request("claude-3-sonnet"), false)
            .unwrap();

        let mut last = LLMTokenUsage::default();
        for event in STREAM_EVENTS {
            let out = feed(translator.as_mut(), event.as_bytes());

            assert!(out.header_mutation.is_none());
            assert_eq!(out.body_mutation.unwrap().body(), event.as_bytes());
            assert_eq!(out.response_model, "claude-3-sonnet");
            assert!(out.token_usage.total_tokens >= last.total_tokens);
            last = out.token_usage;
        }

        assert_eq!(
            last,
            LLMTokenUsage {
                input_tokens: 50,
                output_tokens: 84,
                total_tokens: 134,
                cached_input_tokens: 0,
            }
        );
    }
}

#[test]
fn test_message_stop_keeps_running_totals() {
    let mut translator = AwsAnthropicTranslator::new("bedrock-2023-05-31", "");
    feed(&mut translator, STREAM_EVENTS[0].as_bytes());
    let after_delta = feed(&mut translator, STREAM_EVENTS[5].as_bytes());
    let after_stop = feed(&mut translator, STREAM_EVENTS[6].as_bytes());

    assert_eq!(after_delta.token_usage, after_stop.token_usage);
    assert_eq!(after_stop.token_usage.total_tokens, 134);
}

#[test]
fn test_whole_stream_in_one_chunk() {
    let mut translator = GcpAnthropicTranslator::new("vertex-2023-10-16", "");
    let stream = STREAM_EVENTS.concat();
    let out = feed(&mut translator, stream.as_bytes());
    assert_eq!(out.token_usage, LLMTokenUsage::new(50, 84, 0));
}

#[test]
fn test_unaligned_chunks() {
    let stream = STREAM_EVENTS.concat();
    let bytes = stream.as_bytes();

    for size in [1usize, 7, 33, 128] {
        let mut translator = AwsAnthropicTranslator::new("bedrock-2023-05-31", "");
        let mut last = LLMTokenUsage::default();
        let mut passed_through = Vec::new();

        for chunk in bytes.chunks(size) {
            let out = feed(&mut translator, chunk);
            passed_through.extend_from_slice(out.body_mutation.unwrap().body());
            last = out.token_usage;
        }

        assert_eq!(last, LLMTokenUsage::new(50, 84, 0), "chunk size {}", size);
        assert_eq!(passed_through, bytes, "chunk size {}", size);
    }
}

#[test]
fn test_malformed_chunks_do_not_abort_stream() {
    let mut translator = AwsAnthropicTranslator::new("bedrock-2023-05-31", "");
    feed(&mut translator, STREAM_EVENTS[0].as_bytes());
    feed(&mut translator, b"data: {broken json\n\n");
    feed(&mut translator, b": comment line\n\ndata: [DONE]\n\n");
    let out = feed(&mut translator, STREAM_EVENTS[5].as_bytes());
    assert_eq!(out.token_usage.total_tokens, 134);
}

#[test]
fn test_cached_input_tokens_from_stream() {
    let mut translator = GcpAnthropicTranslator::new("vertex-2023-10-16", "");
    let start = "data: {\"type\":\"message_start\",\"message\":{\"usage\":{\"input_tokens\":120,\"cache_read_input_tokens\":100,\"output_tokens\":0}}}\n\n";
    feed(&mut translator, start.as_bytes());
    let out = feed(&mut translator, STREAM_EVENTS[5].as_bytes());

    assert_eq!(
        out.token_usage,
        LLMTokenUsage {
            input_tokens: 120,
            output_tokens: 83,
            total_tokens: 203,
            cached_input_tokens: 100,
        }
    );
}

// ============================================================================
// End of Stream
// ============================================================================

#[test]
fn test_end_of_stream_resets_state() {
    let mut translator = AwsAnthropicTranslator::new("bedrock-2023-05-31", "");
    for event in STREAM_EVENTS {
        feed(&mut translator, event.as_bytes());
    }

    let out = translator
        .response_body(&HashMap::new(), &mut &b""[..], true)
        .unwrap();
    assert!(out.header_mutation.is_none());
    assert!(out.token_usage.is_zero());

    // A new stream on the same instance starts from zero
    let out = feed(&mut translator, STREAM_EVENTS[5].as_bytes());
    assert_eq!(out.token_usage, LLMTokenUsage::new(0, 83, 0));
}

// ============================================================================
// Response Model
// ============================================================================

#[test]
fn test_passthrough_reports_streamed_model() {
    let mut translator = AnthropicPassthroughTranslator::new("");
    translator
        .request_body(b"", &streaming_request("claude-3-sonnet"), false)
        .unwrap();

    let out = feed(&mut translator, STREAM_EVENTS[0].as_bytes());
    assert_eq!(out.response_model, "claude-3-sonnet-20240229");
}

#[test]
fn test_hosted_reports_request_model() {
    let mut translator = GcpAnthropicTranslator::new("vertex-2023-10-16", "claude-pinned@001");
    translator
        .request_body(b"", &streaming_request("claude-3-sonnet"), false)
        .unwrap();

    let out = feed(&mut translator, STREAM_EVENTS[0].as_bytes());
    assert_eq!(out.response_model, "claude-pinned@001");
}
