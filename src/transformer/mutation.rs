//! Header and body mutations handed back to the external-processing filter.
//!
//! The filter applies these verbatim: header mutations are set/remove lists,
//! body mutations always replace the whole buffered body.

use bytes::Bytes;

/// Pseudo-header carrying the request path.
pub const PATH_HEADER: &str = ":path";

/// Header rewritten whenever a body is replaced.
pub const CONTENT_LENGTH_HEADER: &str = "content-length";

/// One header to set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderValueOption {
    pub key: String,
    pub raw_value: Bytes,
}

impl HeaderValueOption {
    pub fn new(key: impl Into<String>, raw_value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            raw_value: raw_value.into(),
        }
    }

    /// Header value as text, if it is valid UTF-8.
    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.raw_value).ok()
    }
}

/// Header changes for one phase of the exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMutation {
    pub set_headers: Vec<HeaderValueOption>,
    pub remove_headers: Vec<String>,
}

impl HeaderMutation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing an earlier entry for the same key.
    pub fn set(&mut self, key: impl Into<String>, raw_value: impl Into<Bytes>) {
        let option = HeaderValueOption::new(key, raw_value);
        match self.set_headers.iter_mut().find(|h| h.key == option.key) {
            Some(existing) => *existing = option,
            None => self.set_headers.push(option),
        }
    }

    /// Value set for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.set_headers
            .iter()
            .find(|h| h.key == key)
            .and_then(HeaderValueOption::value_str)
    }
}

/// Body change for one phase of the exchange.
///
/// Translators only ever replace the whole buffered body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyMutation {
    /// Replace the body with these bytes.
    Body(Bytes),
}

impl BodyMutation {
    /// Replacement bytes.
    pub fn body(&self) -> &[u8] {
        match self {
            BodyMutation::Body(bytes) => bytes,
        }
    }
}

/// Set `content-length` to the decimal length of `body`.
pub fn set_content_length(mutation: &mut HeaderMutation, body: &[u8]) {
    mutation.set(CONTENT_LENGTH_HEADER, body.len().to_string());
}

/// Mutations for a rewritten body on an unchanged path: new `content-length`
/// and the full replacement body.
pub fn build_body_mutations(body: impl Into<Bytes>) -> (HeaderMutation, BodyMutation) {
    let body = body.into();
    let mut header_mutation = HeaderMutation::new();
    set_content_length(&mut header_mutation, &body);
    (header_mutation, BodyMutation::Body(body))
}

/// Mutations for a rewritten request: new `:path`, new `content-length`,
/// and the full replacement body.
pub fn build_request_mutations(path: &str, body: impl Into<Bytes>) -> (HeaderMutation, BodyMutation) {
    let body = body.into();
    let mut header_mutation = HeaderMutation::new();
    header_mutation.set(PATH_HEADER, path.to_string());
    set_content_length(&mut header_mutation, &body);
    (header_mutation, BodyMutation::Body(body))
}
