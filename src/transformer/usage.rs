//! Token usage reported back to the calling filter.

use super::messages::MessagesUsage;

/// Token counts for one response (or one stream so far).
///
/// `cached_input_tokens` is part of `input_tokens` and is never added to
/// `total_tokens`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LLMTokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
    pub cached_input_tokens: u32,
}

impl LLMTokenUsage {
    /// Build usage from input/output/cached counts, deriving the total.
    pub fn new(input_tokens: u32, output_tokens: u32, cached_input_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens.saturating_add(output_tokens),
            cached_input_tokens,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Recompute `total_tokens` after a counter changed.
    pub(crate) fn refresh_total(&mut self) {
        self.total_tokens = self.input_tokens.saturating_add(self.output_tokens);
    }
}

impl From<&MessagesUsage> for LLMTokenUsage {
    fn from(usage: &MessagesUsage) -> Self {
        LLMTokenUsage::new(
            saturate(usage.input_tokens),
            saturate(usage.output_tokens),
            saturate(usage.cache_read_input_tokens.unwrap_or(0)),
        )
    }
}

/// Narrow a wire count to `u32`, clamping instead of wrapping.
pub(crate) fn saturate(count: u64) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_total_without_cached() {
        let usage = LLMTokenUsage::new(45, 28, 30);
        assert_eq!(usage.total_tokens, 73);
        assert_eq!(usage.cached_input_tokens, 30);
    }

    #[test]
    fn test_default_is_zero() {
        assert!(LLMTokenUsage::default().is_zero());
        assert!(!LLMTokenUsage::new(1, 0, 0).is_zero());
    }

    #[test]
    fn test_from_messages_usage() {
        let usage = MessagesUsage {
            input_tokens: 45,
            output_tokens: 28,
            cache_creation_input_tokens: Some(12),
            cache_read_input_tokens: Some(0),
        };
        assert_eq!(
            LLMTokenUsage::from(&usage),
            LLMTokenUsage {
                input_tokens: 45,
                output_tokens: 28,
                total_tokens: 73,
                cached_input_tokens: 0,
            }
        );
    }

    #[test]
    fn test_saturating_counts() {
        assert_eq!(saturate(u64::from(u32::MAX) + 10), u32::MAX);
        let usage = LLMTokenUsage::new(u32::MAX, 5, 0);
        assert_eq!(usage.total_tokens, u32::MAX);
    }
}
