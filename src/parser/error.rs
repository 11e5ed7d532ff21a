//! Error types for video link resolution.

use thiserror::Error;

/// Number of input characters echoed back in error messages.
const INPUT_PREVIEW_CHARS: usize = 80;

/// Fixed user-facing message shown when a pasted link is not recognised.
pub const NO_MATCH_MESSAGE: &str = "That doesn't look like a valid video link";

/// Errors that can occur while extracting a video id from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The input is not a supported link shape, or it carries no usable id.
    #[error("{NO_MATCH_MESSAGE}: '{input_preview}'\n  Suggestion: {suggestion}")]
    NoMatch {
        /// Truncated input for display.
        input_preview: String,
        /// How to fix the issue.
        suggestion: &'static str,
    },
}

impl ResolutionError {
    /// Creates a `NoMatch` error for the given raw input.
    #[must_use]
    pub fn no_match(input: &str) -> Self {
        Self::NoMatch {
            input_preview: input.chars().take(INPUT_PREVIEW_CHARS).collect(),
            suggestion: "Paste a single watch, embed, or short link",
        }
    }

    /// Returns the fixed message suitable for an inline validation label.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NoMatch { .. } => NO_MATCH_MESSAGE,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_message_contains_input_and_suggestion() {
        let err = ResolutionError::no_match("https://example.com/nothing");
        let msg = err.to_string();
        assert!(msg.contains("https://example.com/nothing"), "should echo input: {msg}");
        assert!(msg.contains("Suggestion"), "should have suggestion: {msg}");
    }

    #[test]
    fn test_no_match_truncates_long_input() {
        let long_input = "x".repeat(500);
        let ResolutionError::NoMatch { input_preview, .. } = ResolutionError::no_match(&long_input);
        assert_eq!(input_preview.chars().count(), INPUT_PREVIEW_CHARS);
    }

    #[test]
    fn test_user_message_is_fixed() {
        let a = ResolutionError::no_match("a");
        let b = ResolutionError::no_match("something else entirely");
        assert_eq!(a.user_message(), b.user_message());
        assert_eq!(a.user_message(), NO_MATCH_MESSAGE);
    }
}
