//! Token type flowing through the analysis pipeline.
//!
//! # Examples
//!
//! ```
//! use rizbot::analysis::token::Token;
//!
//! let token = Token::with_offsets("bearing", 4, 11);
//! assert_eq!(token.text, "bearing");
//! assert_eq!(token.end_offset - token.start_offset, 7);
//! ```

use serde::{Deserialize, Serialize};

/// A single unit of text after tokenization.
///
/// `text` may be rewritten by filters (stemming), while the byte offsets keep
/// pointing at the surface form in the tokenized input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The (possibly filtered) term text.
    pub text: String,

    /// Byte offset where the surface form starts in the tokenized text.
    pub start_offset: usize,

    /// Byte offset where the surface form ends in the tokenized text.
    pub end_offset: usize,
}

impl Token {
    /// Create a token spanning `start..end` of the tokenized text.
    pub fn with_offsets<S: Into<String>>(
        text: S,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Token {
            text: text.into(),
            start_offset,
            end_offset,
        }
    }

    /// Replace the term text, keeping the offsets.
    pub fn with_text<S: Into<String>>(self, text: S) -> Self {
        Token {
            text: text.into(),
            ..self
        }
    }

    /// Get the surface form this token was cut from.
    ///
    /// Returns `None` when the offsets do not describe a valid slice of `source`.
    pub fn surface<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start_offset..self.end_offset)
    }

    /// Check if the term text is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A stream of tokens produced by a tokenizer and transformed by filters.
pub type TokenStream = Box<dyn Iterator<Item = Token> + Send>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_text_keeps_offsets() {
        let token = Token::with_offsets("running", 10, 17).with_text("run");
        assert_eq!(token.text, "run");
        assert_eq!(token.start_offset, 10);
        assert_eq!(token.end_offset, 17);
    }

    #[test]
    fn test_surface() {
        let source = "the running motor";
        let token = Token::with_offsets("run", 4, 11);
        assert_eq!(token.surface(source), Some("running"));

        let bogus = Token::with_offsets("x", 40, 50);
        assert_eq!(bogus.surface(source), None);
    }
}
