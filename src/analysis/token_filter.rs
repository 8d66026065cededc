//! Token filters applied after tokenization.
//!
//! Filters receive a token stream and produce a new one. The normalizer runs
//! them in order after the tokenizer:
//!
//! ```text
//! Tokenizer → StemFilter → terms
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for filters that transform token streams.
pub trait Filter: Send + Sync {
    /// Apply this filter to a token stream.
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Get the name of this filter (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod stem;

pub use stem::{PorterStemmer, SimpleStemmer, StemFilter, Stemmer};
