//! Text analysis for intent matching.
//!
//! Raw utterances and corpus patterns flow through the same pipeline so that
//! every scoring strategy sees identical terms:
//!
//! ```text
//! raw text → lowercase → collapse whitespace → Tokenizer → Filter* → NormalizedText
//! ```
//!
//! The [`TextNormalizer`](normalizer::TextNormalizer) owns that pipeline and is
//! the only entry point the scorers use.

pub mod analyzer;
pub mod normalizer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

pub use analyzer::{Analyzer, PipelineAnalyzer};
pub use normalizer::{NormalizedText, NormalizerConfig, StemmerKind, TextNormalizer, TokenizerKind};
pub use token::{Token, TokenStream};
