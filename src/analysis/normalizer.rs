//! Deterministic text canonicalization shared by every scoring strategy.
//!
//! # Examples
//!
//! ```
//! use rizbot::analysis::normalizer::{NormalizerConfig, StemmerKind, TextNormalizer};
//!
//! let normalizer = TextNormalizer::new(NormalizerConfig {
//!     stemmer: StemmerKind::Porter,
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let normalized = normalizer.normalize("  Bearing   FAILURES?  ").unwrap();
//! assert_eq!(normalized.text(), "bearing failures");
//! assert_eq!(normalized.terms(), ["bear", "failur"]);
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{Analyzer, PipelineAnalyzer};
use crate::analysis::token_filter::StemFilter;
use crate::analysis::tokenizer::{RegexTokenizer, Tokenizer, UnicodeWordTokenizer};
use crate::error::{IntentError, Result};

/// Which tokenizer splits the prepared text into words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerKind {
    /// `\w+` runs.
    #[default]
    Regex,
    /// UAX #29 word boundaries.
    UnicodeWord,
}

/// Optional stemming applied to each term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StemmerKind {
    #[default]
    None,
    Porter,
    Simple,
}

/// Serializable description of a normalizer.
///
/// Persisted with every trained model so inference reproduces the exact
/// vocabulary indices seen during training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub tokenizer: TokenizerKind,
    pub stemmer: StemmerKind,
}

/// Canonical form of a piece of text.
///
/// `text` is the lowercase surface words joined by single spaces; `terms` are
/// the same words after stemming. Normalizing `text` again yields an equal
/// value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedText {
    text: String,
    terms: Vec<String>,
}

impl NormalizedText {
    /// Surface words joined by single spaces.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Terms in order of appearance, duplicates kept.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Distinct terms.
    pub fn term_set(&self) -> HashSet<&str> {
        self.terms.iter().map(String::as_str).collect()
    }

    /// True when no resolvable token survived normalization.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }
}

/// Lowercases, collapses whitespace, tokenizes and optionally stems.
#[derive(Clone)]
pub struct TextNormalizer {
    config: NormalizerConfig,
    analyzer: PipelineAnalyzer,
    whitespace: Arc<Regex>,
}

impl std::fmt::Debug for TextNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextNormalizer")
            .field("config", &self.config)
            .field("analyzer", &self.analyzer)
            .finish()
    }
}

impl TextNormalizer {
    /// Build a normalizer from its configuration.
    pub fn new(config: NormalizerConfig) -> Result<Self> {
        let tokenizer: Arc<dyn Tokenizer> = match config.tokenizer {
            TokenizerKind::Regex => Arc::new(RegexTokenizer::new()?),
            TokenizerKind::UnicodeWord => Arc::new(UnicodeWordTokenizer::new()),
        };

        let mut analyzer = PipelineAnalyzer::new(tokenizer);
        match config.stemmer {
            StemmerKind::None => {}
            StemmerKind::Porter => analyzer = analyzer.add_filter(Arc::new(StemFilter::new())),
            StemmerKind::Simple => analyzer = analyzer.add_filter(Arc::new(StemFilter::simple())),
        }

        let whitespace = Regex::new(r"\s+")
            .map_err(|e| IntentError::analysis(format!("Invalid whitespace pattern: {e}")))?;

        Ok(TextNormalizer {
            config,
            analyzer,
            whitespace: Arc::new(whitespace),
        })
    }

    /// The configuration this normalizer was built from.
    pub fn config(&self) -> NormalizerConfig {
        self.config
    }

    /// Normalize a raw string.
    ///
    /// Empty or whitespace-only input yields an empty [`NormalizedText`].
    pub fn normalize(&self, raw: &str) -> Result<NormalizedText> {
        let lowered = raw.to_lowercase();
        let collapsed = self.whitespace.replace_all(&lowered, " ");
        let prepared = collapsed.trim();

        let mut surface = Vec::new();
        let mut terms = Vec::new();
        for token in self.analyzer.analyze(prepared)? {
            if token.is_empty() {
                continue;
            }
            let form = token
                .surface(prepared)
                .unwrap_or(token.text.as_str())
                .to_string();
            surface.push(form);
            terms.push(token.text);
        }

        Ok(NormalizedText {
            text: surface.join(" "),
            terms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> TextNormalizer {
        TextNormalizer::new(NormalizerConfig::default()).unwrap()
    }

    #[test]
    fn test_lowercase_collapse_trim() {
        let normalized = plain().normalize("  Apa   itu\tDGA?\n").unwrap();
        assert_eq!(normalized.text(), "apa itu dga");
        assert_eq!(normalized.terms(), ["apa", "itu", "dga"]);
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        let normalizer = plain();
        assert!(normalizer.normalize("").unwrap().is_empty());
        assert!(normalizer.normalize(" \t\n ").unwrap().is_empty());
        assert!(normalizer.normalize("?!").unwrap().is_empty());
    }

    #[test]
    fn test_idempotent_on_normalized_text() {
        for config in [
            NormalizerConfig::default(),
            NormalizerConfig {
                tokenizer: TokenizerKind::UnicodeWord,
                stemmer: StemmerKind::Porter,
            },
            NormalizerConfig {
                tokenizer: TokenizerKind::Regex,
                stemmer: StemmerKind::Simple,
            },
        ] {
            let normalizer = TextNormalizer::new(config).unwrap();
            for raw in [
                "Agreed, the MOTORS are   vibrating!",
                "Bagaimana cara analisis getaran?",
                "  ",
                "H2 & C2H2 levels (ppm)",
            ] {
                let once = normalizer.normalize(raw).unwrap();
                let twice = normalizer.normalize(once.text()).unwrap();
                assert_eq!(once, twice, "not idempotent for {raw:?} with {config:?}");
            }
        }
    }

    #[test]
    fn test_stemming_only_touches_terms() {
        let normalizer = TextNormalizer::new(NormalizerConfig {
            stemmer: StemmerKind::Porter,
            ..Default::default()
        })
        .unwrap();

        let normalized = normalizer.normalize("Running motors").unwrap();
        assert_eq!(normalized.text(), "running motors");
        assert_eq!(normalized.terms(), ["run", "motor"]);
    }

    #[test]
    fn test_term_set_collapses_duplicates() {
        let normalized = plain().normalize("gas gas oil").unwrap();
        assert_eq!(normalized.len(), 3);
        assert_eq!(normalized.term_set().len(), 2);
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: NormalizerConfig = serde_json::from_str(r#"{"stemmer":"porter"}"#).unwrap();
        assert_eq!(config.tokenizer, TokenizerKind::Regex);
        assert_eq!(config.stemmer, StemmerKind::Porter);
    }
}
