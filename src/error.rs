//! Error types for the RizBot library.
//!
//! All fallible operations return [`IntentError`] through the crate-wide
//! [`Result`] alias. Two situations are deliberately *not* errors: an input
//! with no resolvable tokens and an input whose best score falls below the
//! threshold. Both are ordinary resolution outcomes (see
//! [`Outcome`](crate::resolver::Outcome)) and always produce a fallback reply.
//!
//! # Examples
//!
//! ```
//! use rizbot::error::{IntentError, Result};
//!
//! fn check_epochs(epochs: usize) -> Result<()> {
//!     if epochs == 0 {
//!         return Err(IntentError::invalid_config("epochs must be positive"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_epochs(0).is_err());
//! ```

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The main error type for RizBot operations.
#[derive(Error, Debug)]
pub enum IntentError {
    /// The corpus file does not exist.
    #[error("Corpus not found: {}", path.display())]
    CorpusNotFound { path: PathBuf },

    /// The corpus file exists but could not be parsed or failed validation.
    #[error("Corpus malformed: {0}")]
    CorpusMalformed(String),

    /// One or more components of a persisted model unit are absent.
    #[error("Model artifact missing: {}", path.display())]
    ModelArtifactMissing { path: PathBuf },

    /// A persisted model unit is present but structurally unusable.
    #[error("Model artifact incompatible: {0}")]
    ModelArtifactIncompatible(String),

    /// A matched intent has nothing to answer with.
    #[error("Intent '{tag}' was matched but has no responses")]
    EmptyResponseList { tag: String },

    /// Training could not run or diverged.
    #[error("Training error: {0}")]
    Training(String),

    /// Text analysis failures (tokenizer construction, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Configuration values out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O errors (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary weight encoding errors
    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),
}

/// Result type alias for operations that may fail with IntentError.
pub type Result<T> = std::result::Result<T, IntentError>;

impl IntentError {
    /// Create a new corpus-malformed error.
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        IntentError::CorpusMalformed(msg.into())
    }

    /// Create a new incompatible-artifact error.
    pub fn incompatible<S: Into<String>>(msg: S) -> Self {
        IntentError::ModelArtifactIncompatible(msg.into())
    }

    /// Create a new training error.
    pub fn training<S: Into<String>>(msg: S) -> Self {
        IntentError::Training(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        IntentError::Analysis(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        IntentError::InvalidConfig(msg.into())
    }

    /// Whether this error comes from loading the corpus.
    ///
    /// Corpus errors are recoverable: the engine degrades to an empty corpus.
    pub fn is_corpus_error(&self) -> bool {
        matches!(
            self,
            IntentError::CorpusNotFound { .. } | IntentError::CorpusMalformed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = IntentError::training("no patterns");
        assert_eq!(error.to_string(), "Training error: no patterns");

        let error = IntentError::malformed("missing field `tag`");
        assert_eq!(error.to_string(), "Corpus malformed: missing field `tag`");

        let error = IntentError::EmptyResponseList {
            tag: "greeting".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Intent 'greeting' was matched but has no responses"
        );
    }

    #[test]
    fn test_corpus_error_classification() {
        let not_found = IntentError::CorpusNotFound {
            path: PathBuf::from("intents.json"),
        };
        assert!(not_found.is_corpus_error());
        assert!(IntentError::malformed("bad").is_corpus_error());
        assert!(!IntentError::incompatible("dims").is_corpus_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = IntentError::from(io_error);

        match error {
            IntentError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
