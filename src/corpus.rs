//! The intent knowledge base.
//!
//! A corpus file is a JSON record:
//!
//! ```json
//! { "intents": [ { "tag": "greeting", "patterns": ["hello"], "responses": ["Hi!"] } ] }
//! ```
//!
//! Loading distinguishes a missing file ([`IntentError::CorpusNotFound`]) from
//! one that cannot be parsed or validated ([`IntentError::CorpusMalformed`]).
//! [`IntentCorpus::load_or_empty`] degrades either case to an empty corpus that
//! never matches, leaving the decision to abort to the caller.

pub mod augment;

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{IntentError, Result};

/// A labeled topic with example phrasings and candidate replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// Unique identifier.
    pub tag: String,
    /// Example phrasings used as matching targets.
    pub patterns: Vec<String>,
    /// Candidate replies.
    pub responses: Vec<String>,
}

impl Intent {
    pub fn new<S: Into<String>>(tag: S, patterns: &[&str], responses: &[&str]) -> Self {
        Intent {
            tag: tag.into(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            responses: responses.iter().map(|r| r.to_string()).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CorpusFile {
    intents: Vec<Intent>,
}

/// Ordered, validated, immutable collection of intents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentCorpus {
    intents: Vec<Intent>,
}

impl IntentCorpus {
    /// Validate and wrap a list of intents.
    ///
    /// Tags must be non-empty and unique. Intents without patterns or
    /// responses are accepted with a warning: the former can never match, the
    /// latter will fail loudly when matched.
    pub fn new(intents: Vec<Intent>) -> Result<Self> {
        let mut seen = HashSet::new();
        for intent in &intents {
            if intent.tag.trim().is_empty() {
                return Err(IntentError::malformed("intent with empty tag"));
            }
            if !seen.insert(intent.tag.as_str()) {
                return Err(IntentError::malformed(format!(
                    "duplicate intent tag '{}'",
                    intent.tag
                )));
            }
            if intent.patterns.is_empty() {
                warn!(tag = %intent.tag, "intent has no patterns and will never match");
            }
            if intent.responses.is_empty() {
                warn!(tag = %intent.tag, "intent has no responses");
            }
        }

        Ok(IntentCorpus { intents })
    }

    /// A corpus with no intents. Resolves nothing.
    pub fn empty() -> Self {
        IntentCorpus::default()
    }

    /// Parse a corpus from its JSON representation.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: CorpusFile =
            serde_json::from_str(json).map_err(|e| IntentError::malformed(e.to_string()))?;
        Self::new(file.intents)
    }

    /// Load a corpus file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => IntentError::CorpusNotFound {
                path: path.to_path_buf(),
            },
            io::ErrorKind::InvalidData => IntentError::malformed(format!(
                "{} is not valid UTF-8",
                path.display()
            )),
            _ => IntentError::Io(e),
        })?;

        let corpus = Self::from_json_str(&content)?;
        info!(
            path = %path.display(),
            intents = corpus.len(),
            patterns = corpus.pattern_count(),
            "loaded corpus"
        );
        Ok(corpus)
    }

    /// Load a corpus file, degrading to an empty corpus on failure.
    ///
    /// The error, if any, is returned alongside so the caller can report it or
    /// decide to abort.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> (Self, Option<IntentError>) {
        match Self::from_path(path.as_ref()) {
            Ok(corpus) => (corpus, None),
            Err(e) => {
                warn!(path = %path.as_ref().display(), error = %e, "falling back to empty corpus");
                (Self::empty(), Some(e))
            }
        }
    }

    /// Write the corpus as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = CorpusFile {
            intents: self.intents.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Intent> {
        self.intents.iter()
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Look up an intent by tag.
    pub fn get(&self, tag: &str) -> Option<&Intent> {
        self.intents.iter().find(|intent| intent.tag == tag)
    }

    /// Position of an intent by tag.
    pub fn position(&self, tag: &str) -> Option<usize> {
        self.intents.iter().position(|intent| intent.tag == tag)
    }

    /// Total number of patterns across all intents.
    pub fn pattern_count(&self) -> usize {
        self.intents.iter().map(|intent| intent.patterns.len()).sum()
    }

    /// Consume the corpus, returning its intents.
    pub fn into_intents(self) -> Vec<Intent> {
        self.intents
    }
}

impl<'a> IntoIterator for &'a IntentCorpus {
    type Item = &'a Intent;
    type IntoIter = std::slice::Iter<'a, Intent>;

    fn into_iter(self) -> Self::IntoIter {
        self.intents.iter()
    }
}
