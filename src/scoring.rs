//! Similarity scoring strategies.
//!
//! Every strategy implements [`IntentScorer`]: given normalized input it
//! returns confidences in `[0, 1]` that the
//! [`IntentResolver`](crate::resolver::IntentResolver) reduces to a single
//! intent. Per-pattern strategies report one score per corpus pattern, the
//! neural strategy reports one probability per intent.

pub mod fuzzy;
pub mod lexical;
pub mod neural;
pub mod tfidf;
pub mod vector_space;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::analysis::NormalizedText;
use crate::error::Result;

pub use fuzzy::{DEFAULT_FUZZY_CUTOFF, FuzzyMatcher, sequence_ratio};
pub use lexical::{LexicalScorer, lexical_similarity};
pub use neural::NeuralScorer;
pub use tfidf::TfIdfVectorizer;
pub use vector_space::VectorSpaceScorer;

/// Default acceptance threshold for [`LexicalScorer`].
pub const LEXICAL_THRESHOLD: f64 = 0.3;
/// Default acceptance threshold for [`VectorSpaceScorer`].
pub const VECTOR_SPACE_THRESHOLD: f64 = 0.3;
/// Default acceptance threshold for [`NeuralScorer`].
pub const NEURAL_THRESHOLD: f64 = 0.5;

/// Which scoring strategy an engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Jaccard overlap plus substring bonus.
    #[default]
    Lexical,
    /// TF-IDF cosine similarity.
    VectorSpace,
    /// Trained feed-forward classifier.
    Neural,
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Lexical => "lexical",
            StrategyKind::VectorSpace => "vector_space",
            StrategyKind::Neural => "neural",
        }
    }

    pub fn default_threshold(&self) -> f64 {
        match self {
            StrategyKind::Lexical => LEXICAL_THRESHOLD,
            StrategyKind::VectorSpace => VECTOR_SPACE_THRESHOLD,
            StrategyKind::Neural => NEURAL_THRESHOLD,
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "lexical" => Ok(StrategyKind::Lexical),
            "vector_space" | "tfidf" => Ok(StrategyKind::VectorSpace),
            "neural" => Ok(StrategyKind::Neural),
            other => Err(format!("unknown strategy '{other}'")),
        }
    }
}

/// Score of one corpus pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternScore {
    /// Index of the intent in the corpus.
    pub intent: usize,
    /// Index of the pattern within its intent.
    pub pattern: usize,
    pub score: f64,
}

/// Probability assigned to one corpus intent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntentScore {
    /// Index of the intent in the corpus.
    pub intent: usize,
    pub score: f64,
}

/// Raw strategy output, in tie-break order.
#[derive(Debug, Clone, PartialEq)]
pub enum Scores {
    /// One entry per pattern, in corpus order.
    Patterns(Vec<PatternScore>),
    /// One entry per surviving label, in label order.
    Distribution(Vec<IntentScore>),
}

impl Scores {
    /// `(intent, score)` candidates in the order ties are broken.
    pub fn candidates(&self) -> Box<dyn Iterator<Item = (usize, f64)> + '_> {
        match self {
            Scores::Patterns(scores) => Box::new(scores.iter().map(|s| (s.intent, s.score))),
            Scores::Distribution(scores) => Box::new(scores.iter().map(|s| (s.intent, s.score))),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Scores::Patterns(scores) => scores.len(),
            Scores::Distribution(scores) => scores.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A strategy mapping normalized text to intent confidences.
pub trait IntentScorer: Send + Sync + Debug {
    /// Score the input against the corpus the scorer was built for.
    ///
    /// Implementations may assume the input is non-empty.
    fn score(&self, input: &NormalizedText) -> Result<Scores>;

    /// The strategy's documented acceptance threshold.
    fn default_threshold(&self) -> f64;

    /// Get the name of this scorer for debugging and logging.
    fn name(&self) -> &str;
}
