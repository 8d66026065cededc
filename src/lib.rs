//! # RizBot
//!
//! Intent classification and canned responses for predictive-maintenance
//! assistants.
//!
//! ## Features
//!
//! - Deterministic text normalization with optional stemming
//! - Three interchangeable scoring strategies: lexical overlap, TF-IDF cosine
//!   similarity and a trainable feed-forward classifier
//! - Strategy-scoped confidence thresholds with distinct fallback replies
//! - Versioned, checksummed model units that can be hot-swapped
//! - Offline corpus augmentation

pub mod analysis;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod features;
pub mod neural;
pub mod resolver;
pub mod response;
pub mod scoring;

pub mod prelude {
    pub use crate::analysis::{NormalizedText, NormalizerConfig, TextNormalizer};
    pub use crate::config::EngineConfig;
    pub use crate::corpus::{Intent, IntentCorpus};
    pub use crate::engine::{IntentEngine, Reply};
    pub use crate::error::{IntentError, Result};
    pub use crate::neural::{ModelSlot, ModelTrainer, TrainedModel, TrainingConfig};
    pub use crate::resolver::{IntentResolver, Outcome, ResolutionResult};
    pub use crate::response::ResponseSelector;
    pub use crate::scoring::{IntentScorer, StrategyKind};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
