//! Engine configuration.
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration:
//!
//! ```
//! use rizbot::config::EngineConfig;
//! use rizbot::scoring::StrategyKind;
//!
//! let config = EngineConfig::from_json_str(r#"{"strategy": "vector_space"}"#).unwrap();
//! assert_eq!(config.strategy, StrategyKind::VectorSpace);
//! assert_eq!(config.threshold(), 0.3);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::NormalizerConfig;
use crate::error::{IntentError, Result};
use crate::neural::TrainingConfig;
use crate::scoring::{LEXICAL_THRESHOLD, NEURAL_THRESHOLD, StrategyKind, VECTOR_SPACE_THRESHOLD};

/// Reply used when nothing scores above the threshold.
pub const DEFAULT_FALLBACK_RESPONSE: &str = "Maaf, saya belum memahami pertanyaan Anda. \
     Coba tanyakan tentang DGA, vibration analysis, MCSA, bearing failure, \
     atau ketik 'help' untuk bantuan.";

/// Reply used by the neural strategy when no label is probable enough.
pub const DEFAULT_NEURAL_FALLBACK_RESPONSE: &str =
    "Maaf, saya kurang yakin dengan maksud Anda. Bisa coba dengan kata yang berbeda?";

/// Reply used when the input holds no words.
pub const DEFAULT_EMPTY_INPUT_RESPONSE: &str = "Maaf, saya tidak mengerti. Bisa Anda ulangi?";

/// Acceptance threshold per strategy.
///
/// The strategies' confidence scales are not comparable, hence one value each.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub lexical: f64,
    pub vector_space: f64,
    pub neural: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        ThresholdConfig {
            lexical: LEXICAL_THRESHOLD,
            vector_space: VECTOR_SPACE_THRESHOLD,
            neural: NEURAL_THRESHOLD,
        }
    }
}

impl ThresholdConfig {
    pub fn for_strategy(&self, strategy: StrategyKind) -> f64 {
        match strategy {
            StrategyKind::Lexical => self.lexical,
            StrategyKind::VectorSpace => self.vector_space,
            StrategyKind::Neural => self.neural,
        }
    }

    pub fn set(&mut self, strategy: StrategyKind, threshold: f64) {
        match strategy {
            StrategyKind::Lexical => self.lexical = threshold,
            StrategyKind::VectorSpace => self.vector_space = threshold,
            StrategyKind::Neural => self.neural = threshold,
        }
    }
}

/// Strategy-specific unmatched replies, overriding
/// [`EngineConfig::fallback_response`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub lexical: Option<String>,
    pub vector_space: Option<String>,
    pub neural: Option<String>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        FallbackConfig {
            lexical: None,
            vector_space: None,
            neural: Some(DEFAULT_NEURAL_FALLBACK_RESPONSE.to_string()),
        }
    }
}

impl FallbackConfig {
    pub fn for_strategy(&self, strategy: StrategyKind) -> Option<&str> {
        match strategy {
            StrategyKind::Lexical => self.lexical.as_deref(),
            StrategyKind::VectorSpace => self.vector_space.as_deref(),
            StrategyKind::Neural => self.neural.as_deref(),
        }
    }
}

/// Everything needed to assemble an [`IntentEngine`](crate::engine::IntentEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Corpus JSON file.
    pub corpus_path: PathBuf,
    pub strategy: StrategyKind,
    /// Directory of the persisted model unit, used by the neural strategy.
    pub model_dir: PathBuf,
    pub thresholds: ThresholdConfig,
    pub normalizer: NormalizerConfig,
    pub training: TrainingConfig,
    pub fallback_response: String,
    pub fallbacks: FallbackConfig,
    pub empty_input_response: String,
    /// Minimum close-match similarity tried before falling back; `None`
    /// disables close matching.
    pub fuzzy_cutoff: Option<f64>,
    /// Seed for response selection; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            corpus_path: PathBuf::from("data/intents.json"),
            strategy: StrategyKind::default(),
            model_dir: PathBuf::from("models/classifier"),
            thresholds: ThresholdConfig::default(),
            normalizer: NormalizerConfig::default(),
            training: TrainingConfig::default(),
            fallback_response: DEFAULT_FALLBACK_RESPONSE.to_string(),
            fallbacks: FallbackConfig::default(),
            empty_input_response: DEFAULT_EMPTY_INPUT_RESPONSE.to_string(),
            fuzzy_cutoff: None,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| IntentError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Threshold of the configured strategy.
    pub fn threshold(&self) -> f64 {
        self.thresholds.for_strategy(self.strategy)
    }

    /// Unmatched reply of the configured strategy.
    pub fn fallback(&self) -> &str {
        self.fallbacks
            .for_strategy(self.strategy)
            .unwrap_or(&self.fallback_response)
    }

    pub fn validate(&self) -> Result<()> {
        for strategy in [StrategyKind::Lexical, StrategyKind::VectorSpace, StrategyKind::Neural] {
            let threshold = self.thresholds.for_strategy(strategy);
            if !(0.0..=1.0).contains(&threshold) {
                return Err(IntentError::invalid_config(format!(
                    "{strategy} threshold must be in [0, 1], got {threshold}"
                )));
            }
        }
        if self.fallback_response.trim().is_empty() {
            return Err(IntentError::invalid_config("fallback response must not be empty"));
        }
        for strategy in [StrategyKind::Lexical, StrategyKind::VectorSpace, StrategyKind::Neural] {
            if let Some(response) = self.fallbacks.for_strategy(strategy)
                && response.trim().is_empty()
            {
                return Err(IntentError::invalid_config(format!(
                    "{strategy} fallback response must not be empty"
                )));
            }
        }
        if let Some(cutoff) = self.fuzzy_cutoff
            && !(0.0..=1.0).contains(&cutoff)
        {
            return Err(IntentError::invalid_config(format!(
                "fuzzy cutoff must be in [0, 1], got {cutoff}"
            )));
        }
        if self.empty_input_response.trim().is_empty() {
            return Err(IntentError::invalid_config(
                "empty input response must not be empty",
            ));
        }
        self.training.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::StemmerKind;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.strategy, StrategyKind::Lexical);
        assert_eq!(config.threshold(), 0.3);
        assert_eq!(config.thresholds.neural, 0.5);
        assert_ne!(config.fallback_response, config.empty_input_response);
        assert_eq!(config.fuzzy_cutoff, None);
    }

    #[test]
    fn test_fallback_per_strategy() {
        let mut config = EngineConfig::default();
        assert_eq!(config.fallback(), DEFAULT_FALLBACK_RESPONSE);

        config.strategy = StrategyKind::Neural;
        assert_eq!(config.fallback(), DEFAULT_NEURAL_FALLBACK_RESPONSE);

        let config = EngineConfig::from_json_str(
            r#"{"strategy": "vector_space", "fallbacks": {"vector_space": "Tidak ditemukan."}}"#,
        )
        .unwrap();
        assert_eq!(config.fallback(), "Tidak ditemukan.");
        assert_eq!(
            config.fallbacks.neural.as_deref(),
            Some(DEFAULT_NEURAL_FALLBACK_RESPONSE)
        );
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json_str(
            r#"{
                "strategy": "neural",
                "thresholds": {"neural": 0.7},
                "normalizer": {"stemmer": "simple"},
                "training": {"epochs": 50}
            }"#,
        )
        .unwrap();

        assert_eq!(config.threshold(), 0.7);
        assert_eq!(config.thresholds.lexical, 0.3);
        assert_eq!(config.normalizer.stemmer, StemmerKind::Simple);
        assert_eq!(config.training.epochs, 50);
        assert_eq!(config.training.batch_size, 5);
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let mut config = EngineConfig::default();
        config.thresholds.set(StrategyKind::VectorSpace, 1.5);
        assert!(matches!(config.validate(), Err(IntentError::InvalidConfig(_))));

        let mut config = EngineConfig::default();
        config.fallback_response = "  ".to_string();
        assert!(config.validate().is_err());

        let result = EngineConfig::from_json_str(r#"{"training": {"dropout": -0.1}}"#);
        assert!(matches!(result, Err(IntentError::InvalidConfig(_))));

        let result = EngineConfig::from_json_str(r#"{"fuzzy_cutoff": 1.2}"#);
        assert!(matches!(result, Err(IntentError::InvalidConfig(_))));

        let result = EngineConfig::from_json_str(r#"{"fallbacks": {"lexical": " "}}"#);
        assert!(matches!(result, Err(IntentError::InvalidConfig(_))));

        let result = EngineConfig::from_json_str(r#"{"strategy": "bm25"}"#);
        assert!(matches!(result, Err(IntentError::InvalidConfig(_))));
    }
}
