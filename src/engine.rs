//! Composition root: text in, reply out.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::analysis::TextNormalizer;
use crate::config::{DEFAULT_EMPTY_INPUT_RESPONSE, DEFAULT_FALLBACK_RESPONSE, EngineConfig};
use crate::corpus::{Intent, IntentCorpus};
use crate::error::{IntentError, Result};
use crate::neural::{ModelSlot, TrainedModel};
use crate::resolver::{IntentResolver, Outcome};
use crate::response::ResponseSelector;
use crate::scoring::{
    FuzzyMatcher, IntentScorer, LexicalScorer, NeuralScorer, StrategyKind, VectorSpaceScorer,
};

/// Answer to one utterance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub response: String,
    /// Tag of the matched intent, `None` for fallbacks.
    pub intent_tag: Option<String>,
    pub confidence: f64,
    pub outcome: Outcome,
}

/// Resolves utterances and answers with canned responses.
///
/// # Examples
///
/// ```
/// use rizbot::config::EngineConfig;
/// use rizbot::corpus::{Intent, IntentCorpus};
/// use rizbot::engine::IntentEngine;
///
/// let corpus = IntentCorpus::new(vec![
///     Intent::new("greeting", &["hello", "hi"], &["Hi there!"]),
/// ])
/// .unwrap();
///
/// let mut engine = IntentEngine::from_corpus(&EngineConfig::default(), corpus).unwrap();
/// let reply = engine.get_response("hello").unwrap();
/// assert_eq!(reply.response, "Hi there!");
/// assert_eq!(reply.intent_tag.as_deref(), Some("greeting"));
/// ```
#[derive(Debug)]
pub struct IntentEngine {
    resolver: IntentResolver,
    selector: ResponseSelector,
    threshold: f64,
    fallback_response: String,
    empty_input_response: String,
    fuzzy: Option<FuzzyMatcher>,
    corpus_error: Option<IntentError>,
}

impl IntentEngine {
    /// Engine using the resolver's default threshold and the default messages.
    pub fn new(resolver: IntentResolver, selector: ResponseSelector) -> Self {
        let threshold = resolver.default_threshold();
        IntentEngine {
            resolver,
            selector,
            threshold,
            fallback_response: DEFAULT_FALLBACK_RESPONSE.to_string(),
            empty_input_response: DEFAULT_EMPTY_INPUT_RESPONSE.to_string(),
            fuzzy: None,
            corpus_error: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_fallback_response<S: Into<String>>(mut self, response: S) -> Self {
        self.fallback_response = response.into();
        self
    }

    pub fn with_empty_input_response<S: Into<String>>(mut self, response: S) -> Self {
        self.empty_input_response = response.into();
        self
    }

    /// Try a close match against the raw pattern text before falling back.
    pub fn with_fuzzy_cutoff(mut self, cutoff: f64) -> Result<Self> {
        self.fuzzy = Some(FuzzyMatcher::new(
            self.resolver.corpus(),
            self.resolver.normalizer(),
            cutoff,
        )?);
        Ok(self)
    }

    /// Load the configured corpus and build the configured strategy.
    ///
    /// An unreadable corpus degrades to an empty one; every utterance then
    /// gets the fallback reply and [`corpus_error`](Self::corpus_error)
    /// reports why.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let (corpus, error) = IntentCorpus::load_or_empty(&config.corpus_path);
        let mut engine = Self::from_corpus(config, corpus)?;
        engine.corpus_error = error;
        Ok(engine)
    }

    /// Build the configured strategy over an already loaded corpus.
    ///
    /// The neural strategy loads its model unit from `config.model_dir`.
    pub fn from_corpus(config: &EngineConfig, corpus: IntentCorpus) -> Result<Self> {
        match config.strategy {
            StrategyKind::Neural => {
                let model = TrainedModel::load(&config.model_dir)?;
                let slot = Arc::new(ModelSlot::new(model));
                Self::with_model_slot(config, corpus, slot)
            }
            strategy => {
                config.validate()?;
                let corpus = Arc::new(corpus);
                let normalizer = Arc::new(TextNormalizer::new(config.normalizer)?);
                let scorer: Box<dyn IntentScorer> = match strategy {
                    StrategyKind::VectorSpace => {
                        Box::new(VectorSpaceScorer::new(&corpus, &normalizer)?)
                    }
                    _ => Box::new(LexicalScorer::new(&corpus, &normalizer)?),
                };
                Self::assemble(config, corpus, normalizer, scorer)
            }
        }
    }

    /// Neural engine serving whatever model `slot` holds.
    ///
    /// Keep a clone of the slot to retrain while the engine keeps answering.
    pub fn with_model_slot(
        config: &EngineConfig,
        corpus: IntentCorpus,
        slot: Arc<ModelSlot>,
    ) -> Result<Self> {
        config.validate()?;
        if slot.normalizer() != config.normalizer {
            return Err(IntentError::incompatible(format!(
                "model was trained with {:?} but the engine normalizes with {:?}",
                slot.normalizer(),
                config.normalizer
            )));
        }

        let corpus = Arc::new(corpus);
        let normalizer = Arc::new(TextNormalizer::new(config.normalizer)?);
        let scorer = NeuralScorer::new(Arc::clone(&corpus), slot)
            .with_floor(config.training.classification_floor);
        Self::assemble(config, corpus, normalizer, Box::new(scorer))
    }

    fn assemble(
        config: &EngineConfig,
        corpus: Arc<IntentCorpus>,
        normalizer: Arc<TextNormalizer>,
        scorer: Box<dyn IntentScorer>,
    ) -> Result<Self> {
        info!(
            strategy = scorer.name(),
            intents = corpus.len(),
            threshold = config.threshold(),
            "engine ready"
        );
        let resolver = IntentResolver::new(corpus, normalizer, scorer);
        let engine = IntentEngine::new(resolver, ResponseSelector::new(config.seed))
            .with_threshold(config.threshold())
            .with_fallback_response(config.fallback())
            .with_empty_input_response(config.empty_input_response.clone());
        match config.fuzzy_cutoff {
            Some(cutoff) => engine.with_fuzzy_cutoff(cutoff),
            None => Ok(engine),
        }
    }

    pub fn resolver(&self) -> &IntentResolver {
        &self.resolver
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Why the configured corpus could not be loaded, when
    /// [`from_config`](Self::from_config) fell back to an empty one.
    pub fn corpus_error(&self) -> Option<&IntentError> {
        self.corpus_error.as_ref()
    }

    /// Answer one utterance.
    ///
    /// Unmatched and empty input get their fallback replies; only a matched
    /// intent without responses is an error.
    pub fn get_response(&mut self, text: &str) -> Result<Reply> {
        let result = self.resolver.resolve(text, self.threshold)?;

        let reply = match (result.outcome, result.intent) {
            (Outcome::Matched, Some(intent)) => Reply {
                response: self.selector.select(intent)?.to_string(),
                intent_tag: Some(intent.tag.clone()),
                confidence: result.confidence,
                outcome: Outcome::Matched,
            },
            (Outcome::EmptyInput, _) => Reply {
                response: self.empty_input_response.clone(),
                intent_tag: None,
                confidence: 0.0,
                outcome: Outcome::EmptyInput,
            },
            _ => match close_match(&self.resolver, self.fuzzy.as_ref(), text)? {
                Some((intent, similarity)) => Reply {
                    response: self.selector.select(intent)?.to_string(),
                    intent_tag: Some(intent.tag.clone()),
                    confidence: similarity,
                    outcome: Outcome::CloseMatch,
                },
                None => Reply {
                    response: self.fallback_response.clone(),
                    intent_tag: None,
                    confidence: 0.0,
                    outcome: Outcome::BelowThreshold,
                },
            },
        };
        Ok(reply)
    }

    /// Answer each probe in order.
    pub fn evaluate<I, S>(&mut self, probes: I) -> Result<Vec<Reply>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        probes
            .into_iter()
            .map(|probe| self.get_response(probe.as_ref()))
            .collect()
    }
}

fn close_match<'a>(
    resolver: &'a IntentResolver,
    matcher: Option<&FuzzyMatcher>,
    text: &str,
) -> Result<Option<(&'a Intent, f64)>> {
    let Some(matcher) = matcher else {
        return Ok(None);
    };
    let normalized = resolver.normalizer().normalize(text)?;
    Ok(matcher
        .closest(normalized.text())
        .and_then(|(position, similarity)| {
            resolver
                .corpus()
                .intents()
                .get(position)
                .map(|intent| (intent, similarity))
        }))
}
