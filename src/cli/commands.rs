//! Command implementations for RizBot CLI.

use std::fs;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::EngineConfig;
use crate::corpus::IntentCorpus;
use crate::corpus::augment::{AugmentRule, PatternAugmenter};
use crate::engine::IntentEngine;
use crate::neural::ModelTrainer;

/// Probes used by `evaluate` when no file is given.
pub const DEFAULT_PROBES: &[&str] = &[
    "Hello",
    "Bagaimana analisis vibrasi?",
    "MCSA motor rusak",
    "DGA transformer",
    "Maintenance recommendation",
    "Help me",
    "Bye",
];

/// Execute a CLI command.
pub fn execute_command(args: RizbotArgs) -> Result<()> {
    match &args.command {
        Command::Ask(ask_args) => ask(ask_args, &args),
        Command::Train(train_args) => train(train_args, &args),
        Command::Evaluate(evaluate_args) => evaluate(evaluate_args, &args),
        Command::Augment(augment_args) => augment(augment_args, &args),
    }
}

/// Load the configuration file, if any, and apply command line overrides.
pub fn engine_config(options: &EngineOptions) -> Result<EngineConfig> {
    let mut config = load_config(options.config.as_deref())?;

    if let Some(corpus) = &options.corpus {
        config.corpus_path = corpus.clone();
    }
    if let Some(strategy) = options.strategy {
        config.strategy = strategy;
    }
    if let Some(model_dir) = &options.model_dir {
        config.model_dir = model_dir.clone();
    }
    if let Some(stemmer) = options.stemmer {
        config.normalizer.stemmer = stemmer.into();
    }
    if let Some(threshold) = options.threshold {
        config.thresholds.set(config.strategy, threshold);
    }
    if options.seed.is_some() {
        config.seed = options.seed;
    }
    if options.fuzzy_cutoff.is_some() {
        config.fuzzy_cutoff = options.fuzzy_cutoff;
    }

    config.validate()?;
    Ok(config)
}

fn load_config(path: Option<&std::path::Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("Cannot load configuration '{}'", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

/// Build an engine, degrading to an empty corpus when it cannot be read.
fn build_engine(config: &EngineConfig, cli_args: &RizbotArgs) -> Result<IntentEngine> {
    let engine = IntentEngine::from_config(config)
        .with_context(|| format!("Cannot build {} engine", config.strategy))?;
    if let Some(error) = engine.corpus_error()
        && cli_args.verbosity() > 0
    {
        eprintln!("Warning: {error}; every question will get the fallback reply");
    }
    Ok(engine)
}

/// Answer one utterance.
fn ask(args: &AskArgs, cli_args: &RizbotArgs) -> Result<()> {
    let config = engine_config(&args.engine)?;
    let mut engine = build_engine(&config, cli_args)?;

    let reply = engine.get_response(&args.text)?;
    output_result(
        "Reply",
        &AskResult {
            input: args.text.clone(),
            strategy: config.strategy.to_string(),
            threshold: engine.threshold(),
            reply,
        },
        cli_args,
    )?;

    Ok(())
}

/// Train and save a neural model.
fn train(args: &TrainArgs, cli_args: &RizbotArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(corpus) = &args.corpus {
        config.corpus_path = corpus.clone();
    }
    if let Some(model_dir) = &args.model_dir {
        config.model_dir = model_dir.clone();
    }
    if let Some(epochs) = args.epochs {
        config.training.epochs = epochs;
    }
    if let Some(batch_size) = args.batch_size {
        config.training.batch_size = batch_size;
    }
    if args.seed.is_some() {
        config.training.seed = args.seed;
    }
    if let Some(stemmer) = args.stemmer {
        config.normalizer.stemmer = stemmer.into();
    }
    config.validate()?;

    let corpus = IntentCorpus::from_path(&config.corpus_path).with_context(|| {
        format!("Cannot load corpus '{}'", config.corpus_path.display())
    })?;

    if cli_args.verbosity() > 0 && matches!(cli_args.output_format, OutputFormat::Human) {
        println!(
            "Training on {} intents, {} patterns...",
            corpus.len(),
            corpus.pattern_count()
        );
    }

    let start_time = Instant::now();
    let trainer = ModelTrainer::new(config.training.clone()).with_normalizer(config.normalizer);
    let model = trainer.train(&corpus)?;
    model
        .save(&config.model_dir)
        .with_context(|| format!("Cannot save model to '{}'", config.model_dir.display()))?;
    let duration = start_time.elapsed();

    let history = model.history();
    output_result(
        "Model trained successfully",
        &TrainingResult {
            model_dir: config.model_dir.to_string_lossy().to_string(),
            labels: model.labels().to_vec(),
            vocabulary_size: model.vocabulary().len(),
            parameters: model.parameter_count(),
            epochs: history.map_or(0, |h| h.epochs()),
            final_loss: history.and_then(|h| h.final_loss()),
            final_accuracy: history.and_then(|h| h.final_accuracy()),
            duration_ms: duration.as_millis() as u64,
        },
        cli_args,
    )?;

    Ok(())
}

/// Answer every probe and print a table.
fn evaluate(args: &EvaluateArgs, cli_args: &RizbotArgs) -> Result<()> {
    let config = engine_config(&args.engine)?;
    let mut engine = build_engine(&config, cli_args)?;

    let probes: Vec<String> = match &args.probes {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Cannot read probes '{}'", path.display()))?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        None => DEFAULT_PROBES.iter().map(|probe| probe.to_string()).collect(),
    };

    let replies = engine.evaluate(&probes)?;
    let rows = probes
        .into_iter()
        .zip(replies)
        .map(|(input, reply)| EvaluationRow {
            input,
            intent: reply.intent_tag,
            confidence: reply.confidence,
            response: reply.response,
        })
        .collect();

    output_result(
        "Evaluation",
        &EvaluationResult {
            strategy: config.strategy.to_string(),
            threshold: engine.threshold(),
            rows,
        },
        cli_args,
    )?;

    Ok(())
}

/// Write an augmented copy of a corpus.
fn augment(args: &AugmentArgs, cli_args: &RizbotArgs) -> Result<()> {
    let corpus = IntentCorpus::from_path(&args.input)
        .with_context(|| format!("Cannot load corpus '{}'", args.input.display()))?;

    let mut augmenter = if args.no_extra_intents {
        PatternAugmenter::new(AugmentRule::defaults(), args.seed)
    } else {
        PatternAugmenter::with_defaults(args.seed)
    };
    let augmented = augmenter.augment(&corpus)?;

    if let Some(parent) = args.output.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    augmented
        .save(&args.output)
        .with_context(|| format!("Cannot write corpus '{}'", args.output.display()))?;

    output_result(
        "Corpus augmented successfully",
        &AugmentResult {
            input: args.input.to_string_lossy().to_string(),
            output: args.output.to_string_lossy().to_string(),
            intents_before: corpus.len(),
            intents_after: augmented.len(),
            patterns_before: corpus.pattern_count(),
            patterns_after: augmented.pattern_count(),
        },
        cli_args,
    )?;

    Ok(())
}
