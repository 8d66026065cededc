//! Command line argument parsing for RizBot CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::analysis::StemmerKind;
use crate::scoring::StrategyKind;

/// RizBot - intent classification and canned responses for predictive maintenance
#[derive(Parser, Debug, Clone)]
#[command(name = "rizbot")]
#[command(about = "Intent classification and canned responses for predictive maintenance")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "RizBot Contributors")]
#[command(long_about = None)]
pub struct RizbotArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl RizbotArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Answer a single utterance
    Ask(AskArgs),

    /// Train a neural model and save it
    Train(TrainArgs),

    /// Answer a list of probe utterances
    Evaluate(EvaluateArgs),

    /// Generate synthetic patterns and write a new corpus
    Augment(AugmentArgs),
}

/// Options shared by every command that builds an engine
#[derive(clap::Args, Debug, Clone, Default)]
pub struct EngineOptions {
    /// Engine configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE", env = "RIZBOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Corpus file (JSON)
    #[arg(long, value_name = "CORPUS_FILE")]
    pub corpus: Option<PathBuf>,

    /// Scoring strategy (lexical, vector_space, neural)
    #[arg(short, long)]
    pub strategy: Option<StrategyKind>,

    /// Model directory used by the neural strategy
    #[arg(long, value_name = "MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Acceptance threshold for the selected strategy
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Stemmer applied to every term
    #[arg(long)]
    pub stemmer: Option<StemmerArg>,

    /// Seed for reproducible response selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Try a close spelling match (similarity in [0, 1]) before falling back
    #[arg(long, value_name = "CUTOFF")]
    pub fuzzy_cutoff: Option<f64>,
}

/// Arguments for answering one utterance
#[derive(Parser, Debug, Clone)]
pub struct AskArgs {
    #[command(flatten)]
    pub engine: EngineOptions,

    /// Utterance to resolve
    #[arg(value_name = "TEXT")]
    pub text: String,
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Engine configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE", env = "RIZBOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Corpus file (JSON)
    #[arg(long, value_name = "CORPUS_FILE")]
    pub corpus: Option<PathBuf>,

    /// Where to save the model unit
    #[arg(long, value_name = "MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Number of passes over the patterns
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Patterns per gradient step
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Seed for initialization, shuffling and dropout
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stemmer applied to every term
    #[arg(long)]
    pub stemmer: Option<StemmerArg>,
}

/// Arguments for evaluation
#[derive(Parser, Debug, Clone)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub engine: EngineOptions,

    /// File with one probe utterance per line (default: built-in probes)
    #[arg(short, long, value_name = "PROBES_FILE")]
    pub probes: Option<PathBuf>,
}

/// Arguments for corpus augmentation
#[derive(Parser, Debug, Clone)]
pub struct AugmentArgs {
    /// Corpus to augment
    #[arg(short, long, default_value = "data/intents.json")]
    pub input: PathBuf,

    /// Where to write the augmented corpus
    #[arg(short, long, default_value = "data/enhanced_intents.json")]
    pub output: PathBuf,

    /// Seed for template and term selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Don't append the diagnostic intents
    #[arg(long)]
    pub no_extra_intents: bool,
}

/// Stemmer choices
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StemmerArg {
    None,
    Porter,
    Simple,
}

impl From<StemmerArg> for StemmerKind {
    fn from(arg: StemmerArg) -> Self {
        match arg {
            StemmerArg::None => StemmerKind::None,
            StemmerArg::Porter => StemmerKind::Porter,
            StemmerArg::Simple => StemmerKind::Simple,
        }
    }
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_command() {
        let args = RizbotArgs::try_parse_from([
            "rizbot",
            "ask",
            "apa itu dga?",
            "--strategy",
            "vector_space",
            "--threshold",
            "0.4",
            "--seed",
            "7",
        ])
        .unwrap();

        if let Command::Ask(ask_args) = args.command {
            assert_eq!(ask_args.text, "apa itu dga?");
            assert_eq!(ask_args.engine.strategy, Some(StrategyKind::VectorSpace));
            assert_eq!(ask_args.engine.threshold, Some(0.4));
            assert_eq!(ask_args.engine.seed, Some(7));
        } else {
            panic!("Expected Ask command");
        }
    }

    #[test]
    fn test_train_command() {
        let args = RizbotArgs::try_parse_from([
            "rizbot",
            "train",
            "--corpus",
            "intents.json",
            "--model-dir",
            "/tmp/model",
            "--epochs",
            "300",
            "--batch-size",
            "8",
            "--stemmer",
            "porter",
        ])
        .unwrap();

        if let Command::Train(train_args) = args.command {
            assert_eq!(train_args.corpus, Some(PathBuf::from("intents.json")));
            assert_eq!(train_args.model_dir, Some(PathBuf::from("/tmp/model")));
            assert_eq!(train_args.epochs, Some(300));
            assert_eq!(train_args.batch_size, Some(8));
            assert_eq!(train_args.stemmer, Some(StemmerArg::Porter));
        } else {
            panic!("Expected Train command");
        }
    }

    #[test]
    fn test_augment_defaults() {
        let args = RizbotArgs::try_parse_from(["rizbot", "augment", "--seed", "1"]).unwrap();

        if let Command::Augment(augment_args) = args.command {
            assert_eq!(augment_args.input, PathBuf::from("data/intents.json"));
            assert_eq!(augment_args.output, PathBuf::from("data/enhanced_intents.json"));
            assert!(!augment_args.no_extra_intents);
        } else {
            panic!("Expected Augment command");
        }
    }

    #[test]
    fn test_verbosity_levels() {
        // Default verbosity
        let args = RizbotArgs::try_parse_from(["rizbot", "evaluate"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        // Multiple verbose flags
        let args = RizbotArgs::try_parse_from(["rizbot", "-vv", "evaluate"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        // Quiet flag
        let args = RizbotArgs::try_parse_from(["rizbot", "--quiet", "evaluate"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args = RizbotArgs::try_parse_from(["rizbot", "--format", "json", "evaluate"]).unwrap();
        assert!(matches!(args.output_format, OutputFormat::Json));
    }

    #[test]
    fn test_invalid_strategy() {
        let result = RizbotArgs::try_parse_from(["rizbot", "ask", "hi", "--strategy", "bm25"]);
        assert!(result.is_err());
    }
}
