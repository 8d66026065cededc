//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, RizbotArgs};
use crate::engine::Reply;
use crate::error::Result;

/// Longest response prefix shown in evaluation tables.
const RESPONSE_PREVIEW_CHARS: usize = 50;

/// Result types that know how to print themselves for humans.
pub trait HumanOutput {
    fn print_human(&self);
}

/// Result structure for a single utterance.
#[derive(Debug, Serialize)]
pub struct AskResult {
    pub input: String,
    pub strategy: String,
    pub threshold: f64,
    pub reply: Reply,
}

/// Result structure for a training run.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingResult {
    pub model_dir: String,
    pub labels: Vec<String>,
    pub vocabulary_size: usize,
    pub parameters: usize,
    pub epochs: usize,
    pub final_loss: Option<f32>,
    pub final_accuracy: Option<f32>,
    pub duration_ms: u64,
}

/// One evaluated probe.
#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluationRow {
    pub input: String,
    pub intent: Option<String>,
    pub confidence: f64,
    pub response: String,
}

/// Result structure for an evaluation run.
#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub strategy: String,
    pub threshold: f64,
    pub rows: Vec<EvaluationRow>,
}

/// Result structure for corpus augmentation.
#[derive(Debug, Serialize, Deserialize)]
pub struct AugmentResult {
    pub input: String,
    pub output: String,
    pub intents_before: usize,
    pub intents_after: usize,
    pub patterns_before: usize,
    pub patterns_after: usize,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize + HumanOutput>(
    message: &str,
    result: &T,
    args: &RizbotArgs,
) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 1 {
                println!("{message}");
                println!();
            }
            result.print_human();
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &RizbotArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}

/// Shorten `text` to `max_chars` characters, marking the cut with "...".
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

impl HumanOutput for AskResult {
    fn print_human(&self) {
        println!("{}", self.reply.response);
        if let Some(tag) = &self.reply.intent_tag {
            println!();
            println!(
                "intent: {tag}  confidence: {:.3}  strategy: {}",
                self.reply.confidence, self.strategy
            );
        }
    }
}

impl HumanOutput for TrainingResult {
    fn print_human(&self) {
        println!("Training Summary:");
        println!("═════════════════");
        println!("Model directory: {}", self.model_dir);
        println!("Labels: {} ({})", self.labels.len(), self.labels.join(", "));
        println!("Vocabulary size: {}", self.vocabulary_size);
        println!("Parameters: {}", self.parameters);
        println!("Epochs: {}", self.epochs);
        if let Some(loss) = self.final_loss {
            println!("Final loss: {loss:.4}");
        }
        if let Some(accuracy) = self.final_accuracy {
            println!("Final accuracy: {:.1}%", accuracy * 100.0);
        }
        println!("Duration: {}ms", self.duration_ms);
    }
}

impl HumanOutput for EvaluationResult {
    fn print_human(&self) {
        println!(
            "Strategy: {}  threshold: {:.2}",
            self.strategy, self.threshold
        );
        println!();
        println!(
            "{:<30} {:<20} {:<12} Response",
            "Input", "Intent", "Confidence"
        );
        println!("{}", "─".repeat(100));
        for row in &self.rows {
            println!(
                "{:<30} {:<20} {:<12.3} {}",
                truncate(&row.input, 28),
                row.intent.as_deref().unwrap_or("unknown"),
                row.confidence,
                truncate(&row.response, RESPONSE_PREVIEW_CHARS)
            );
        }
    }
}

impl HumanOutput for AugmentResult {
    fn print_human(&self) {
        println!("Augmented corpus written to {}", self.output);
        println!(
            "Intents: {} → {}",
            self.intents_before, self.intents_after
        );
        println!(
            "Patterns: {} → {}",
            self.patterns_before, self.patterns_after
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly", 7), "exactly");
        assert_eq!(truncate("abcdefgh", 3), "abc...");
        assert_eq!(truncate("f±fr sideband", 3), "f±f...");
    }

    #[test]
    fn test_evaluation_result_serializes() {
        let result = EvaluationResult {
            strategy: "lexical".to_string(),
            threshold: 0.3,
            rows: vec![EvaluationRow {
                input: "Hello".to_string(),
                intent: None,
                confidence: 0.0,
                response: "?".to_string(),
            }],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["rows"][0]["intent"], serde_json::Value::Null);
        assert_eq!(json["strategy"], "lexical");
    }
}
