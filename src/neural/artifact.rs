//! Persisted model units.
//!
//! A trained model is stored as a directory holding four components:
//!
//! | file | content |
//! |---|---|
//! | `classifier.bin` | network weights, bincode |
//! | `vocabulary.json` | sorted term list defining input indices |
//! | `labels.json` | sorted tag list defining output indices |
//! | `manifest.json` | format version, creation time, normalizer settings, dimensions and CRC32 of the other three |
//!
//! The unit is written to a temporary sibling directory and renamed into
//! place, and loading rejects any unit that is partial or inconsistent.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::NormalizerConfig;
use crate::error::{IntentError, Result};
use crate::features::Vocabulary;

use super::network::FeedForwardNetwork;
use super::trainer::TrainingHistory;

/// Version of the on-disk layout.
pub const FORMAT_VERSION: u32 = 1;

pub const CLASSIFIER_FILE: &str = "classifier.bin";
pub const VOCABULARY_FILE: &str = "vocabulary.json";
pub const LABELS_FILE: &str = "labels.json";
pub const MANIFEST_FILE: &str = "manifest.json";

const COMPONENTS: [&str; 4] = [CLASSIFIER_FILE, VOCABULARY_FILE, LABELS_FILE, MANIFEST_FILE];

/// CRC32 of each data component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksums {
    pub classifier: u32,
    pub vocabulary: u32,
    pub labels: u32,
}

/// Metadata describing a persisted unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub normalizer: NormalizerConfig,
    pub input_dim: usize,
    pub hidden_layers: Vec<usize>,
    pub output_dim: usize,
    pub checksums: Checksums,
}

/// Classifier weights bundled with the vocabulary, labels and normalizer
/// settings they were trained with.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    network: FeedForwardNetwork,
    vocabulary: Vocabulary,
    labels: Vec<String>,
    normalizer: NormalizerConfig,
    created_at: DateTime<Utc>,
    history: Option<TrainingHistory>,
}

impl TrainedModel {
    /// Bundle a network with its sidecars.
    ///
    /// The network input width must equal the vocabulary size and its output
    /// width the number of labels; labels must be distinct.
    pub fn new(
        network: FeedForwardNetwork,
        vocabulary: Vocabulary,
        labels: Vec<String>,
        normalizer: NormalizerConfig,
    ) -> Result<Self> {
        if network.input_dim() != vocabulary.len() {
            return Err(IntentError::incompatible(format!(
                "network expects {} features but vocabulary has {} terms",
                network.input_dim(),
                vocabulary.len()
            )));
        }
        if network.output_dim() != labels.len() {
            return Err(IntentError::incompatible(format!(
                "network emits {} classes but there are {} labels",
                network.output_dim(),
                labels.len()
            )));
        }
        let mut distinct = labels.clone();
        distinct.sort();
        distinct.dedup();
        if distinct.len() != labels.len() {
            return Err(IntentError::incompatible("duplicate labels"));
        }

        Ok(TrainedModel {
            network,
            vocabulary,
            labels,
            normalizer,
            created_at: Utc::now(),
            history: None,
        })
    }

    pub(crate) fn with_history(mut self, history: TrainingHistory) -> Self {
        self.history = Some(history);
        self
    }

    pub fn network(&self) -> &FeedForwardNetwork {
        &self.network
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn normalizer(&self) -> NormalizerConfig {
        self.normalizer
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Training metrics; only available on a freshly trained model.
    pub fn history(&self) -> Option<&TrainingHistory> {
        self.history.as_ref()
    }

    pub fn parameter_count(&self) -> usize {
        self.network.parameter_count()
    }

    /// Probability of every label for normalized terms.
    pub fn predict<S: AsRef<str>>(&self, terms: &[S]) -> Result<Array1<f32>> {
        let features = self.vocabulary.bag_of_words(terms);
        self.network.predict(&features.view())
    }

    /// Labels whose probability exceeds `floor`, as `(label index,
    /// probability)` in label order.
    pub fn classify<S: AsRef<str>>(&self, terms: &[S], floor: f64) -> Result<Vec<(usize, f64)>> {
        let probabilities = self.predict(terms)?;
        Ok(probabilities
            .iter()
            .enumerate()
            .map(|(index, &p)| (index, f64::from(p)))
            .filter(|&(_, p)| p > floor)
            .collect())
    }

    fn manifest(&self, checksums: Checksums) -> Manifest {
        Manifest {
            format_version: FORMAT_VERSION,
            created_at: self.created_at,
            normalizer: self.normalizer,
            input_dim: self.network.input_dim(),
            hidden_layers: hidden_widths(&self.network),
            output_dim: self.network.output_dim(),
            checksums,
        }
    }

    /// Write the unit to `dir`, replacing whatever is already there.
    ///
    /// If the new unit cannot be moved into place the previous entry is
    /// restored. Once it is in place the call succeeds even if the previous
    /// entry cannot be deleted.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        let name = dir
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                IntentError::invalid_config(format!("invalid model directory {}", dir.display()))
            })?;
        let parent = match dir.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let staging = parent.join(format!(".{name}.tmp-{}", Uuid::new_v4()));
        fs::create_dir(&staging)?;

        if let Err(e) = self.write_components(&staging) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        if fs::symlink_metadata(dir).is_ok() {
            let retired = parent.join(format!(".{name}.old-{}", Uuid::new_v4()));
            if let Err(e) = fs::rename(dir, &retired) {
                let _ = fs::remove_dir_all(&staging);
                return Err(e.into());
            }
            if let Err(e) = fs::rename(&staging, dir) {
                if let Err(restore) = fs::rename(&retired, dir) {
                    warn!(
                        path = %dir.display(),
                        retired = %retired.display(),
                        error = %restore,
                        "could not restore previous model"
                    );
                }
                let _ = fs::remove_dir_all(&staging);
                return Err(e.into());
            }
            if let Err(e) = remove_entry(&retired) {
                warn!(path = %retired.display(), error = %e, "could not remove previous model");
            }
        } else if let Err(e) = fs::rename(&staging, dir) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e.into());
        }

        info!(
            path = %dir.display(),
            labels = self.labels.len(),
            vocabulary = self.vocabulary.len(),
            "saved model"
        );
        Ok(())
    }

    fn write_components(&self, dir: &Path) -> Result<()> {
        let classifier = bincode::serialize(&self.network)?;
        let vocabulary = serde_json::to_vec(&self.vocabulary)?;
        let labels = serde_json::to_vec(&self.labels)?;

        let manifest = self.manifest(Checksums {
            classifier: crc32fast::hash(&classifier),
            vocabulary: crc32fast::hash(&vocabulary),
            labels: crc32fast::hash(&labels),
        });

        fs::write(dir.join(CLASSIFIER_FILE), classifier)?;
        fs::write(dir.join(VOCABULARY_FILE), vocabulary)?;
        fs::write(dir.join(LABELS_FILE), labels)?;
        fs::write(dir.join(MANIFEST_FILE), serde_json::to_vec_pretty(&manifest)?)?;
        Ok(())
    }

    /// Read and verify the unit stored in `dir`.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let missing: Vec<&str> = COMPONENTS
            .iter()
            .copied()
            .filter(|component| !dir.join(component).is_file())
            .collect();

        if missing.len() == COMPONENTS.len() {
            return Err(IntentError::ModelArtifactMissing {
                path: dir.to_path_buf(),
            });
        }
        if !missing.is_empty() {
            return Err(IntentError::incompatible(format!(
                "partial model unit in {}: missing {}",
                dir.display(),
                missing.join(", ")
            )));
        }

        let manifest: Manifest = serde_json::from_slice(&fs::read(dir.join(MANIFEST_FILE))?)
            .map_err(|e| IntentError::incompatible(format!("unreadable manifest: {e}")))?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(IntentError::incompatible(format!(
                "format version {} is not supported (expected {})",
                manifest.format_version, FORMAT_VERSION
            )));
        }

        let classifier = read_verified(dir, CLASSIFIER_FILE, manifest.checksums.classifier)?;
        let vocabulary = read_verified(dir, VOCABULARY_FILE, manifest.checksums.vocabulary)?;
        let labels = read_verified(dir, LABELS_FILE, manifest.checksums.labels)?;

        let network: FeedForwardNetwork = bincode::deserialize(&classifier)
            .map_err(|e| IntentError::incompatible(format!("unreadable classifier: {e}")))?;
        // Re-check layer wiring, deserialization bypasses the constructor.
        let network = FeedForwardNetwork::new(network.layers().to_vec())?;

        let vocabulary: Vocabulary = serde_json::from_slice(&vocabulary)
            .map_err(|e| IntentError::incompatible(format!("unreadable vocabulary: {e}")))?;
        if !vocabulary.is_canonical() {
            return Err(IntentError::incompatible("vocabulary is not sorted and distinct"));
        }

        let labels: Vec<String> = serde_json::from_slice(&labels)
            .map_err(|e| IntentError::incompatible(format!("unreadable labels: {e}")))?;

        if manifest.input_dim != vocabulary.len() || manifest.output_dim != labels.len() {
            return Err(IntentError::incompatible(format!(
                "manifest declares {}x{} but sidecars hold {} terms and {} labels",
                manifest.input_dim,
                manifest.output_dim,
                vocabulary.len(),
                labels.len()
            )));
        }

        let hidden = hidden_widths(&network);
        if manifest.hidden_layers != hidden {
            return Err(IntentError::incompatible(format!(
                "manifest declares hidden layers {:?} but classifier has {:?}",
                manifest.hidden_layers, hidden
            )));
        }

        let mut model = TrainedModel::new(network, vocabulary, labels, manifest.normalizer)?;
        model.created_at = manifest.created_at;

        info!(
            path = %dir.display(),
            labels = model.labels.len(),
            vocabulary = model.vocabulary.len(),
            "loaded model"
        );
        Ok(model)
    }
}

fn hidden_widths(network: &FeedForwardNetwork) -> Vec<usize> {
    let layers = network.layers();
    layers[..layers.len().saturating_sub(1)]
        .iter()
        .map(|layer| layer.outputs())
        .collect()
}

fn remove_entry(path: &Path) -> std::io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

fn read_verified(dir: &Path, component: &str, expected: u32) -> Result<Vec<u8>> {
    let bytes = fs::read(dir.join(component))?;
    let actual = crc32fast::hash(&bytes);
    if actual != expected {
        return Err(IntentError::incompatible(format!(
            "checksum mismatch for {component}: expected {expected:08x}, found {actual:08x}"
        )));
    }
    debug!(component, bytes = bytes.len(), "verified model component");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::network::DenseLayer;
    use ndarray::{Array1, Array2};
    use tempfile::TempDir;

    fn tiny_model() -> TrainedModel {
        let hidden = DenseLayer::new(Array2::from_elem((3, 2), 0.5), Array1::zeros(2)).unwrap();
        let output = DenseLayer::new(Array2::from_elem((2, 2), -0.25), Array1::ones(2)).unwrap();
        TrainedModel::new(
            FeedForwardNetwork::new(vec![hidden, output]).unwrap(),
            Vocabulary::build(["dga", "gas", "oil"]),
            vec!["dga".to_string(), "oil_analysis".to_string()],
            NormalizerConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_dimension_checks() {
        let network = tiny_model().network().clone();
        let result = TrainedModel::new(
            network.clone(),
            Vocabulary::build(["gas"]),
            vec!["a".to_string(), "b".to_string()],
            NormalizerConfig::default(),
        );
        assert!(matches!(result, Err(IntentError::ModelArtifactIncompatible(_))));

        let result = TrainedModel::new(
            network,
            Vocabulary::build(["dga", "gas", "oil"]),
            vec!["a".to_string(), "a".to_string()],
            NormalizerConfig::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model");

        let model = tiny_model();
        model.save(&path).unwrap();
        let loaded = TrainedModel::load(&path).unwrap();

        assert_eq!(loaded.network(), model.network());
        assert_eq!(loaded.vocabulary(), model.vocabulary());
        assert_eq!(loaded.labels(), model.labels());
        assert_eq!(loaded.created_at(), model.created_at());
        assert!(loaded.history().is_none());

        // overwrite leaves no staging directories behind
        model.save(&path).unwrap();
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_save_replaces_regular_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m");
        fs::write(&path, "not a model").unwrap();

        tiny_model().save(&path).unwrap();
        assert!(path.is_dir());
        assert_eq!(TrainedModel::load(&path).unwrap().labels(), tiny_model().labels());

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, ["m"]);
    }

    #[test]
    fn test_failed_save_leaves_previous_unit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model");
        tiny_model().save(&path).unwrap();

        // a path with no file name cannot hold a unit
        assert!(tiny_model().save(dir.path().join("..")).is_err());
        assert!(TrainedModel::load(&path).is_ok());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_classify_applies_floor() {
        let model = tiny_model();
        let all = model.classify(&["gas"], 0.0).unwrap();
        assert_eq!(all.len(), 2);
        assert!((all.iter().map(|(_, p)| p).sum::<f64>() - 1.0).abs() < 1e-5);

        let none = model.classify(&["gas"], 1.0).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_missing_unit() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            TrainedModel::load(dir.path().join("absent")),
            Err(IntentError::ModelArtifactMissing { .. })
        ));
    }

    #[test]
    fn test_partial_unit_is_incompatible() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model");
        tiny_model().save(&path).unwrap();
        fs::remove_file(path.join(LABELS_FILE)).unwrap();

        let error = TrainedModel::load(&path).unwrap_err();
        assert!(matches!(error, IntentError::ModelArtifactIncompatible(_)));
        assert!(error.to_string().contains(LABELS_FILE));
    }

    #[test]
    fn test_tampered_component_is_incompatible() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model");
        tiny_model().save(&path).unwrap();
        fs::write(path.join(VOCABULARY_FILE), r#"["dga","gas","oils"]"#).unwrap();

        let error = TrainedModel::load(&path).unwrap_err();
        assert!(error.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_manifest_layers_must_match_classifier() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model");
        tiny_model().save(&path).unwrap();

        let manifest_path = path.join(MANIFEST_FILE);
        let mut manifest: Manifest =
            serde_json::from_slice(&fs::read(&manifest_path).unwrap()).unwrap();
        assert_eq!(manifest.hidden_layers, [2]);
        manifest.hidden_layers = vec![64];
        fs::write(&manifest_path, serde_json::to_vec(&manifest).unwrap()).unwrap();

        let error = TrainedModel::load(&path).unwrap_err();
        assert!(matches!(error, IntentError::ModelArtifactIncompatible(_)));
        assert!(error.to_string().contains("hidden layers"));
    }

    #[test]
    fn test_future_format_is_incompatible() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model");
        tiny_model().save(&path).unwrap();

        let manifest_path = path.join(MANIFEST_FILE);
        let mut manifest: Manifest =
            serde_json::from_slice(&fs::read(&manifest_path).unwrap()).unwrap();
        manifest.format_version = FORMAT_VERSION + 1;
        fs::write(&manifest_path, serde_json::to_vec(&manifest).unwrap()).unwrap();

        assert!(matches!(
            TrainedModel::load(&path),
            Err(IntentError::ModelArtifactIncompatible(_))
        ));
    }
}
