//! Model artifact persistence
//!
//! An artifact directory holds:
//!
//! - `vectorizer.json`: the fitted TF-IDF vectorizer
//! - `classifier.json`: the selected classifier
//! - `model_info.json`: metadata plus SHA-256 checksums of the two files above
//! - `model_info.txt`: a short human-readable summary
//!
//! Every file is written to a temporary sibling, synced and renamed into
//! place. The metadata files go last, so a directory with a readable
//! `model_info.json` always has matching model files.

use crate::classifier::{AlgorithmKind, Classifier, Estimator};
use crate::normalizer::{Normalizer, NormalizerConfig};
use crate::trainer::TrainingOutcome;
use crate::vectorizer::TfidfVectorizer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;
use verinews_core::{Error, Result};

/// Version of the on-disk layout
pub const FORMAT_VERSION: u32 = 1;

pub const VECTORIZER_FILE: &str = "vectorizer.json";
pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const METADATA_FILE: &str = "model_info.json";
pub const SUMMARY_FILE: &str = "model_info.txt";

/// Accuracy of one candidate family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    pub algorithm: AlgorithmKind,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
}

/// Descriptive metadata stored with an artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub format_version: u32,
    /// Family of the stored classifier
    pub algorithm: AlgorithmKind,
    pub test_accuracy: f64,
    pub train_accuracy: f64,
    /// Vocabulary size, equal to the classifier's input dimension
    pub feature_count: usize,
    pub n_train: usize,
    pub n_test: usize,
    /// Every family that was fitted, in training order
    pub models: Vec<ModelScore>,
    /// Normalizer settings the vocabulary was built with
    pub normalizer: NormalizerConfig,
    pub trained_at: DateTime<Utc>,
}

/// SHA-256 digests of the model files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Checksums {
    vectorizer: String,
    classifier: String,
}

/// Contents of `model_info.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Manifest {
    metadata: ArtifactMetadata,
    checksums: Checksums,
}

/// A fitted vectorizer and classifier that belong together
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    vectorizer: TfidfVectorizer,
    classifier: Classifier,
    metadata: ArtifactMetadata,
}

impl ModelArtifact {
    /// Assemble an artifact, checking that the parts fit together
    pub fn new(
        vectorizer: TfidfVectorizer,
        classifier: Classifier,
        metadata: ArtifactMetadata,
    ) -> Result<Self> {
        let artifact = Self {
            vectorizer,
            classifier,
            metadata,
        };
        artifact.check_consistency().map_err(Error::invalid_input)?;
        Ok(artifact)
    }

    /// Build an artifact from the winner of a training run
    pub fn from_training(
        vectorizer: TfidfVectorizer,
        outcome: TrainingOutcome,
        normalizer: NormalizerConfig,
    ) -> Result<Self> {
        let best = outcome.best_evaluation();
        let metadata = ArtifactMetadata {
            format_version: FORMAT_VERSION,
            algorithm: outcome.best.kind(),
            test_accuracy: best.test_accuracy,
            train_accuracy: best.train_accuracy,
            feature_count: vectorizer.feature_count(),
            n_train: outcome.n_train,
            n_test: outcome.n_test,
            models: outcome
                .evaluations
                .iter()
                .map(|e| ModelScore {
                    algorithm: e.algorithm,
                    train_accuracy: e.train_accuracy,
                    test_accuracy: e.test_accuracy,
                })
                .collect(),
            normalizer,
            trained_at: Utc::now(),
        };
        Self::new(vectorizer, outcome.best, metadata)
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    /// A normalizer configured the way the training text was normalized
    pub fn normalizer(&self) -> Result<Normalizer> {
        Normalizer::new(self.metadata.normalizer.clone())
    }

    /// Class probabilities for an already normalized document
    pub fn predict_proba(&self, normalized: &str) -> Result<[f64; 2]> {
        let features = self.vectorizer.transform(normalized)?;
        self.classifier.predict_proba(features.as_row())
    }

    fn check_consistency(&self) -> std::result::Result<(), String> {
        if !self.vectorizer.is_fitted() {
            return Err("vectorizer is not fitted".to_string());
        }
        self.vectorizer
            .config()
            .validate()
            .map_err(|e| format!("vectorizer: {e}"))?;
        let feature_count = self.vectorizer.feature_count();
        match self.classifier.n_features() {
            Some(n) if n == feature_count => {}
            Some(n) => {
                return Err(format!(
                    "classifier expects {n} features but the vocabulary has {feature_count}"
                ))
            }
            None => return Err("classifier is not fitted".to_string()),
        }
        if self.metadata.feature_count != feature_count {
            return Err(format!(
                "metadata records {} features but the vocabulary has {feature_count}",
                self.metadata.feature_count
            ));
        }
        if self.metadata.algorithm != self.classifier.kind() {
            return Err(format!(
                "metadata names {} but the classifier is {}",
                self.metadata.algorithm,
                self.classifier.kind()
            ));
        }
        if let Classifier::RandomForest(forest) = &self.classifier {
            forest.validate().map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    /// Write the artifact into `dir`, creating it if needed
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let vectorizer = serde_json::to_vec(&self.vectorizer)?;
        let classifier = serde_json::to_vec(&self.classifier)?;
        let manifest = Manifest {
            metadata: self.metadata.clone(),
            checksums: Checksums {
                vectorizer: sha256_hex(&vectorizer),
                classifier: sha256_hex(&classifier),
            },
        };
        let manifest = serde_json::to_vec_pretty(&manifest)?;

        write_atomic(dir, VECTORIZER_FILE, &vectorizer)?;
        write_atomic(dir, CLASSIFIER_FILE, &classifier)?;
        write_atomic(dir, METADATA_FILE, &manifest)?;
        write_atomic(dir, SUMMARY_FILE, self.summary().as_bytes())?;

        info!(
            "Saved {} model ({} features) to {}",
            self.metadata.algorithm,
            self.metadata.feature_count,
            dir.display()
        );
        Ok(())
    }

    /// Read and verify an artifact directory
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();

        let manifest_bytes = read_required(dir, METADATA_FILE)?;
        let vectorizer_bytes = read_required(dir, VECTORIZER_FILE)?;
        let classifier_bytes = read_required(dir, CLASSIFIER_FILE)?;

        let manifest: Manifest = serde_json::from_slice(&manifest_bytes)
            .map_err(|e| Error::corrupt(format!("{METADATA_FILE}: {e}")))?;
        if manifest.metadata.format_version != FORMAT_VERSION {
            return Err(Error::corrupt(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                manifest.metadata.format_version
            )));
        }
        verify_checksum(VECTORIZER_FILE, &vectorizer_bytes, &manifest.checksums.vectorizer)?;
        verify_checksum(CLASSIFIER_FILE, &classifier_bytes, &manifest.checksums.classifier)?;

        let vectorizer: TfidfVectorizer = serde_json::from_slice(&vectorizer_bytes)
            .map_err(|e| Error::corrupt(format!("{VECTORIZER_FILE}: {e}")))?;
        let classifier: Classifier = serde_json::from_slice(&classifier_bytes)
            .map_err(|e| Error::corrupt(format!("{CLASSIFIER_FILE}: {e}")))?;

        let artifact = Self {
            vectorizer,
            classifier,
            metadata: manifest.metadata,
        };
        artifact.check_consistency().map_err(Error::corrupt)?;
        artifact.normalizer().map_err(|e| Error::corrupt(e.to_string()))?;

        info!(
            "Loaded {} model ({} features) from {}",
            artifact.metadata.algorithm,
            artifact.metadata.feature_count,
            dir.display()
        );
        Ok(artifact)
    }

    /// Human-readable summary written to `model_info.txt`
    pub fn summary(&self) -> String {
        let mut text = format!(
            "Best Model: {}\nTest Accuracy: {:.4}\nVectorizer Features: {}\n",
            self.metadata.algorithm, self.metadata.test_accuracy, self.metadata.feature_count
        );
        text.push_str(&format!(
            "Train/Test Documents: {}/{}\nTrained At: {}\n",
            self.metadata.n_train,
            self.metadata.n_test,
            self.metadata.trained_at.to_rfc3339()
        ));
        for model in &self.metadata.models {
            text.push_str(&format!(
                "  {}: train {:.4}, test {:.4}\n",
                model.algorithm, model.train_accuracy, model.test_accuracy
            ));
        }
        text
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn verify_checksum(name: &str, bytes: &[u8], expected: &str) -> Result<()> {
    let actual = sha256_hex(bytes);
    if actual != expected {
        return Err(Error::corrupt(format!(
            "{name}: checksum mismatch (expected {expected}, found {actual})"
        )));
    }
    Ok(())
}

fn read_required(dir: &Path, name: &str) -> Result<Vec<u8>> {
    let path = dir.join(name);
    if !path.is_file() {
        return Err(Error::ArtifactNotFound(path));
    }
    debug!("Reading {}", path.display());
    Ok(fs::read(&path)?)
}

/// Write to a temporary sibling, sync, then rename over `dir/name`
fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let target = dir.join(name);
    let tmp = dir.join(format!(".{name}.{}.tmp", Uuid::new_v4()));

    let written = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, &target)
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassifierParams;
    use verinews_core::Label;

    fn fitted_parts() -> (TfidfVectorizer, Classifier) {
        let docs = [
            "win free lotteri monei",
            "win free prize",
            "senat pass budget bill",
            "senat pass tax bill",
        ];
        let labels = [Label::Fake, Label::Fake, Label::Real, Label::Real];
        let mut vectorizer = TfidfVectorizer::default();
        let x = vectorizer.fit_transform(&docs).unwrap();
        let mut classifier =
            Classifier::new(AlgorithmKind::NaiveBayes, &ClassifierParams::default());
        classifier.fit(&x, &labels).unwrap();
        (vectorizer, classifier)
    }

    fn sample_metadata(vectorizer: &TfidfVectorizer) -> ArtifactMetadata {
        ArtifactMetadata {
            format_version: FORMAT_VERSION,
            algorithm: AlgorithmKind::NaiveBayes,
            test_accuracy: 1.0,
            train_accuracy: 1.0,
            feature_count: vectorizer.feature_count(),
            n_train: 4,
            n_test: 0,
            models: Vec::new(),
            normalizer: NormalizerConfig::default(),
            trained_at: Utc::now(),
        }
    }

    fn artifact() -> ModelArtifact {
        let (vectorizer, classifier) = fitted_parts();
        let metadata = sample_metadata(&vectorizer);
        ModelArtifact::new(vectorizer, classifier, metadata).unwrap()
    }

    #[test]
    fn test_new_rejects_mismatched_parts() {
        let (vectorizer, classifier) = fitted_parts();
        let mut metadata = sample_metadata(&vectorizer);
        metadata.algorithm = AlgorithmKind::RandomForest;
        assert!(matches!(
            ModelArtifact::new(vectorizer.clone(), classifier.clone(), metadata),
            Err(Error::InvalidInput(_))
        ));

        let unfitted = TfidfVectorizer::default();
        let metadata = sample_metadata(&vectorizer);
        assert!(ModelArtifact::new(unfitted, classifier, metadata).is_err());
    }

    #[test]
    fn test_save_writes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact();
        artifact.save(dir.path()).unwrap();

        for name in [VECTORIZER_FILE, CLASSIFIER_FILE, METADATA_FILE, SUMMARY_FILE] {
            assert!(dir.path().join(name).is_file(), "{name}");
        }
        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);

        let summary = fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
        assert!(summary.contains("Best Model: naive_bayes"));
        assert!(summary.contains("Test Accuracy: 1.0000"));
    }

    #[test]
    fn test_round_trip_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact();
        artifact.save(dir.path()).unwrap();
        let loaded = ModelArtifact::load(dir.path()).unwrap();
        assert_eq!(loaded, artifact);

        for text in ["win free monei", "senat budget", "unrelated words"] {
            let a = artifact.predict_proba(text).unwrap();
            let b = loaded.predict_proba(text).unwrap();
            assert_eq!(a[0].to_bits(), b[0].to_bits());
            assert_eq!(a[1].to_bits(), b[1].to_bits());
        }
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        artifact().save(dir.path()).unwrap();
        fs::remove_file(dir.path().join(CLASSIFIER_FILE)).unwrap();
        match ModelArtifact::load(dir.path()) {
            Err(Error::ArtifactNotFound(path)) => assert!(path.ends_with(CLASSIFIER_FILE)),
            other => panic!("expected ArtifactNotFound, got {other:?}"),
        }

        let empty = tempfile::tempdir().unwrap();
        assert!(matches!(
            ModelArtifact::load(empty.path()),
            Err(Error::ArtifactNotFound(_))
        ));
    }

    #[test]
    fn test_tampered_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        artifact().save(dir.path()).unwrap();
        let path = dir.path().join(VECTORIZER_FILE);
        let mut contents = fs::read_to_string(&path).unwrap();
        contents.push(' ');
        fs::write(&path, contents).unwrap();
        match ModelArtifact::load(dir.path()) {
            Err(Error::ArtifactCorrupt(msg)) => assert!(msg.contains("checksum")),
            other => panic!("expected ArtifactCorrupt, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_metadata_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        artifact().save(dir.path()).unwrap();
        fs::write(dir.path().join(METADATA_FILE), "{not json").unwrap();
        assert!(matches!(
            ModelArtifact::load(dir.path()),
            Err(Error::ArtifactCorrupt(_))
        ));
    }

    /// Rewrite the vectorizer file and its checksum so only the content check can catch it
    fn rewrite_vectorizer(dir: &Path, edit: impl FnOnce(&mut serde_json::Value)) {
        let path = dir.join(VECTORIZER_FILE);
        let mut vectorizer: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        edit(&mut vectorizer);
        let bytes = serde_json::to_vec(&vectorizer).unwrap();
        fs::write(&path, &bytes).unwrap();

        let manifest_path = dir.join(METADATA_FILE);
        let mut manifest: serde_json::Value =
            serde_json::from_slice(&fs::read(&manifest_path).unwrap()).unwrap();
        manifest["checksums"]["vectorizer"] = serde_json::json!(sha256_hex(&bytes));
        fs::write(&manifest_path, serde_json::to_vec(&manifest).unwrap()).unwrap();
    }

    #[test]
    fn test_invalid_vectorizer_config_is_corrupt() {
        for range in [serde_json::json!([0, 0]), serde_json::json!([1, 1_000_000_000])] {
            let dir = tempfile::tempdir().unwrap();
            artifact().save(dir.path()).unwrap();
            rewrite_vectorizer(dir.path(), |v| v["config"]["ngram_range"] = range.clone());
            match ModelArtifact::load(dir.path()) {
                Err(Error::ArtifactCorrupt(msg)) => assert!(msg.contains("ngram_range"), "{msg}"),
                other => panic!("expected ArtifactCorrupt, got {other:?}"),
            }
        }

        let dir = tempfile::tempdir().unwrap();
        artifact().save(dir.path()).unwrap();
        rewrite_vectorizer(dir.path(), |v| v["config"]["max_df"] = serde_json::json!(0.0));
        assert!(matches!(
            ModelArtifact::load(dir.path()),
            Err(Error::ArtifactCorrupt(_))
        ));
    }

    #[test]
    fn test_unknown_format_version_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        artifact().save(dir.path()).unwrap();
        let path = dir.path().join(METADATA_FILE);
        let mut manifest: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        manifest["metadata"]["format_version"] = serde_json::json!(99);
        fs::write(&path, serde_json::to_vec(&manifest).unwrap()).unwrap();
        match ModelArtifact::load(dir.path()) {
            Err(Error::ArtifactCorrupt(msg)) => assert!(msg.contains("format version")),
            other => panic!("expected ArtifactCorrupt, got {other:?}"),
        }
    }
}
