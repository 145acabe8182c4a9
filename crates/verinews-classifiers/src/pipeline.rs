//! End-to-end training pipeline
//!
//! documents → normalize → drop short texts → fit TF-IDF → train families
//! → select best → model artifact

use crate::artifact::ModelArtifact;
use crate::config::TrainingConfig;
use crate::normalizer::Normalizer;
use crate::trainer::{Trainer, TrainingOutcome};
use crate::vectorizer::TfidfVectorizer;
use rayon::prelude::*;
use tracing::{debug, info};
use verinews_core::{Document, Label, Result};

/// Normalized texts ready for vectorizing
#[derive(Debug, Clone, Default)]
pub struct PreparedCorpus {
    pub texts: Vec<String>,
    pub labels: Vec<Label>,
    /// Documents dropped for being too short after normalization
    pub dropped: usize,
}

impl PreparedCorpus {
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Number of kept documents with a label
    pub fn count(&self, label: Label) -> usize {
        self.labels.iter().filter(|l| **l == label).count()
    }
}

/// Normalize documents in parallel, keeping order, and drop those whose
/// normalized text has at most `min_chars` characters
pub fn prepare(
    documents: &[Document],
    normalizer: &Normalizer,
    min_chars: usize,
) -> PreparedCorpus {
    let normalized: Vec<String> = documents
        .par_iter()
        .map(|doc| normalizer.normalize(Some(&doc.content)))
        .collect();

    let mut corpus = PreparedCorpus::default();
    for (text, doc) in normalized.into_iter().zip(documents) {
        if text.len() > min_chars {
            corpus.texts.push(text);
            corpus.labels.push(doc.label);
        } else {
            corpus.dropped += 1;
        }
    }
    debug!(
        "Prepared {} documents, dropped {} short ones",
        corpus.len(),
        corpus.dropped
    );
    corpus
}

/// Everything produced by a training run
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub artifact: ModelArtifact,
    pub outcome: TrainingOutcome,
    pub n_documents: usize,
    pub n_dropped: usize,
}

/// Train a model artifact from labeled documents
pub fn train(documents: &[Document], config: &TrainingConfig) -> Result<TrainingRun> {
    config.validate()?;
    let normalizer = Normalizer::new(config.normalizer.clone())?;

    let corpus = prepare(documents, &normalizer, config.min_document_chars);
    info!(
        "Training on {} documents ({} fake, {} real), {} dropped as too short",
        corpus.len(),
        corpus.count(Label::Fake),
        corpus.count(Label::Real),
        corpus.dropped
    );

    let mut vectorizer = TfidfVectorizer::new(config.vectorizer.clone());
    let features = vectorizer.fit_transform(&corpus.texts)?;

    let trainer = Trainer::new(config.trainer.clone());
    let outcome = trainer.train(&features, &corpus.labels)?;

    let artifact =
        ModelArtifact::from_training(vectorizer, outcome.clone(), config.normalizer.clone())?;
    Ok(TrainingRun {
        artifact,
        outcome,
        n_documents: corpus.len(),
        n_dropped: corpus.dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::AlgorithmKind;

    #[test]
    fn test_prepare_drops_short_documents() {
        let normalizer = Normalizer::default();
        let docs = vec![
            Document::new("Senate passes the annual budget bill", Label::Real),
            Document::new("The an a !!!", Label::Fake),
            Document::new("win cash", Label::Fake),
        ];
        let corpus = prepare(&docs, &normalizer, 10);
        assert_eq!(corpus.texts, vec!["senat pass annual budget bill"]);
        assert_eq!(corpus.labels, vec![Label::Real]);
        assert_eq!(corpus.dropped, 2);
    }

    #[test]
    fn test_train_end_to_end() {
        let mut docs = Vec::new();
        for i in 0..30 {
            docs.push(Document::new(
                format!(
                    "Win free lottery money now, claim prize {}",
                    ["alpha", "bravo", "charlie"][i % 3]
                ),
                Label::Fake,
            ));
            docs.push(Document::new(
                format!(
                    "Senate passes budget bill today after debate {}",
                    ["delta", "echo", "foxtrot"][i % 3]
                ),
                Label::Real,
            ));
        }
        let mut config = TrainingConfig::default();
        config.trainer.params.random_forest.n_estimators = 10;

        let run = train(&docs, &config).unwrap();
        assert_eq!(run.n_documents, 60);
        assert_eq!(run.n_dropped, 0);
        assert_eq!(run.artifact.metadata().algorithm, AlgorithmKind::LogisticRegression);
        assert_eq!(run.artifact.metadata().test_accuracy, 1.0);
        assert_eq!(run.artifact.metadata().models.len(), 3);
    }
}
