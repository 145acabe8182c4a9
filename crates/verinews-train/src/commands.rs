//! Subcommand implementations

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use verinews_classifiers::{
    load_corpus, pipeline, ArtifactMetadata, ModelArtifact, PredictionResponse, PredictionService,
    TrainingConfig, TrainingRun,
};
use verinews_core::{Document, Label};

/// Sample predictions logged per class after training
const SAMPLES_PER_CLASS: usize = 3;

/// Options for the `train` subcommand
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub fake: PathBuf,
    pub real: PathBuf,
    pub output: PathBuf,
    pub config: PathBuf,
    pub seed: Option<u64>,
    pub jobs: Option<usize>,
}

/// Resolve the training config: file or defaults, then CLI overrides
pub fn training_config(options: &TrainOptions) -> Result<TrainingConfig> {
    let mut config = TrainingConfig::load_or_default(&options.config)
        .with_context(|| format!("Failed to load config {}", options.config.display()))?;

    if let Some(seed) = options.seed {
        config.trainer.seed = seed;
    }
    if let Some(jobs) = options.jobs {
        let threads = if jobs == 0 { num_cpus::get() } else { jobs };
        config.trainer.params.random_forest.n_jobs = Some(threads);
    }
    Ok(config)
}

/// Load the corpus, train every configured family and save the best model
pub fn run_train(options: &TrainOptions) -> Result<TrainingRun> {
    let config = training_config(options)?;

    info!(
        "Loading corpus from {} and {}",
        options.fake.display(),
        options.real.display()
    );
    let documents = load_corpus(&options.fake, &options.real, config.trainer.seed)?;
    info!("Loaded {} documents", documents.len());

    let run = pipeline::train(&documents, &config).context("Training failed")?;
    report(&run);

    run.artifact
        .save(&options.output)
        .with_context(|| format!("Failed to save model to {}", options.output.display()))?;
    info!("Model saved to {}", options.output.display());

    log_samples(&run.artifact, &documents)?;
    Ok(run)
}

fn report(run: &TrainingRun) {
    for evaluation in &run.outcome.evaluations {
        info!(
            "{}: train accuracy {:.4}, test accuracy {:.4} ({} ms)",
            evaluation.algorithm,
            evaluation.train_accuracy,
            evaluation.test_accuracy,
            evaluation.fit_millis
        );
    }

    let best = run.outcome.best_evaluation();
    info!(
        "Best model: {} with test accuracy {:.4}",
        best.algorithm, best.test_accuracy
    );
    info!("Classification report:\n{}", best.report);
    info!("Confusion matrix:\n{}", best.confusion);
}

fn log_samples(artifact: &ModelArtifact, documents: &[Document]) -> Result<()> {
    let service = PredictionService::new(Some(Arc::new(artifact.clone())))?;
    for label in Label::ALL {
        for doc in documents
            .iter()
            .filter(|d| d.label == label)
            .take(SAMPLES_PER_CLASS)
        {
            match service.predict(None, Some(&doc.content)) {
                Ok(prediction) => info!(
                    "Sample ({}): predicted {} at {:.2}% for \"{}\"",
                    label, prediction.label, prediction.confidence, prediction.content
                ),
                Err(e) => warn!("Sample ({}) could not be classified: {}", label, e),
            }
        }
    }
    Ok(())
}

/// Classify one article with the model in `model_dir`
pub fn run_predict(
    model_dir: &Path,
    headline: Option<&str>,
    content: Option<&str>,
) -> PredictionResponse {
    let service = PredictionService::from_dir(model_dir);
    PredictionResponse::from_result(&service.predict(headline, content))
}

/// Read the metadata of the model in `model_dir`
pub fn run_info(model_dir: &Path) -> Result<ArtifactMetadata> {
    let artifact = ModelArtifact::load(model_dir)
        .with_context(|| format!("Failed to load model from {}", model_dir.display()))?;
    Ok(artifact.metadata().clone())
}
