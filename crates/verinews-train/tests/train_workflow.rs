//! Train from CSV files, then inspect and query the saved model

use std::fs;
use std::path::Path;
use verinews_classifiers::{AlgorithmKind, ModelArtifact};
use verinews_train::commands::{run_info, run_predict, run_train, TrainOptions};

fn write_corpus(dir: &Path) {
    let mut fake = String::from("title,text,subject,date\n");
    let mut real = String::from("title,text,subject,date\n");
    let fake_topics = ["lottery", "miracle", "aliens", "celebrity"];
    let real_topics = ["parliament", "treasury", "election", "tariff"];
    for i in 0..40 {
        fake.push_str(&format!(
            "SHOCKING secret revealed,\"Insiders expose the {} hoax they hide\",news,2017\n",
            fake_topics[i % 4]
        ));
        real.push_str(&format!(
            "Reuters report,\"Officials announced the {} decision on Monday\",politicsNews,2017\n",
            real_topics[i % 4]
        ));
    }
    fs::write(dir.join("Fake.csv"), fake).unwrap();
    fs::write(dir.join("True.csv"), real).unwrap();
}

fn options(dir: &Path) -> TrainOptions {
    TrainOptions {
        fake: dir.join("Fake.csv"),
        real: dir.join("True.csv"),
        output: dir.join("model"),
        config: dir.join("training.yaml"),
        seed: Some(7),
        jobs: Some(2),
    }
}

#[test]
fn test_train_then_predict_and_inspect() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    fs::write(
        dir.path().join("training.yaml"),
        "trainer:\n  params:\n    random_forest:\n      n_estimators: 15\n",
    )
    .unwrap();

    let run = run_train(&options(dir.path())).unwrap();
    assert_eq!(run.n_documents, 80);
    assert_eq!(run.artifact.metadata().test_accuracy, 1.0);

    let model_dir = dir.path().join("model");
    let summary = fs::read_to_string(model_dir.join("model_info.txt")).unwrap();
    assert!(summary.contains("Test Accuracy: 1.0000"));

    let metadata = run_info(&model_dir).unwrap();
    assert_eq!(&metadata, run.artifact.metadata());
    assert_eq!(metadata.models.len(), AlgorithmKind::ALL.len());

    let response = run_predict(
        &model_dir,
        Some("Officials announced"),
        Some("the treasury decision on Monday"),
    );
    assert!(response.success);
    assert_eq!(response.result.as_deref(), Some("Real"));

    let reloaded = ModelArtifact::load(&model_dir).unwrap();
    assert_eq!(reloaded, run.artifact);
}

#[test]
fn test_predict_without_model() {
    let dir = tempfile::tempdir().unwrap();
    let response = run_predict(&dir.path().join("model"), Some("headline"), None);
    assert!(!response.success);
    assert!(response.error.unwrap().contains("model not loaded"));
}

#[test]
fn test_info_without_model() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_info(&dir.path().join("model")).unwrap_err();
    assert!(err.to_string().contains("Failed to load model"));
}

#[test]
fn test_empty_prediction_input() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let mut opts = options(dir.path());
    opts.jobs = None;
    run_train(&opts).unwrap();

    let response = run_predict(&dir.path().join("model"), Some(" "), Some(""));
    assert!(!response.success);
    assert!(response
        .error
        .unwrap()
        .contains("provide either a headline or content"));
}
