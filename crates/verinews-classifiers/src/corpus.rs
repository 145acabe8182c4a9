//! Labeled corpus loading from CSV
//!
//! Each input file holds one class. Columns are looked up by header name;
//! `title` and `text` are joined with a single space, and a missing column
//! or cell counts as an empty string.

use anyhow::{Context, Result};
use csv::StringRecord;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use std::path::Path;
use tracing::info;
use verinews_core::{Document, Label};

/// Load every row of one CSV file with the given label
pub fn load_labeled_csv(path: impl AsRef<Path>, label: Label) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open corpus file: {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header in {}", path.display()))?
        .clone();
    let title_col = column(&headers, "title");
    let text_col = column(&headers, "text");

    let mut documents = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result
            .with_context(|| format!("Failed to read record {} in {}", idx, path.display()))?;
        let title = cell(&record, title_col);
        let text = cell(&record, text_col);
        documents.push(Document::from_parts(title, text, label));
    }

    info!(
        "Loaded {} {} documents from {}",
        documents.len(),
        label,
        path.display()
    );
    Ok(documents)
}

/// Load both classes and shuffle them together with a fixed seed
pub fn load_corpus(
    fake_path: impl AsRef<Path>,
    real_path: impl AsRef<Path>,
    seed: u64,
) -> Result<Vec<Document>> {
    let mut documents = load_labeled_csv(fake_path, Label::Fake)?;
    documents.extend(load_labeled_csv(real_path, Label::Real)?);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    documents.shuffle(&mut rng);
    Ok(documents)
}

fn column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn cell(record: &StringRecord, column: Option<usize>) -> &str {
    column.and_then(|i| record.get(i)).unwrap_or("")
}
