//! TF-IDF feature vectorizer
//!
//! Fits a vocabulary of unigrams and bigrams over normalized documents and
//! maps new documents into the same feature space:
//!
//! ```text
//! idf(t)    = ln((1 + N) / (1 + df(t))) + 1
//! weight(t) = count(t) * idf(t), then L2-normalized per document
//! ```
//!
//! Feature indices follow lexicographic term order and never change once
//! fitted, so vectors built at training and at serving time line up.

use crate::sparse::{CsrMatrix, SparseVector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};
use verinews_core::{Error, Result};

/// Vectorizer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Keep at most this many terms, ranked by corpus frequency
    #[serde(default = "default_max_features")]
    pub max_features: usize,

    /// Drop terms found in fewer documents than this
    #[serde(default = "default_min_df")]
    pub min_df: usize,

    /// Drop terms found in more than this fraction of documents
    #[serde(default = "default_max_df")]
    pub max_df: f64,

    /// Smallest and largest n-gram length
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: default_max_features(),
            min_df: default_min_df(),
            max_df: default_max_df(),
            ngram_range: default_ngram_range(),
        }
    }
}

fn default_max_features() -> usize {
    10_000
}

fn default_min_df() -> usize {
    2
}

fn default_max_df() -> f64 {
    0.95
}

fn default_ngram_range() -> (usize, usize) {
    (1, 2)
}

/// Longest supported n-gram
pub const MAX_NGRAM: usize = 8;

impl VectorizerConfig {
    /// Check the configuration for contradictions
    pub fn validate(&self) -> Result<()> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n || max_n > MAX_NGRAM {
            return Err(Error::config(format!(
                "invalid ngram_range ({min_n}, {max_n})"
            )));
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(Error::config(format!(
                "max_df must be in (0, 1], got {}",
                self.max_df
            )));
        }
        if self.max_features == 0 {
            return Err(Error::config("max_features must be positive"));
        }
        Ok(())
    }
}

/// Serialized form of a vocabulary
#[derive(Serialize, Deserialize)]
struct VocabularyRecord {
    terms: Vec<String>,
    idf: Vec<f64>,
    n_documents: usize,
}

/// Fitted term → index mapping with inverse document frequencies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VocabularyRecord", into = "VocabularyRecord")]
pub struct Vocabulary {
    terms: Vec<String>,
    idf: Vec<f64>,
    n_documents: usize,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    fn new(terms: Vec<String>, idf: Vec<f64>, n_documents: usize) -> Self {
        let index = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self {
            terms,
            idf,
            n_documents,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Feature index of a term
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    /// Terms in feature-index order
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// IDF weights in feature-index order
    pub fn idf_weights(&self) -> &[f64] {
        &self.idf
    }

    /// Number of documents the vocabulary was fitted on
    pub fn n_documents(&self) -> usize {
        self.n_documents
    }
}

impl TryFrom<VocabularyRecord> for Vocabulary {
    type Error = String;

    fn try_from(record: VocabularyRecord) -> std::result::Result<Self, Self::Error> {
        if record.terms.len() != record.idf.len() {
            return Err(format!(
                "vocabulary has {} terms but {} idf weights",
                record.terms.len(),
                record.idf.len()
            ));
        }
        if record.terms.windows(2).any(|w| w[0] >= w[1]) {
            return Err("vocabulary terms are not strictly sorted".to_string());
        }
        if record.idf.iter().any(|w| !w.is_finite()) {
            return Err("vocabulary contains a non-finite idf weight".to_string());
        }
        Ok(Self::new(record.terms, record.idf, record.n_documents))
    }
}

impl From<Vocabulary> for VocabularyRecord {
    fn from(vocabulary: Vocabulary) -> Self {
        Self {
            terms: vocabulary.terms,
            idf: vocabulary.idf,
            n_documents: vocabulary.n_documents,
        }
    }
}

/// Per-term statistics gathered while fitting
#[derive(Default)]
struct TermStats {
    count: usize,
    df: usize,
}

/// TF-IDF vectorizer over unigrams and bigrams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    config: VectorizerConfig,
    vocabulary: Option<Vocabulary>,
}

impl TfidfVectorizer {
    /// Create an unfitted vectorizer
    pub fn new(config: VectorizerConfig) -> Self {
        Self {
            config,
            vocabulary: None,
        }
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.vocabulary.is_some()
    }

    /// The fitted vocabulary
    pub fn vocabulary(&self) -> Result<&Vocabulary> {
        self.vocabulary
            .as_ref()
            .ok_or_else(|| Error::not_fitted("TfidfVectorizer.transform called before fit"))
    }

    /// Number of features, zero before fitting
    pub fn feature_count(&self) -> usize {
        self.vocabulary.as_ref().map_or(0, Vocabulary::len)
    }

    /// Terms in feature-index order
    pub fn feature_names(&self) -> Result<&[String]> {
        Ok(self.vocabulary()?.terms())
    }

    /// IDF weight of a term, if it is in the vocabulary
    pub fn idf(&self, term: &str) -> Option<f64> {
        let vocabulary = self.vocabulary.as_ref()?;
        vocabulary.index_of(term).map(|i| vocabulary.idf[i])
    }

    /// Fit the vocabulary and IDF weights on normalized documents
    pub fn fit<S: AsRef<str>>(&mut self, corpus: &[S]) -> Result<&Vocabulary> {
        self.config.validate()?;

        let n_documents = corpus.len();
        if n_documents == 0 {
            return Err(Error::EmptyVocabulary);
        }

        let mut stats: HashMap<String, TermStats> = HashMap::new();
        for document in corpus {
            let mut seen: HashMap<String, usize> = HashMap::new();
            for term in self.ngrams(document.as_ref()) {
                *seen.entry(term).or_insert(0) += 1;
            }
            for (term, count) in seen {
                let entry = stats.entry(term).or_default();
                entry.count += count;
                entry.df += 1;
            }
        }
        let total_terms = stats.len();

        let max_doc_count = self.config.max_df * n_documents as f64;
        let mut kept: Vec<(String, TermStats)> = stats
            .into_iter()
            .filter(|(_, s)| s.df >= self.config.min_df && s.df as f64 <= max_doc_count)
            .collect();

        if kept.len() > self.config.max_features {
            kept.sort_by(|(a, sa), (b, sb)| sb.count.cmp(&sa.count).then_with(|| a.cmp(b)));
            kept.truncate(self.config.max_features);
        }
        kept.sort_by(|(a, _), (b, _)| a.cmp(b));

        if kept.is_empty() {
            return Err(Error::EmptyVocabulary);
        }

        let n = n_documents as f64;
        let idf = kept
            .iter()
            .map(|(_, s)| ((1.0 + n) / (1.0 + s.df as f64)).ln() + 1.0)
            .collect();
        let terms = kept.into_iter().map(|(t, _)| t).collect();

        let vocabulary = Vocabulary::new(terms, idf, n_documents);
        info!(
            "Fitted vocabulary: {} features from {} candidate terms over {} documents",
            vocabulary.len(),
            total_terms,
            n_documents
        );

        Ok(self.vocabulary.insert(vocabulary))
    }

    /// Map a normalized document into the fitted feature space
    pub fn transform(&self, document: &str) -> Result<SparseVector> {
        let vocabulary = self.vocabulary()?;

        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in self.ngrams(document) {
            if let Some(i) = vocabulary.index_of(&term) {
                *counts.entry(i).or_insert(0.0) += 1.0;
            }
        }

        let pairs = counts
            .into_iter()
            .map(|(i, tf)| (i, tf * vocabulary.idf[i]))
            .collect();
        let mut vector = SparseVector::from_pairs(vocabulary.len(), pairs);
        vector.l2_normalize();
        Ok(vector)
    }

    /// Transform many documents into CSR rows
    pub fn transform_batch<S: AsRef<str>>(&self, corpus: &[S]) -> Result<CsrMatrix> {
        let n_features = self.vocabulary()?.len();
        let mut matrix = CsrMatrix::new(n_features);
        for document in corpus {
            let vector = self.transform(document.as_ref())?;
            matrix.push_row(vector.as_row());
        }
        debug!(
            "Transformed {} documents into {} non-zero features",
            matrix.n_rows(),
            matrix.nnz()
        );
        Ok(matrix)
    }

    /// Fit on a corpus and transform it
    pub fn fit_transform<S: AsRef<str>>(&mut self, corpus: &[S]) -> Result<CsrMatrix> {
        self.fit(corpus)?;
        self.transform_batch(corpus)
    }

    /// Contiguous n-grams of whitespace-separated tokens, joined by a space
    fn ngrams(&self, document: &str) -> Vec<String> {
        let tokens: Vec<&str> = document.split_whitespace().collect();
        let (min_n, max_n) = self.config.ngram_range;

        let mut grams = Vec::new();
        for n in min_n.max(1)..=max_n.min(tokens.len()) {
            grams.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        grams
    }
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new(VectorizerConfig::default())
    }
}
