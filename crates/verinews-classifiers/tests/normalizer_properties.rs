//! Property tests for text normalization and vectorization

use proptest::prelude::*;
use verinews_classifiers::{Normalizer, TfidfVectorizer};

const WORDS: &[&str] = &[
    "senate", "passes", "budget", "bill", "today", "win", "free", "lottery", "money", "claims",
    "reported", "officials", "generalization", "running", "happily",
];

const NOISE: &[&str] = &["the", "a", "is", "on", "!!", "42", ",", "of", "it"];

fn fitted_vectorizer() -> TfidfVectorizer {
    let normalizer = Normalizer::default();
    let docs: Vec<String> = [
        "Senate passes budget bill today",
        "Senate passes tax bill after debate",
        "Win free lottery money now",
        "Win free prize money today",
        "Officials reported the budget claims",
        "Officials reported lottery claims",
    ]
    .iter()
    .map(|d| normalizer.normalize(Some(d)))
    .collect();
    let mut vectorizer = TfidfVectorizer::default();
    vectorizer.fit(&docs).unwrap();
    vectorizer
}

/// A sequence of content words with random casing and noise between them
fn noisy_text(words: Vec<(usize, bool, usize)>) -> (String, String) {
    let mut clean = Vec::new();
    let mut noisy = Vec::new();
    for (word, upper, noise) in words {
        let w = WORDS[word % WORDS.len()];
        clean.push(w.to_string());
        noisy.push(if upper { w.to_uppercase() } else { w.to_string() });
        noisy.push(NOISE[noise % NOISE.len()].to_string());
    }
    (clean.join(" "), noisy.join(" "))
}

proptest! {
    #[test]
    fn normalize_is_idempotent(text in "\\PC{0,200}") {
        let normalizer = Normalizer::default();
        let once = normalizer.normalize(Some(&text));
        prop_assert_eq!(normalizer.normalize(Some(&once)), once);
    }

    #[test]
    fn normalize_emits_lowercase_words(text in "\\PC{0,200}") {
        let normalizer = Normalizer::default();
        let out = normalizer.normalize(Some(&text));
        prop_assert!(out.chars().all(|c| c.is_ascii_lowercase() || c == ' '));
        prop_assert!(!out.starts_with(' ') && !out.ends_with(' '));
        prop_assert!(!out.contains("  "));
    }

    #[test]
    fn normalize_ascii_text_is_idempotent(text in "[a-zA-Z .,@:/]{0,120}") {
        let normalizer = Normalizer::default();
        let once = normalizer.normalize(Some(&text));
        prop_assert_eq!(normalizer.normalize(Some(&once)), once);
    }

    #[test]
    fn transform_dimension_matches_vocabulary(text in "\\PC{0,200}") {
        let vectorizer = fitted_vectorizer();
        let normalized = Normalizer::default().normalize(Some(&text));
        let vector = vectorizer.transform(&normalized).unwrap();
        prop_assert_eq!(vector.dim(), vectorizer.feature_count());
        let norm = vector.norm();
        prop_assert!(norm == 0.0 || (norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn same_tokens_give_same_vector(
        words in prop::collection::vec((0usize..100, any::<bool>(), 0usize..100), 1..12)
    ) {
        let normalizer = Normalizer::default();
        let vectorizer = fitted_vectorizer();
        let (clean, noisy) = noisy_text(words);

        let a = normalizer.normalize(Some(&clean));
        let b = normalizer.normalize(Some(&noisy));
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(vectorizer.transform(&a).unwrap(), vectorizer.transform(&b).unwrap());
    }
}
