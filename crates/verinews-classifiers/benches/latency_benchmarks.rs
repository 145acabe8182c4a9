//! Latency benchmarks for the prediction path
//!
//! Measures each stage a request goes through: normalization, TF-IDF
//! transform, and classifier inference for every family.
//!
//! Run with: cargo bench -p verinews-classifiers

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use verinews_classifiers::{
    AlgorithmKind, Classifier, ClassifierParams, Estimator, Normalizer, TfidfVectorizer,
};
use verinews_core::Label;

const FAKE_TEMPLATES: &[&str] = &[
    "Win free lottery money now, click to claim your prize",
    "Shocking secret doctors do not want you to know about",
    "You will not believe what this celebrity said about aliens",
];

const REAL_TEMPLATES: &[&str] = &[
    "Senate passes budget bill today after lengthy debate",
    "Central bank holds interest rates steady amid inflation concerns",
    "Officials confirm new trade agreement with neighboring countries",
];

fn corpus(n: usize) -> (Vec<String>, Vec<Label>) {
    let normalizer = Normalizer::default();
    let mut texts = Vec::with_capacity(2 * n);
    let mut labels = Vec::with_capacity(2 * n);
    for i in 0..n {
        let fake = format!("{} {}", FAKE_TEMPLATES[i % FAKE_TEMPLATES.len()], i % 7);
        let real = format!("{} {}", REAL_TEMPLATES[i % REAL_TEMPLATES.len()], i % 5);
        texts.push(normalizer.normalize(Some(&fake)));
        labels.push(Label::Fake);
        texts.push(normalizer.normalize(Some(&real)));
        labels.push(Label::Real);
    }
    (texts, labels)
}

/// Benchmark text normalization
fn benchmark_normalizer(c: &mut Criterion) {
    let normalizer = Normalizer::default();
    let long = REAL_TEMPLATES.join(" ").repeat(20);

    let test_cases = vec![
        ("headline", FAKE_TEMPLATES[0].to_string()),
        ("paragraph", REAL_TEMPLATES.join(" ")),
        ("article", long),
    ];

    let mut group = c.benchmark_group("Normalizer");
    for (name, text) in &test_cases {
        group.bench_with_input(BenchmarkId::new("normalize", name), text, |b, text| {
            b.iter(|| normalizer.normalize(black_box(Some(text.as_str()))))
        });
    }
    group.finish();
}

/// Benchmark TF-IDF transform
fn benchmark_vectorizer(c: &mut Criterion) {
    let (texts, _) = corpus(200);
    let mut vectorizer = TfidfVectorizer::default();
    vectorizer.fit(&texts).expect("Failed to fit vectorizer");

    let mut group = c.benchmark_group("Vectorizer");
    group.bench_function("transform", |b| {
        b.iter(|| vectorizer.transform(black_box(&texts[0])).unwrap())
    });
    group.finish();
}

/// Benchmark single-document inference for every family
fn benchmark_classifiers(c: &mut Criterion) {
    let (texts, labels) = corpus(200);
    let mut vectorizer = TfidfVectorizer::default();
    let x = vectorizer.fit_transform(&texts).expect("Failed to fit vectorizer");
    let query = vectorizer.transform(&texts[1]).unwrap();

    let mut group = c.benchmark_group("Classifiers");
    for kind in AlgorithmKind::ALL {
        let mut classifier = Classifier::new(kind, &ClassifierParams::default());
        classifier.fit(&x, &labels).expect("Failed to fit classifier");
        group.bench_with_input(BenchmarkId::new("predict_proba", kind.name()), &query, |b, q| {
            b.iter(|| classifier.predict_proba(black_box(q.as_row())).unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_normalizer,
    benchmark_vectorizer,
    benchmark_classifiers
);
criterion_main!(benches);
