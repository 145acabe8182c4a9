//! Random forest of Gini decision trees
//!
//! Each tree is grown on a bootstrap sample, represented as integer
//! sample weights, and considers `sqrt(n_features)` randomly drawn features
//! at every split. Node statistics are gathered by scanning the CSR rows of
//! the samples in the node, so only features that are non-zero somewhere in
//! the node are ever candidates; all other features are constant there.
//!
//! Trees draw from a ChaCha stream keyed by `(seed, tree index)`, which keeps
//! a fitted forest identical however many threads built it.

use crate::classifier::{check_row, check_training_set, Estimator};
use crate::sparse::{CsrMatrix, SparseRow};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use verinews_core::{Error, Label, Result};

/// Seed used when neither the forest nor a trainer supplies one
pub const DEFAULT_SEED: u64 = 42;

/// Random forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,

    /// Maximum tree depth; unlimited when absent
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Nodes with fewer distinct samples become leaves
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,

    /// Grow each tree on a bootstrap sample
    #[serde(default = "default_true")]
    pub bootstrap: bool,

    /// Base seed for every tree's random stream; [`DEFAULT_SEED`] when
    /// absent, or the trainer seed when trained through a `Trainer`
    #[serde(default)]
    pub seed: Option<u64>,

    /// Worker threads; the global rayon pool when absent
    #[serde(default)]
    pub n_jobs: Option<usize>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            max_depth: None,
            min_samples_split: default_min_samples_split(),
            bootstrap: true,
            seed: None,
            n_jobs: None,
        }
    }
}

fn default_n_estimators() -> usize {
    100
}

fn default_min_samples_split() -> usize {
    2
}

fn default_true() -> bool {
    true
}


/// Tree node, addressed by its index in [`DecisionTree::nodes`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Leaf {
        /// Weighted fraction of `Real` samples
        proba: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted binary decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Probability of `Real` for a row
    pub fn predict_real(&self, x: SparseRow<'_>) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { proba } => return *proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if x.get(*feature) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Length of the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0, 0)];
        while let Some((id, depth)) = stack.pop() {
            match &self.nodes[id] {
                Node::Leaf { .. } => max_depth = max_depth.max(depth),
                Node::Split { left, right, .. } => {
                    stack.push((*left, depth + 1));
                    stack.push((*right, depth + 1));
                }
            }
        }
        max_depth
    }

    fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (id, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { proba } if !(0.0..=1.0).contains(proba) => {
                    return Err(format!("leaf {id} has probability {proba}"));
                }
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } if *feature >= n_features
                    || *left <= id
                    || *right <= id
                    || *left >= self.nodes.len()
                    || *right >= self.nodes.len() =>
                {
                    return Err(format!("split node {id} is malformed"));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Chosen split of a node
struct Split {
    feature: usize,
    threshold: f64,
    score: f64,
}

/// One feature value in a node with its class weights
#[derive(Clone, Copy)]
struct Entry {
    value: f64,
    fake: f64,
    real: f64,
}

/// Grows a single tree
struct TreeBuilder<'a> {
    x: &'a CsrMatrix,
    y: &'a [Label],
    max_depth: Option<usize>,
    min_samples_split: usize,
    max_features: usize,
    weights: Vec<f64>,
    seen: Vec<bool>,
    slot: Vec<usize>,
    rng: ChaCha8Rng,
}

impl<'a> TreeBuilder<'a> {
    fn new(x: &'a CsrMatrix, y: &'a [Label], config: &ForestConfig, tree_idx: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed.unwrap_or(DEFAULT_SEED));
        rng.set_stream(tree_idx as u64);

        let n_features = x.n_cols();
        Self {
            x,
            y,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            max_features: ((n_features as f64).sqrt() as usize).max(1),
            weights: vec![0.0; x.n_rows()],
            seen: vec![false; n_features],
            slot: vec![usize::MAX; n_features],
            rng,
        }
    }

    fn build(mut self, bootstrap: bool) -> DecisionTree {
        let n = self.x.n_rows();
        if bootstrap {
            for _ in 0..n {
                let r = self.rng.gen_range(0..n);
                self.weights[r] += 1.0;
            }
        } else {
            self.weights.fill(1.0);
        }
        let root_samples: Vec<usize> = (0..n).filter(|&r| self.weights[r] > 0.0).collect();

        let mut nodes = vec![Node::Leaf { proba: 0.0 }];
        let mut stack = vec![(0, root_samples, 0)];
        while let Some((id, samples, depth)) = stack.pop() {
            let (fake, real) = self.class_weights(&samples);
            let proba = real / (fake + real);

            let splittable = fake > 0.0
                && real > 0.0
                && samples.len() >= self.min_samples_split
                && self.max_depth.map_or(true, |max| depth < max);
            let split = if splittable {
                self.best_split(&samples, fake, real)
            } else {
                None
            };

            match split {
                None => nodes[id] = Node::Leaf { proba },
                Some(split) => {
                    let (left, right): (Vec<usize>, Vec<usize>) = samples
                        .into_iter()
                        .partition(|&r| self.x.row(r).get(split.feature) <= split.threshold);

                    let left_id = nodes.len();
                    let right_id = left_id + 1;
                    nodes.push(Node::Leaf { proba: 0.0 });
                    nodes.push(Node::Leaf { proba: 0.0 });
                    nodes[id] = Node::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left: left_id,
                        right: right_id,
                    };
                    stack.push((right_id, right, depth + 1));
                    stack.push((left_id, left, depth + 1));
                }
            }
        }

        DecisionTree { nodes }
    }

    fn class_weights(&self, samples: &[usize]) -> (f64, f64) {
        samples.iter().fold((0.0, 0.0), |(fake, real), &r| match self.y[r] {
            Label::Fake => (fake + self.weights[r], real),
            Label::Real => (fake, real + self.weights[r]),
        })
    }

    /// Best Gini split among randomly drawn features that vary in the node
    fn best_split(&mut self, samples: &[usize], fake: f64, real: f64) -> Option<Split> {
        let mut candidates = Vec::new();
        for &r in samples {
            for &j in self.x.row(r).indices {
                if !self.seen[j] {
                    self.seen[j] = true;
                    candidates.push(j);
                }
            }
        }
        for &j in &candidates {
            self.seen[j] = false;
        }
        candidates.sort_unstable();
        candidates.shuffle(&mut self.rng);

        // Draw further batches only while no valid split has been found
        for batch in candidates.chunks(self.max_features) {
            let mut entries = self.gather(samples, batch);
            let mut best: Option<Split> = None;
            for (&feature, feature_entries) in batch.iter().zip(entries.iter_mut()) {
                if let Some((threshold, score)) = best_threshold(feature_entries, fake, real) {
                    if best.as_ref().map_or(true, |b| score > b.score) {
                        best = Some(Split {
                            feature,
                            threshold,
                            score,
                        });
                    }
                }
            }
            if best.is_some() {
                return best;
            }
        }
        None
    }

    /// Non-zero values of each batch feature over the node's samples
    fn gather(&mut self, samples: &[usize], batch: &[usize]) -> Vec<Vec<Entry>> {
        for (s, &j) in batch.iter().enumerate() {
            self.slot[j] = s;
        }

        let mut entries = vec![Vec::new(); batch.len()];
        for &r in samples {
            let weight = self.weights[r];
            let (fake, real) = match self.y[r] {
                Label::Fake => (weight, 0.0),
                Label::Real => (0.0, weight),
            };
            for (j, value) in self.x.row(r).iter() {
                let s = self.slot[j];
                if s != usize::MAX {
                    entries[s].push(Entry { value, fake, real });
                }
            }
        }

        for &j in batch {
            self.slot[j] = usize::MAX;
        }
        entries
    }
}

/// Best threshold for one feature as `(threshold, score)`.
///
/// The score is `Σ_child (fake² + real²) / weight`, which grows as the
/// weighted Gini impurity of the children shrinks.
fn best_threshold(entries: &mut Vec<Entry>, fake: f64, real: f64) -> Option<(f64, f64)> {
    // Samples without an entry sit at zero
    let (nz_fake, nz_real) = entries
        .iter()
        .fold((0.0, 0.0), |(f, r), e| (f + e.fake, r + e.real));
    let (zero_fake, zero_real) = (fake - nz_fake, real - nz_real);
    if zero_fake + zero_real > 0.0 {
        entries.push(Entry {
            value: 0.0,
            fake: zero_fake,
            real: zero_real,
        });
    }
    entries.sort_by(|a, b| a.value.total_cmp(&b.value));

    let mut best: Option<(f64, f64)> = None;
    let (mut left_fake, mut left_real) = (0.0, 0.0);
    for pair in entries.windows(2) {
        let (current, next) = (pair[0], pair[1]);
        left_fake += current.fake;
        left_real += current.real;
        if next.value <= current.value {
            continue;
        }

        let (right_fake, right_real) = (fake - left_fake, real - left_real);
        let left_weight = left_fake + left_real;
        let right_weight = right_fake + right_real;
        if left_weight <= 0.0 || right_weight <= 0.0 {
            continue;
        }

        let score = (left_fake * left_fake + left_real * left_real) / left_weight
            + (right_fake * right_fake + right_real * right_real) / right_weight;
        if best.map_or(true, |(_, s)| score > s) {
            let mut threshold = current.value / 2.0 + next.value / 2.0;
            if threshold >= next.value || threshold < current.value {
                threshold = current.value;
            }
            best = Some((threshold, score));
        }
    }
    best
}

/// Bagged ensemble of decision trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    n_features: Option<usize>,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: None,
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    fn grow(&self, x: &CsrMatrix, y: &[Label]) -> Vec<DecisionTree> {
        (0..self.config.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                TreeBuilder::new(x, y, &self.config, tree_idx).build(self.config.bootstrap)
            })
            .collect()
    }

    /// Check a deserialized forest for structural problems
    pub fn validate(&self) -> Result<()> {
        let n_features = self
            .n_features
            .ok_or_else(|| Error::corrupt("random forest has no feature count"))?;
        if self.trees.is_empty() {
            return Err(Error::corrupt("random forest has no trees"));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(n_features)
                .map_err(|e| Error::corrupt(format!("tree {i}: {e}")))?;
        }
        Ok(())
    }
}

impl Estimator for RandomForest {
    fn fit(&mut self, x: &CsrMatrix, y: &[Label]) -> Result<()> {
        check_training_set(x, y)?;
        if self.config.n_estimators == 0 {
            return Err(Error::config("n_estimators must be positive"));
        }
        if self.config.min_samples_split < 2 {
            return Err(Error::config("min_samples_split must be at least 2"));
        }

        let trees = match self.config.n_jobs {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to build thread pool: {}", e)))?;
                pool.install(|| self.grow(x, y))
            }
            None => self.grow(x, y),
        };

        let total_nodes: usize = trees.iter().map(DecisionTree::n_nodes).sum();
        debug!(
            "Forest has {} nodes, deepest tree {}",
            total_nodes,
            trees.iter().map(DecisionTree::depth).max().unwrap_or(0)
        );
        info!(
            "Fitted random forest with {} trees on {} samples x {} features",
            trees.len(),
            x.n_rows(),
            x.n_cols()
        );

        self.trees = trees;
        self.n_features = Some(x.n_cols());
        Ok(())
    }

    fn predict_proba(&self, x: SparseRow<'_>) -> Result<[f64; 2]> {
        check_row(x, self.n_features, "random forest")?;
        if self.trees.is_empty() {
            return Err(Error::not_fitted("random forest has no trees"));
        }
        let total: f64 = self.trees.iter().map(|tree| tree.predict_real(x)).sum();
        let p = total / self.trees.len() as f64;
        Ok([1.0 - p, p])
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
    }
}
