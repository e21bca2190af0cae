//! CART-style classification tree: recursive binary splitting on Gini
//! impurity with numeric midpoint thresholds.

use super::LearnError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::cmp::Ordering;

/// Stopping rules for tree growth.
#[derive(Debug, Clone)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Minimum Gini improvement a split must deliver.
    pub min_gain: f64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 20,
            min_samples_leaf: 7,
            min_gain: 1e-3,
        }
    }
}

impl TreeParams {
    /// Permissive stopping rules that deliberately overfit: split down to
    /// single-sample leaves as long as any impurity improvement exists.
    pub fn overfit(max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
            min_samples_split: 2,
            min_samples_leaf: 1,
            min_gain: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    /// Training class counts reaching this node.
    pub counts: [usize; 2],
    pub split: Option<Split>,
}

#[derive(Debug, Clone)]
pub struct Split {
    pub feature: usize,
    pub threshold: f64,
    pub left: Box<Node>,
    pub right: Box<Node>,
}

impl Node {
    fn leaf(counts: [usize; 2]) -> Self {
        Self { counts, split: None }
    }

    pub fn is_leaf(&self) -> bool {
        self.split.is_none()
    }

    pub fn total(&self) -> usize {
        self.counts[0] + self.counts[1]
    }

    /// Positive-class fraction among training samples at this node.
    pub fn prob(&self) -> f64 {
        let n = self.total();
        if n == 0 { 0.0 } else { self.counts[1] as f64 / n as f64 }
    }

    /// Training misclassification count if this node were a leaf.
    pub fn miss(&self) -> usize {
        self.total() - self.counts[0].max(self.counts[1])
    }
}

/// Gini impurity of a two-class count pair.
pub fn gini(counts: &[usize; 2]) -> f64 {
    let n = (counts[0] + counts[1]) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let p0 = counts[0] as f64 / n;
    let p1 = counts[1] as f64 / n;
    1.0 - p0 * p0 - p1 * p1
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    pub root: Node,
    pub params: TreeParams,
    pub n_features: usize,
}

impl DecisionTree {
    pub fn fit(x: &[Vec<f64>], y: &[u8], params: &TreeParams) -> Result<Self, LearnError> {
        let idx: Vec<usize> = (0..y.len()).collect();
        Self::fit_sampled(x, y, &idx, params, None, 0)
    }

    /// Fit on an index sample (bootstrap duplicates allowed). With
    /// `mtry = Some(m)`, every split considers a fresh random subset of
    /// `m` features — the forest building block.
    pub fn fit_sampled(
        x: &[Vec<f64>],
        y: &[u8],
        sample: &[usize],
        params: &TreeParams,
        mtry: Option<usize>,
        seed: u64,
    ) -> Result<Self, LearnError> {
        if x.is_empty() || y.is_empty() || sample.is_empty() {
            return Err(LearnError::EmptyDataset);
        }
        let n_features = x[0].len();
        if let Some(bad) = x.iter().find(|row| row.len() != n_features) {
            return Err(LearnError::FeatureMismatch {
                expected: n_features,
                found: bad.len(),
            });
        }
        if let Some(m) = mtry {
            if m == 0 || m > n_features {
                return Err(LearnError::InvalidMtry {
                    mtry: m,
                    n_features,
                });
            }
        }

        let mut grower = Grower {
            x,
            y,
            params,
            mtry,
            rng: StdRng::seed_from_u64(seed),
            features: (0..n_features).collect(),
        };
        let root = grower.grow(sample.to_vec(), 0);

        Ok(Self {
            root,
            params: params.clone(),
            n_features,
        })
    }

    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        while let Some(split) = &node.split {
            node = if row[split.feature] <= split.threshold {
                &split.left
            } else {
                &split.right
            };
        }
        node.prob()
    }

    pub fn predict(&self, row: &[f64]) -> u8 {
        u8::from(self.predict_proba(row) >= 0.5)
    }

    pub fn leaf_count(&self) -> usize {
        count_leaves(&self.root)
    }

    /// Longest root-to-leaf edge count.
    pub fn depth(&self) -> usize {
        node_depth(&self.root)
    }
}

pub(crate) fn count_leaves(node: &Node) -> usize {
    match &node.split {
        None => 1,
        Some(s) => count_leaves(&s.left) + count_leaves(&s.right),
    }
}

fn node_depth(node: &Node) -> usize {
    match &node.split {
        None => 0,
        Some(s) => 1 + node_depth(&s.left).max(node_depth(&s.right)),
    }
}

// ── Growing ───────────────────────────────────────────────────────────────────

struct Grower<'a> {
    x: &'a [Vec<f64>],
    y: &'a [u8],
    params: &'a TreeParams,
    mtry: Option<usize>,
    rng: StdRng,
    features: Vec<usize>,
}

impl Grower<'_> {
    fn grow(&mut self, idx: Vec<usize>, depth: usize) -> Node {
        let counts = self.class_counts(&idx);

        let pure = counts[0] == 0 || counts[1] == 0;
        let too_small = idx.len() < self.params.min_samples_split;
        let too_deep = self.params.max_depth.is_some_and(|d| depth >= d);
        if pure || too_small || too_deep {
            return Node::leaf(counts);
        }

        let candidates: Vec<usize> = match self.mtry {
            Some(m) => {
                self.features.shuffle(&mut self.rng);
                let mut subset = self.features[..m].to_vec();
                // Sorted so the best-split scan stays order-deterministic.
                subset.sort_unstable();
                subset
            }
            None => self.features.clone(),
        };

        let Some((feature, threshold)) = self.best_split(&idx, &counts, &candidates) else {
            return Node::leaf(counts);
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
            idx.into_iter().partition(|&i| self.x[i][feature] <= threshold);

        let left = Box::new(self.grow(left_idx, depth + 1));
        let right = Box::new(self.grow(right_idx, depth + 1));

        Node {
            counts,
            split: Some(Split {
                feature,
                threshold,
                left,
                right,
            }),
        }
    }

    /// Best (feature, midpoint threshold) by Gini improvement, or None when
    /// no admissible split clears `min_gain`.
    fn best_split(
        &self,
        idx: &[usize],
        counts: &[usize; 2],
        candidates: &[usize],
    ) -> Option<(usize, f64)> {
        let node_gini = gini(counts);
        let n = idx.len();
        let mut best: Option<(f64, usize, f64)> = None;

        for &f in candidates {
            let mut order = idx.to_vec();
            order.sort_by(|&a, &b| {
                self.x[a][f]
                    .partial_cmp(&self.x[b][f])
                    .unwrap_or(Ordering::Equal)
            });

            let mut left = [0usize; 2];
            for i in 1..n {
                left[self.y[order[i - 1]] as usize] += 1;

                let prev = self.x[order[i - 1]][f];
                let cur = self.x[order[i]][f];
                if prev == cur {
                    continue;
                }
                if i < self.params.min_samples_leaf || n - i < self.params.min_samples_leaf {
                    continue;
                }

                let right = [counts[0] - left[0], counts[1] - left[1]];
                let weighted =
                    (i as f64 * gini(&left) + (n - i) as f64 * gini(&right)) / n as f64;
                let gain = node_gini - weighted;

                if best.is_none_or(|(g, _, _)| gain > g) {
                    best = Some((gain, f, (prev + cur) / 2.0));
                }
            }
        }

        // A zero-gain split would partition without improving anything.
        let floor = self.params.min_gain.max(1e-12);
        match best {
            Some((gain, feature, threshold)) if gain >= floor => Some((feature, threshold)),
            _ => None,
        }
    }

    fn class_counts(&self, idx: &[usize]) -> [usize; 2] {
        let mut counts = [0usize; 2];
        for &i in idx {
            counts[self.y[i] as usize] += 1;
        }
        counts
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
