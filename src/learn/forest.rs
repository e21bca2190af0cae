//! Random forest: bagged mtry-sampled trees with mean-probability voting.

use super::LearnError;
use super::tree::{DecisionTree, TreeParams};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct ForestParams {
    pub n_trees: usize,
    /// Features considered at each split.
    pub mtry: usize,
    /// Stopping rules for the member trees.
    pub tree: TreeParams,
    pub seed: u64,
}

#[derive(Debug)]
pub struct RandomForest {
    pub trees: Vec<DecisionTree>,
    pub params: ForestParams,
}

impl RandomForest {
    /// Fit `n_trees` bootstrap trees. Per-tree RNG state derives from
    /// `seed + tree index`, so a fixed seed reproduces the whole ensemble
    /// regardless of worker scheduling. Tree fitting runs on the rayon
    /// pool — the only parallel section in the program.
    pub fn fit(x: &[Vec<f64>], y: &[u8], params: &ForestParams) -> Result<Self, LearnError> {
        if x.is_empty() || y.is_empty() {
            return Err(LearnError::EmptyDataset);
        }
        if params.n_trees == 0 {
            return Err(LearnError::NoTrees);
        }
        let n_features = x[0].len();
        if params.mtry == 0 || params.mtry > n_features {
            return Err(LearnError::InvalidMtry {
                mtry: params.mtry,
                n_features,
            });
        }

        let n = y.len();
        let trees = (0..params.n_trees)
            .into_par_iter()
            .map(|t| {
                let tree_seed = params.seed.wrapping_add(t as u64);
                let mut rng = StdRng::seed_from_u64(tree_seed);
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit_sampled(x, y, &sample, &params.tree, Some(params.mtry), tree_seed)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            trees,
            params: params.clone(),
        })
    }

    /// Mean positive-class probability across member trees.
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(row)).sum();
        sum / self.trees.len() as f64
    }

    pub fn predict(&self, row: &[f64]) -> u8 {
        u8::from(self.predict_proba(row) >= 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable_data() -> (Vec<Vec<f64>>, Vec<u8>) {
        let x: Vec<Vec<f64>> = (0..60)
            .map(|i| vec![i as f64, (i % 7) as f64])
            .collect();
        let y: Vec<u8> = (0..60).map(|i| u8::from(i >= 30)).collect();
        (x, y)
    }

    fn params(mtry: usize) -> ForestParams {
        ForestParams {
            n_trees: 25,
            mtry,
            tree: TreeParams {
                max_depth: Some(10),
                min_samples_split: 2,
                min_samples_leaf: 1,
                min_gain: 0.0,
            },
            seed: 5,
        }
    }

    #[test]
    fn learns_a_separable_problem() {
        let (x, y) = separable_data();
        let forest = RandomForest::fit(&x, &y, &params(2)).unwrap();

        assert_eq!(forest.trees.len(), 25);
        assert_eq!(forest.predict(&[5.0, 0.0]), 0);
        assert_eq!(forest.predict(&[55.0, 0.0]), 1);

        let p = forest.predict_proba(&[55.0, 0.0]);
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn fixed_seed_reproduces_the_ensemble() {
        let (x, y) = separable_data();
        let a = RandomForest::fit(&x, &y, &params(1)).unwrap();
        let b = RandomForest::fit(&x, &y, &params(1)).unwrap();

        for probe in [[3.0, 1.0], [31.0, 4.0], [59.0, 2.0]] {
            assert_eq!(a.predict_proba(&probe), b.predict_proba(&probe));
        }
    }

    #[test]
    fn invalid_params_are_rejected() {
        let (x, y) = separable_data();

        let mut p = params(2);
        p.n_trees = 0;
        assert_eq!(RandomForest::fit(&x, &y, &p).unwrap_err(), LearnError::NoTrees);

        let mut p = params(2);
        p.mtry = 3;
        assert_eq!(
            RandomForest::fit(&x, &y, &p).unwrap_err(),
            LearnError::InvalidMtry {
                mtry: 3,
                n_features: 2
            }
        );
    }
}
