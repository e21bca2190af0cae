//! Tree learners and their evaluation metrics.
//!
//! Everything here is fit by deterministic, seed-driven search — no
//! external ML framework. The classification tree does recursive binary
//! splitting on Gini impurity; the forest bags mtry-sampled trees on top
//! of it; pruning and the mtry grid both select by cross-validation.

pub mod forest;
pub mod grid;
pub mod metrics;
pub mod prune;
pub mod tree;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LearnError {
    #[error("training data is empty")]
    EmptyDataset,

    #[error("row has {found} features, expected {expected}")]
    FeatureMismatch { expected: usize, found: usize },

    #[error("invalid mtry {mtry}: must be between 1 and {n_features}")]
    InvalidMtry { mtry: usize, n_features: usize },

    #[error("forest needs at least one tree")]
    NoTrees,

    #[error("cross-validation needs at least 2 folds and one row per fold, got {folds} folds for {rows} rows")]
    BadFoldCount { folds: usize, rows: usize },

    #[error("candidate grid is empty")]
    EmptyGrid,

    #[error("scores and labels must have equal non-zero length")]
    BadEvalInput,

    #[error("labels contain a single class; metric undefined")]
    SingleClass,
}
