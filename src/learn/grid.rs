//! Grid search over the forest's per-split feature count (mtry),
//! k-fold cross-validated and scored by held-out AUC.

use super::LearnError;
use super::forest::{ForestParams, RandomForest};
use super::metrics::roc_auc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct GridPoint {
    pub mtry: usize,
    pub fold_aucs: Vec<f64>,
    pub mean_auc: f64,
}

#[derive(Debug, Clone)]
pub struct GridSearch {
    /// One row per candidate, ascending mtry.
    pub points: Vec<GridPoint>,
    pub best_mtry: usize,
    pub best_auc: f64,
}

/// Default candidates bracketing the square root of the feature count.
pub fn default_mtry_grid(n_features: usize) -> Vec<usize> {
    let root = (n_features as f64).sqrt().round() as usize;
    let mut grid = vec![root / 2, root, root * 2];
    for m in &mut grid {
        *m = (*m).clamp(1, n_features);
    }
    grid.sort_unstable();
    grid.dedup();
    grid
}

/// k-fold CV over `grid`: every candidate fits one forest per fold and is
/// scored by mean validation AUC. Maximum mean AUC wins; ties go to the
/// smaller mtry.
pub fn search_mtry(
    x: &[Vec<f64>],
    y: &[u8],
    base: &ForestParams,
    grid: &[usize],
    folds: usize,
    seed: u64,
) -> Result<GridSearch, LearnError> {
    if y.is_empty() {
        return Err(LearnError::EmptyDataset);
    }
    if grid.is_empty() {
        return Err(LearnError::EmptyGrid);
    }
    if folds < 2 || folds > y.len() {
        return Err(LearnError::BadFoldCount {
            folds,
            rows: y.len(),
        });
    }

    let mut candidates = grid.to_vec();
    candidates.sort_unstable();
    candidates.dedup();

    let assignment = fold_assignment(y.len(), folds, seed);
    let mut points = Vec::with_capacity(candidates.len());

    for &mtry in &candidates {
        let mut fold_aucs = Vec::with_capacity(folds);

        for fold in 0..folds {
            let (train_x, train_y, val_x, val_y) = split_fold(x, y, &assignment, fold);

            let params = ForestParams {
                mtry,
                ..base.clone()
            };
            let forest = RandomForest::fit(&train_x, &train_y, &params)?;

            let scores: Vec<f64> = val_x.iter().map(|row| forest.predict_proba(row)).collect();
            let auc = roc_auc(&scores, &val_y)?;
            debug!("mtry={} fold={}: AUC {:.4}", mtry, fold, auc);
            fold_aucs.push(auc);
        }

        let mean_auc = fold_aucs.iter().sum::<f64>() / fold_aucs.len() as f64;
        info!("mtry={}: mean CV AUC {:.4}", mtry, mean_auc);
        points.push(GridPoint {
            mtry,
            fold_aucs,
            mean_auc,
        });
    }

    let mut best = &points[0];
    for p in &points[1..] {
        if p.mean_auc > best.mean_auc {
            best = p;
        }
    }

    Ok(GridSearch {
        best_mtry: best.mtry,
        best_auc: best.mean_auc,
        points,
    })
}

fn fold_assignment(n: usize, folds: usize, seed: u64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    let mut assignment = vec![0usize; n];
    for (pos, &row) in order.iter().enumerate() {
        assignment[row] = pos % folds;
    }
    assignment
}

#[allow(clippy::type_complexity)]
fn split_fold(
    x: &[Vec<f64>],
    y: &[u8],
    assignment: &[usize],
    fold: usize,
) -> (Vec<Vec<f64>>, Vec<u8>, Vec<Vec<f64>>, Vec<u8>) {
    let mut train_x = Vec::new();
    let mut train_y = Vec::new();
    let mut val_x = Vec::new();
    let mut val_y = Vec::new();

    for i in 0..y.len() {
        if assignment[i] == fold {
            val_x.push(x[i].clone());
            val_y.push(y[i]);
        } else {
            train_x.push(x[i].clone());
            train_y.push(y[i]);
        }
    }

    (train_x, train_y, val_x, val_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learn::tree::TreeParams;
    use rand::Rng;

    fn data(n: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<u8>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut x = Vec::with_capacity(n);
        let mut y = Vec::with_capacity(n);
        for _ in 0..n {
            let a: f64 = rng.gen_range(0.0..1.0);
            let b: f64 = rng.gen_range(0.0..1.0);
            let c: f64 = rng.gen_range(0.0..1.0);
            x.push(vec![a, b, c]);
            y.push(u8::from(a + 0.3 * b > 0.6));
        }
        (x, y)
    }

    fn base() -> ForestParams {
        ForestParams {
            n_trees: 10,
            mtry: 1,
            tree: TreeParams {
                max_depth: Some(6),
                min_samples_split: 2,
                min_samples_leaf: 1,
                min_gain: 0.0,
            },
            seed: 3,
        }
    }

    #[test]
    fn default_grid_brackets_the_square_root() {
        assert_eq!(default_mtry_grid(100), vec![5, 10, 20]);
        assert_eq!(default_mtry_grid(4), vec![1, 2, 4]);
        assert_eq!(default_mtry_grid(1), vec![1]);
    }

    #[test]
    fn search_scores_every_candidate_and_picks_one() {
        let (x, y) = data(120, 8);
        let grid = [1, 2, 3];

        let search = search_mtry(&x, &y, &base(), &grid, 3, 17).unwrap();

        assert_eq!(search.points.len(), 3);
        assert!(grid.contains(&search.best_mtry));
        for point in &search.points {
            assert_eq!(point.fold_aucs.len(), 3);
            assert!(point.mean_auc > 0.0 && point.mean_auc <= 1.0);
            assert!(point.mean_auc <= search.best_auc);
        }
    }

    #[test]
    fn search_is_reproducible() {
        let (x, y) = data(90, 9);
        let a = search_mtry(&x, &y, &base(), &[1, 3], 3, 5).unwrap();
        let b = search_mtry(&x, &y, &base(), &[1, 3], 3, 5).unwrap();

        assert_eq!(a.best_mtry, b.best_mtry);
        assert_eq!(
            a.points.iter().map(|p| p.mean_auc).collect::<Vec<_>>(),
            b.points.iter().map(|p| p.mean_auc).collect::<Vec<_>>()
        );
    }

    #[test]
    fn empty_grid_is_an_error() {
        let (x, y) = data(30, 10);
        assert_eq!(
            search_mtry(&x, &y, &base(), &[], 3, 0).unwrap_err(),
            LearnError::EmptyGrid
        );
    }
}
