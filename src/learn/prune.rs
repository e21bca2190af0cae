//! Cost-complexity (weakest-link) pruning with cross-validated selection
//! of the complexity parameter.
//!
//! For an internal node `t` with subtree `T_t`, the link strength is
//! `g(t) = (R(t) - R(T_t)) / (|leaves(T_t)| - 1)` over training
//! misclassification cost. Collapsing the weakest links in order yields the
//! alpha sequence from the full tree down to the root; k-fold CV over that
//! sequence picks the alpha with minimum held-out error.

use super::LearnError;
use super::tree::{DecisionTree, Node, TreeParams, count_leaves};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

const LINK_EPS: f64 = 1e-12;

/// One step of the weakest-link sequence.
#[derive(Debug, Clone, Copy)]
pub struct PathPoint {
    pub alpha: f64,
    pub leaves: usize,
}

/// The increasing alpha sequence for a fitted tree, starting at the full
/// tree (alpha 0) and ending at the root-only tree.
pub fn cost_complexity_path(tree: &DecisionTree) -> Vec<PathPoint> {
    let n = tree.root.total();
    let mut current = tree.root.clone();
    let mut path = vec![PathPoint {
        alpha: 0.0,
        leaves: count_leaves(&current),
    }];

    while current.split.is_some() {
        let g = min_link(&current, n);
        collapse_links(&mut current, n, g + LINK_EPS);
        path.push(PathPoint {
            alpha: g,
            leaves: count_leaves(&current),
        });
    }

    path
}

/// Prune a tree at complexity `alpha`: every link at least as weak as
/// `alpha` is collapsed, bottom-up.
pub fn prune(tree: &DecisionTree, alpha: f64) -> DecisionTree {
    let n = tree.root.total();
    let mut root = tree.root.clone();
    collapse_links(&mut root, n, alpha + LINK_EPS);
    DecisionTree {
        root,
        params: tree.params.clone(),
        n_features: tree.n_features,
    }
}

/// Candidate alphas for CV: zero (full tree), the geometric midpoints of
/// consecutive positive path alphas, and the final path alpha.
pub fn alpha_candidates(path: &[PathPoint]) -> Vec<f64> {
    let positives: Vec<f64> = path.iter().map(|p| p.alpha).filter(|&a| a > 0.0).collect();

    let mut alphas = vec![0.0];
    for pair in positives.windows(2) {
        alphas.push((pair[0] * pair[1]).sqrt());
    }
    if let Some(&last) = positives.last() {
        alphas.push(last);
    }
    alphas.dedup();
    alphas
}

#[derive(Debug, Clone, Copy)]
pub struct CvPoint {
    pub alpha: f64,
    pub mean_error: f64,
}

#[derive(Debug, Clone)]
pub struct CvOutcome {
    /// Mean held-out misclassification per candidate alpha, ascending alpha.
    pub points: Vec<CvPoint>,
    pub best_alpha: f64,
    pub best_error: f64,
}

/// k-fold cross-validation over `alphas`: each fold grows its own tree
/// under `grow`, prunes it at every candidate, and scores held-out
/// misclassification. Minimum mean error wins; ties go to the larger
/// alpha (the smaller tree).
pub fn choose_alpha_by_cv(
    x: &[Vec<f64>],
    y: &[u8],
    grow: &TreeParams,
    alphas: &[f64],
    folds: usize,
    seed: u64,
) -> Result<CvOutcome, LearnError> {
    if y.is_empty() {
        return Err(LearnError::EmptyDataset);
    }
    if folds < 2 || folds > y.len() {
        return Err(LearnError::BadFoldCount {
            folds,
            rows: y.len(),
        });
    }
    if alphas.is_empty() {
        return Err(LearnError::EmptyGrid);
    }

    let assignment = fold_assignment(y.len(), folds, seed);
    let mut error_sums = vec![0.0f64; alphas.len()];

    for fold in 0..folds {
        let train: Vec<usize> = (0..y.len()).filter(|&i| assignment[i] != fold).collect();
        let val: Vec<usize> = (0..y.len()).filter(|&i| assignment[i] == fold).collect();

        let fold_tree = DecisionTree::fit_sampled(x, y, &train, grow, None, seed)?;

        for (slot, &alpha) in alphas.iter().enumerate() {
            let pruned = prune(&fold_tree, alpha);
            let miss = val
                .iter()
                .filter(|&&i| pruned.predict(&x[i]) != y[i])
                .count();
            error_sums[slot] += miss as f64 / val.len() as f64;
        }
    }

    let points: Vec<CvPoint> = alphas
        .iter()
        .zip(&error_sums)
        .map(|(&alpha, &sum)| CvPoint {
            alpha,
            mean_error: sum / folds as f64,
        })
        .collect();

    let mut best = points[0];
    for p in &points[1..] {
        if p.mean_error <= best.mean_error {
            best = *p;
        }
    }

    Ok(CvOutcome {
        points,
        best_alpha: best.alpha,
        best_error: best.mean_error,
    })
}

/// Shuffled round-robin fold labels for `n` rows.
fn fold_assignment(n: usize, folds: usize, seed: u64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    let mut assignment = vec![0usize; n];
    for (pos, &row) in order.iter().enumerate() {
        assignment[row] = pos % folds;
    }
    assignment
}

// ── Link computations ─────────────────────────────────────────────────────────

/// (misclassified among leaves, leaf count) for the subtree at `node`.
fn subtree_stats(node: &Node) -> (usize, usize) {
    match &node.split {
        None => (node.miss(), 1),
        Some(s) => {
            let (lm, ll) = subtree_stats(&s.left);
            let (rm, rl) = subtree_stats(&s.right);
            (lm + rm, ll + rl)
        }
    }
}

fn link_strength(node: &Node, n_total: usize) -> f64 {
    let (sub_miss, leaves) = subtree_stats(node);
    (node.miss() as f64 - sub_miss as f64) / (n_total as f64 * (leaves as f64 - 1.0))
}

/// Minimum link strength over all internal nodes.
fn min_link(node: &Node, n_total: usize) -> f64 {
    match &node.split {
        None => f64::INFINITY,
        Some(s) => link_strength(node, n_total)
            .min(min_link(&s.left, n_total))
            .min(min_link(&s.right, n_total)),
    }
}

/// Collapse every internal node whose link strength is below `threshold`,
/// children first so ancestors see post-collapse subtrees.
fn collapse_links(node: &mut Node, n_total: usize, threshold: f64) {
    if let Some(split) = node.split.as_mut() {
        collapse_links(&mut split.left, n_total, threshold);
        collapse_links(&mut split.right, n_total, threshold);
    } else {
        return;
    }

    if link_strength(node, n_total) <= threshold {
        node.split = None;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn noisy_data(n: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<u8>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut x = Vec::with_capacity(n);
        let mut y = Vec::with_capacity(n);
        for _ in 0..n {
            let a: f64 = rng.gen_range(0.0..1.0);
            let b: f64 = rng.gen_range(0.0..1.0);
            let mut label = u8::from(a > 0.5);
            if rng.gen_range(0.0..1.0) < 0.2 {
                label = 1 - label;
            }
            x.push(vec![a, b]);
            y.push(label);
        }
        (x, y)
    }

    fn overfit_tree(x: &[Vec<f64>], y: &[u8]) -> DecisionTree {
        DecisionTree::fit(x, y, &TreeParams::overfit(30)).unwrap()
    }

    #[test]
    fn path_is_increasing_and_ends_at_root() {
        let (x, y) = noisy_data(300, 11);
        let tree = overfit_tree(&x, &y);

        let path = cost_complexity_path(&tree);

        assert!(path.len() >= 2);
        assert_eq!(path[0].alpha, 0.0);
        assert_eq!(path[0].leaves, tree.leaf_count());
        assert_eq!(path.last().unwrap().leaves, 1);
        for pair in path.windows(2) {
            assert!(pair[1].alpha >= pair[0].alpha);
            assert!(pair[1].leaves < pair[0].leaves);
        }
    }

    #[test]
    fn pruning_shrinks_monotonically_with_alpha() {
        let (x, y) = noisy_data(300, 12);
        let tree = overfit_tree(&x, &y);

        let mut previous = tree.leaf_count();
        for alpha in [0.0005, 0.005, 0.05, 0.5] {
            let pruned = prune(&tree, alpha);
            let leaves = pruned.leaf_count();
            assert!(leaves <= previous);
            previous = leaves;
        }
        assert_eq!(prune(&tree, f64::INFINITY).leaf_count(), 1);
    }

    #[test]
    fn pruning_at_zero_keeps_the_full_tree_shape() {
        let (x, y) = noisy_data(200, 13);
        let tree = overfit_tree(&x, &y);

        // Only genuinely zero-strength links may collapse at alpha 0.
        let pruned = prune(&tree, 0.0);
        assert!(pruned.leaf_count() <= tree.leaf_count());
        assert!(pruned.leaf_count() > 1);
    }

    #[test]
    fn cv_error_of_selection_never_exceeds_full_tree_error() {
        let (x, y) = noisy_data(400, 14);
        let tree = overfit_tree(&x, &y);

        let path = cost_complexity_path(&tree);
        let alphas = alpha_candidates(&path);
        let outcome =
            choose_alpha_by_cv(&x, &y, &TreeParams::overfit(30), &alphas, 5, 21).unwrap();

        // The full tree (alpha 0) is always a candidate, so the selected
        // error can only be at or below its error on the same folds.
        assert_eq!(outcome.points[0].alpha, 0.0);
        assert!(outcome.best_error <= outcome.points[0].mean_error + 1e-12);
        assert!(outcome.points.iter().all(|p| p.mean_error >= 0.0));
    }

    #[test]
    fn cv_rejects_bad_fold_counts() {
        let (x, y) = noisy_data(10, 15);
        let err = choose_alpha_by_cv(&x, &y, &TreeParams::default(), &[0.0], 1, 0).unwrap_err();
        assert_eq!(err, LearnError::BadFoldCount { folds: 1, rows: 10 });
    }
}
