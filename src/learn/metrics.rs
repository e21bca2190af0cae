//! ROC curves, AUC, and threshold metrics for binary scores.

use super::LearnError;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RocPoint {
    pub threshold: f64,
    pub fpr: f64,
    pub tpr: f64,
}

/// ROC curve from predicted positive-class scores vs. true labels.
///
/// Points run from (0, 0) at an infinite threshold to (1, 1); tied scores
/// advance the curve in one step.
pub fn roc_curve(scores: &[f64], labels: &[u8]) -> Result<Vec<RocPoint>, LearnError> {
    if scores.is_empty() || scores.len() != labels.len() {
        return Err(LearnError::BadEvalInput);
    }
    let pos = labels.iter().filter(|&&l| l == 1).count();
    let neg = labels.len() - pos;
    if pos == 0 || neg == 0 {
        return Err(LearnError::SingleClass);
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
    });

    let mut points = vec![RocPoint {
        threshold: f64::INFINITY,
        fpr: 0.0,
        tpr: 0.0,
    }];

    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut i = 0usize;
    while i < order.len() {
        let threshold = scores[order[i]];
        while i < order.len() && scores[order[i]] == threshold {
            if labels[order[i]] == 1 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push(RocPoint {
            threshold,
            fpr: fp as f64 / neg as f64,
            tpr: tp as f64 / pos as f64,
        });
    }

    Ok(points)
}

/// Trapezoidal area under a ROC curve.
pub fn auc(points: &[RocPoint]) -> f64 {
    let mut area = 0.0;
    for pair in points.windows(2) {
        let width = pair[1].fpr - pair[0].fpr;
        area += width * (pair[0].tpr + pair[1].tpr) / 2.0;
    }
    area
}

/// AUC straight from scores and labels.
pub fn roc_auc(scores: &[f64], labels: &[u8]) -> Result<f64, LearnError> {
    Ok(auc(&roc_curve(scores, labels)?))
}

/// Confusion matrix at a score threshold, indexed [actual][predicted].
pub fn confusion_at(scores: &[f64], labels: &[u8], threshold: f64) -> [[usize; 2]; 2] {
    let mut m = [[0usize; 2]; 2];
    for (&score, &label) in scores.iter().zip(labels) {
        let predicted = usize::from(score >= threshold);
        m[label as usize][predicted] += 1;
    }
    m
}

pub fn accuracy(confusion: &[[usize; 2]; 2]) -> f64 {
    let correct = confusion[0][0] + confusion[1][1];
    let total: usize = confusion.iter().flatten().sum();
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_ranking_has_unit_auc() {
        let scores = [0.9, 0.8, 0.2, 0.1];
        let labels = [1, 1, 0, 0];
        assert!((roc_auc(&scores, &labels).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn inverted_ranking_has_zero_auc() {
        let scores = [0.1, 0.2, 0.8, 0.9];
        let labels = [1, 1, 0, 0];
        assert!(roc_auc(&scores, &labels).unwrap().abs() < 1e-12);
    }

    #[test]
    fn interleaved_ranking_matches_hand_computation() {
        // Positive at ranks 1 and 3 → 3 of 4 concordant pairs.
        let scores = [0.9, 0.8, 0.7, 0.6];
        let labels = [1, 0, 1, 0];
        assert!((roc_auc(&scores, &labels).unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn curve_runs_monotonically_from_origin_to_unit() {
        let scores = [0.9, 0.7, 0.7, 0.4, 0.2];
        let labels = [1, 0, 1, 1, 0];

        let curve = roc_curve(&scores, &labels).unwrap();

        assert_eq!(curve.first().unwrap().fpr, 0.0);
        assert_eq!(curve.first().unwrap().tpr, 0.0);
        assert_eq!(curve.last().unwrap().fpr, 1.0);
        assert_eq!(curve.last().unwrap().tpr, 1.0);
        for pair in curve.windows(2) {
            assert!(pair[1].fpr >= pair[0].fpr);
            assert!(pair[1].tpr >= pair[0].tpr);
        }
    }

    #[test]
    fn degenerate_inputs_are_errors() {
        assert_eq!(roc_curve(&[], &[]).unwrap_err(), LearnError::BadEvalInput);
        assert_eq!(
            roc_curve(&[0.4, 0.6], &[1, 1]).unwrap_err(),
            LearnError::SingleClass
        );
    }

    #[test]
    fn confusion_and_accuracy_at_half() {
        let scores = [0.9, 0.4, 0.6, 0.1];
        let labels = [1, 1, 0, 0];

        let m = confusion_at(&scores, &labels, 0.5);
        assert_eq!(m, [[1, 1], [1, 1]]);
        assert!((accuracy(&m) - 0.5).abs() < 1e-12);
    }
}
