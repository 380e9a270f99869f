use std::cmp::Ordering;
use std::fmt;

use crate::math::matrix::Matrix;

/// Invalid-argument errors raised by [`top_k_accuracy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricError {
    /// A requested rank was zero or exceeded the class count.
    RankOutOfRange { k: usize, classes: usize },
    /// `labels` and `scores` disagree on the batch size.
    LengthMismatch { labels: usize, rows: usize },
}

impl fmt::Display for MetricError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricError::RankOutOfRange { k, classes } => {
                write!(f, "rank k={} is out of range for {} classes", k, classes)
            }
            MetricError::LengthMismatch { labels, rows } => {
                write!(f, "{} labels for {} score rows", labels, rows)
            }
        }
    }
}

impl std::error::Error for MetricError {}

/// Computes the top-k accuracy of a batch of score rows for each rank in
/// `topk`, as percentages in [0, 100] aligned with `topk`.
///
/// An example counts as correct for rank k when its true label is among the
/// k highest-scoring classes of its row. Ties are broken by a stable
/// descending sort, so the lower class index wins.
///
/// Stateless: callers feed the results into an [`AverageMeter`]
/// (weighted by the batch size) when running averages are wanted.
///
/// # Errors
/// Returns [`MetricError`] when any rank is zero or larger than the class
/// count, or when the label count does not match the row count.
///
/// # Panics
/// Panics on an empty batch; the caller must guarantee at least one row.
///
/// [`AverageMeter`]: crate::metric::average::AverageMeter
pub fn top_k_accuracy(
    scores: &Matrix,
    labels: &[usize],
    topk: &[usize],
) -> Result<Vec<f64>, MetricError> {
    assert!(scores.rows > 0, "top_k_accuracy requires a non-empty batch");

    if labels.len() != scores.rows {
        return Err(MetricError::LengthMismatch {
            labels: labels.len(),
            rows: scores.rows,
        });
    }
    for &k in topk {
        if k == 0 || k > scores.cols {
            return Err(MetricError::RankOutOfRange { k, classes: scores.cols });
        }
    }

    // Rank of each example's true label within its descending-sorted row.
    let ranks: Vec<usize> = (0..scores.rows)
        .map(|i| label_rank(scores.row(i), labels[i]))
        .collect();

    let batch = scores.rows as f64;
    Ok(topk
        .iter()
        .map(|&k| {
            let correct = ranks.iter().filter(|&&r| r < k).count();
            100.0 * correct as f64 / batch
        })
        .collect())
}

/// Position of `label` in the descending ordering of `row` (0 = highest
/// score). Stable: equal scores keep their original index order.
fn label_rank(row: &[f64], label: usize) -> usize {
    let mut order: Vec<usize> = (0..row.len()).collect();
    order.sort_by(|&a, &b| row[b].partial_cmp(&row[a]).unwrap_or(Ordering::Equal));
    order
        .iter()
        .position(|&c| c == label)
        .unwrap_or(row.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_examples_correct_at_top_one() {
        let scores = Matrix::from_data(vec![vec![0.1, 0.9], vec![0.8, 0.2]]);
        let acc = top_k_accuracy(&scores, &[1, 0], &[1, 2]).unwrap();
        assert_eq!(acc, vec![100.0, 100.0]);
    }

    #[test]
    fn half_correct_at_top_one() {
        let scores = Matrix::from_data(vec![vec![0.9, 0.1], vec![0.8, 0.2]]);
        let acc = top_k_accuracy(&scores, &[1, 0], &[1]).unwrap();
        assert_eq!(acc, vec![50.0]);
    }

    #[test]
    fn monotone_in_k_and_full_rank_is_total() {
        let scores = Matrix::from_data(vec![
            vec![0.0, 0.2, 0.8, 0.1],
            vec![1.0, 2.0, 0.5, -1.0],
            vec![0.4, 0.1, 0.2, 0.3],
        ]);
        let labels = [3, 2, 1];
        let acc = top_k_accuracy(&scores, &labels, &[1, 2, 3, 4]).unwrap();
        for pair in acc.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        assert_eq!(*acc.last().unwrap(), 100.0);
    }

    #[test]
    fn ties_resolve_to_lower_index() {
        // Classes 0 and 1 tie; the stable ordering puts class 0 first.
        let scores = Matrix::from_data(vec![vec![0.5, 0.5, 0.0]]);
        assert_eq!(top_k_accuracy(&scores, &[0], &[1]).unwrap(), vec![100.0]);
        assert_eq!(top_k_accuracy(&scores, &[1], &[1]).unwrap(), vec![0.0]);
        assert_eq!(top_k_accuracy(&scores, &[1], &[2]).unwrap(), vec![100.0]);
    }

    #[test]
    fn rank_beyond_class_count_is_an_error() {
        let scores = Matrix::from_data(vec![vec![0.1, 0.9]]);
        let err = top_k_accuracy(&scores, &[1], &[3]).unwrap_err();
        assert_eq!(err, MetricError::RankOutOfRange { k: 3, classes: 2 });
    }

    #[test]
    fn label_count_must_match_rows() {
        let scores = Matrix::from_data(vec![vec![0.1, 0.9], vec![0.3, 0.7]]);
        let err = top_k_accuracy(&scores, &[1], &[1]).unwrap_err();
        assert_eq!(err, MetricError::LengthMismatch { labels: 1, rows: 2 });
    }
}
