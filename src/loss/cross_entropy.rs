use crate::math::matrix::Matrix;
use crate::run::collaborators::{LossFunction, RunError};

/// Categorical cross-entropy over raw logits with integer class labels.
///
/// Applies a row-wise softmax internally and returns the mean negative log
/// likelihood of the true classes across the batch.
pub struct CrossEntropyLoss;

/// Small epsilon added inside log() to prevent log(0) = -inf.
const EPS: f64 = 1e-12;

impl LossFunction for CrossEntropyLoss {
    fn loss(&self, scores: &Matrix, labels: &[usize]) -> Result<f64, RunError> {
        if labels.len() != scores.rows {
            return Err(RunError(format!(
                "cross-entropy: {} labels for {} score rows",
                labels.len(),
                scores.rows
            )));
        }
        let probs = scores.softmax_rows();
        let mut total = 0.0;
        for (i, &label) in labels.iter().enumerate() {
            let row = probs.row(i);
            if label >= row.len() {
                return Err(RunError(format!(
                    "cross-entropy: label {} out of range for {} classes",
                    label,
                    row.len()
                )));
            }
            total += -(row[label] + EPS).ln();
        }
        Ok(total / labels.len() as f64)
    }
}
