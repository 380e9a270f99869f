//! Inference helpers that sweep a model over unlabeled batches.
//!
//! Batches arrive as `Result` items so that source failures (e.g. an
//! undecodable image) propagate and abort the sweep, matching the
//! fail-fast contract of the epoch runners.

use crate::math::matrix::Matrix;
use crate::run::collaborators::{Model, RunError};

/// Predicts a class per example: returns aligned vectors of argmax class
/// indices and their softmax confidences, concatenated across batches.
pub fn predict<M, I>(model: &mut M, batches: I) -> Result<(Vec<usize>, Vec<f64>), RunError>
where
    M: Model,
    I: IntoIterator<Item = Result<M::Input, RunError>>,
{
    let mut classes = Vec::new();
    let mut confidences = Vec::new();

    for batch in batches {
        let inputs = batch?;
        let probs = model.forward(&inputs)?.softmax_rows();
        for row in &probs.data {
            let best = argmax(row);
            classes.push(best);
            confidences.push(row[best]);
        }
    }

    Ok((classes, confidences))
}

/// Averaged softmax distributions over dual-view batches: each item yields
/// two views of the same examples, and the result stacks the per-example
/// mean of the two softmax-normalized forward passes.
pub fn predict_softmax<M, I>(model: &mut M, batches: I) -> Result<Matrix, RunError>
where
    M: Model,
    I: IntoIterator<Item = Result<(M::Input, M::Input), RunError>>,
{
    let mut out = Matrix::default();

    for batch in batches {
        let (first, second) = batch?;
        let mixed = (model.forward(&first)?.softmax_rows()
            + model.forward(&second)?.softmax_rows())
        .map(|x| x * 0.5);
        out.extend_rows(mixed);
    }

    Ok(out)
}

/// Raw forward outputs stacked row-wise, for use as learned representations.
pub fn predict_repre<M, I>(model: &mut M, batches: I) -> Result<Matrix, RunError>
where
    M: Model,
    I: IntoIterator<Item = Result<M::Input, RunError>>,
{
    let mut out = Matrix::default();

    for batch in batches {
        let inputs = batch?;
        out.extend_rows(model.forward(&inputs)?);
    }

    Ok(out)
}

/// Index of the maximum element in a slice.
fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
