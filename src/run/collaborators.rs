//! Trait seams for the external collaborators the epoch runners drive.
//!
//! The runners own no numerics of their own: forward passes, gradient
//! computation and parameter updates all live behind these traits, and any
//! failure they report aborts the epoch immediately. Training is fail-fast
//! by design; a flawed batch halts the run rather than being skipped.

use std::fmt;

use crate::math::matrix::Matrix;
use crate::metric::accuracy::MetricError;
use crate::data::source::DatasetError;

/// A collaborator or data-source failure that aborts the current epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunError(pub String);

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for RunError {}

impl From<MetricError> for RunError {
    fn from(err: MetricError) -> Self {
        RunError(err.to_string())
    }
}

impl From<DatasetError> for RunError {
    fn from(err: DatasetError) -> Self {
        RunError(err.to_string())
    }
}

/// A batched classifier: maps an opaque input batch to an N×C score matrix,
/// one row of class scores per example.
pub trait Model {
    type Input;

    fn forward(&mut self, inputs: &Self::Input) -> Result<Matrix, RunError>;
}

/// A model that can backpropagate a scalar loss, accumulating gradients for
/// the paired optimizer to consume.
pub trait TrainableModel: Model {
    fn backward(&mut self, loss: f64) -> Result<(), RunError>;
}

/// Parameter-update contract: clear accumulated gradients, apply one step.
pub trait Optimizer {
    fn reset_gradients(&mut self);

    fn step(&mut self) -> Result<(), RunError>;
}

/// Batched loss: (score matrix, true labels) → scalar.
pub trait LossFunction {
    fn loss(&self, scores: &Matrix, labels: &[usize]) -> Result<f64, RunError>;
}

/// Loss-scaling collaborator for mixed-precision training. The epoch loop
/// calls `scale` before backward and `step`/`update` after; `step` must
/// unscale accumulated gradients before applying the optimizer, otherwise
/// the update is silently wrong.
pub trait GradScaler {
    fn scale(&self, loss: f64) -> f64;

    fn step<O: Optimizer>(&mut self, optimizer: &mut O) -> Result<(), RunError>;

    fn update(&mut self);
}

/// Moves an input batch onto the compute device before the forward pass.
pub trait Device<I> {
    fn transfer(&self, inputs: I) -> Result<I, RunError>;
}

/// Identity transfer for models that compute where the data already lives.
pub struct HostDevice;

impl<I> Device<I> for HostDevice {
    fn transfer(&self, inputs: I) -> Result<I, RunError> {
        Ok(inputs)
    }
}

/// One labeled batch: an opaque input and its aligned class labels.
/// The number of labels is the batch's example count.
pub struct Batch<I> {
    pub inputs: I,
    pub labels: Vec<usize>,
}

impl<I> Batch<I> {
    pub fn size(&self) -> usize {
        self.labels.len()
    }
}

/// A finite, restartable sequence of labeled batches with a length known in
/// advance. Batches are consumed strictly in delivery order; a `None` ends
/// the pass and `reset` rewinds for the next one.
pub trait BatchSource {
    type Input;

    /// Total number of batches one full pass delivers.
    fn num_batches(&self) -> usize;

    fn reset(&mut self);

    fn next_batch(&mut self) -> Option<Result<Batch<Self::Input>, RunError>>;
}
