use crate::run::collaborators::{GradScaler, Optimizer, RunError, TrainableModel};

/// One complete parameter update from a batch loss. The training loop body
/// is written once and the precision handling is chosen here at
/// configuration time, instead of branching inside the loop.
pub trait StepStrategy<M: TrainableModel, O: Optimizer> {
    fn apply(&mut self, model: &mut M, optimizer: &mut O, loss: f64) -> Result<(), RunError>;
}

/// Full-precision update: reset gradients, backpropagate, step.
pub struct StandardStep;

impl<M: TrainableModel, O: Optimizer> StepStrategy<M, O> for StandardStep {
    fn apply(&mut self, model: &mut M, optimizer: &mut O, loss: f64) -> Result<(), RunError> {
        optimizer.reset_gradients();
        model.backward(loss)?;
        optimizer.step()
    }
}

/// Mixed-precision update through a gradient scaler.
///
/// The ordering is fixed: reset gradients, backpropagate the scaled loss,
/// let the scaler step the optimizer (unscaling first), then refresh the
/// scale factor. Reordering these corrupts gradients.
pub struct ScaledStep<G: GradScaler> {
    pub scaler: G,
}

impl<G: GradScaler> ScaledStep<G> {
    pub fn new(scaler: G) -> Self {
        ScaledStep { scaler }
    }
}

impl<M: TrainableModel, O: Optimizer, G: GradScaler> StepStrategy<M, O> for ScaledStep<G> {
    fn apply(&mut self, model: &mut M, optimizer: &mut O, loss: f64) -> Result<(), RunError> {
        optimizer.reset_gradients();
        let scaled = self.scaler.scale(loss);
        model.backward(scaled)?;
        self.scaler.step(optimizer)?;
        self.scaler.update();
        Ok(())
    }
}
