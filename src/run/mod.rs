pub mod collaborators;
pub mod step;
pub mod config;
pub mod summary;
pub mod epoch;

pub use collaborators::{
    Batch, BatchSource, Device, GradScaler, HostDevice, LossFunction, Model, Optimizer, RunError,
    TrainableModel,
};
pub use step::{ScaledStep, StandardStep, StepStrategy};
pub use config::RunConfig;
pub use summary::{EpochSummary, RunHistory};
pub use epoch::{evaluate_ensemble, evaluate_epoch, train_epoch};
