pub mod math;
pub mod metric;
pub mod loss;
pub mod run;
pub mod predict;
pub mod data;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use metric::average::{AverageMeter, ValueFormat};
pub use metric::progress::ProgressMeter;
pub use metric::accuracy::top_k_accuracy;
pub use loss::cross_entropy::CrossEntropyLoss;
pub use run::collaborators::{
    Batch, BatchSource, Device, GradScaler, HostDevice, LossFunction, Model, Optimizer, RunError,
    TrainableModel,
};
pub use run::step::{ScaledStep, StandardStep, StepStrategy};
pub use run::config::RunConfig;
pub use run::summary::{EpochSummary, RunHistory};
pub use run::epoch::{evaluate_ensemble, evaluate_epoch, train_epoch};
pub use predict::{predict, predict_repre, predict_softmax};
pub use data::batcher::Batcher;
pub use data::image_folder::{ImageDecode, ImageFolder};
pub use data::source::{DatasetError, Example, ExampleSource, SampleMode};
