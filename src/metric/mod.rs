pub mod average;
pub mod progress;
pub mod accuracy;

pub use average::{AverageMeter, ValueFormat};
pub use progress::ProgressMeter;
pub use accuracy::{top_k_accuracy, MetricError};
