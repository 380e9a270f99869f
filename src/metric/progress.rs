use std::time::{SystemTime, UNIX_EPOCH};

use crate::metric::average::AverageMeter;

/// Renders a set of meters plus a batch index as one progress line:
///
/// ```text
/// <prefix>[<batch>/<total>]\t<meter>\t<meter>...
/// ```
///
/// The batch index is right-aligned to the digit width of the total batch
/// count. Rendering is read-only; the meters stay owned by the epoch loop
/// and are borrowed per call.
#[derive(Debug, Clone)]
pub struct ProgressMeter {
    num_batches: usize,
    batch_width: usize,
    prefix: String,
}

impl ProgressMeter {
    pub fn new(num_batches: usize, prefix: impl Into<String>) -> ProgressMeter {
        ProgressMeter {
            num_batches,
            batch_width: num_batches.to_string().len(),
            prefix: prefix.into(),
        }
    }

    /// Builds the progress line for `batch`. The index is not range-checked;
    /// callers may render one-past-the-end as a final summary line.
    pub fn render(&self, batch: usize, meters: &[&AverageMeter]) -> String {
        let mut entries = vec![format!(
            "{}[{:>width$}/{}]",
            self.prefix,
            batch,
            self.num_batches,
            width = self.batch_width
        )];
        entries.extend(meters.iter().map(|m| m.to_string()));
        entries.join("\t")
    }

    pub fn display(&self, batch: usize, meters: &[&AverageMeter]) {
        println!("{}", self.render(batch, meters));
    }
}

/// Current wall-clock time of day as `HH:MM:SS` (UTC), used to prefix
/// progress and summary lines.
pub fn wall_clock_hms() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!(
        "{:02}:{:02}:{:02}",
        (secs / 3600) % 24,
        (secs / 60) % 60,
        secs % 60
    )
}
