use serde::{Serialize, Deserialize};
use std::fmt;

/// Fixed-point rendering of a meter value: `width` is the minimum total
/// character count (space-padded on the left, 0 for no padding) and
/// `precision` the number of digits after the decimal point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueFormat {
    pub width: usize,
    pub precision: usize,
}

impl ValueFormat {
    pub fn new(width: usize, precision: usize) -> ValueFormat {
        ValueFormat { width, precision }
    }
}

impl Default for ValueFormat {
    fn default() -> Self {
        ValueFormat { width: 0, precision: 4 }
    }
}

/// Computes and stores the weighted running average and current value of a
/// scalar metric.
///
/// Created once per metric per epoch; the epoch loop feeds it one
/// `update(value, weight)` per batch, with the batch's example count as the
/// weight. The invariant `avg == sum / count` holds whenever `count > 0`;
/// a meter that has never been updated reports an average of zero.
#[derive(Debug, Clone)]
pub struct AverageMeter {
    pub name: String,
    pub fmt: ValueFormat,
    /// Last raw value passed to `update`, kept for display.
    pub val: f64,
    pub sum: f64,
    pub count: f64,
    pub avg: f64,
}

impl AverageMeter {
    pub fn new(name: impl Into<String>, fmt: ValueFormat) -> AverageMeter {
        AverageMeter {
            name: name.into(),
            fmt,
            val: 0.0,
            sum: 0.0,
            count: 0.0,
            avg: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.val = 0.0;
        self.sum = 0.0;
        self.count = 0.0;
        self.avg = 0.0;
    }

    /// Folds one observation into the running average. `weight` is expected
    /// to be positive; it is not validated.
    pub fn update(&mut self, value: f64, weight: f64) {
        self.val = value;
        self.sum += value * weight;
        self.count += weight;
        self.avg = self.sum / self.count;
    }
}

impl fmt::Display for AverageMeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:>width$.prec$}",
            self.name,
            self.avg,
            width = self.fmt.width,
            prec = self.fmt.precision
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_is_weighted_mean() {
        let mut m = AverageMeter::new("Loss", ValueFormat::default());
        m.update(1.0, 2.0);
        m.update(4.0, 1.0);
        // (1*2 + 4*1) / 3
        assert!((m.avg - 2.0).abs() < 1e-12);
        assert_eq!(m.val, 4.0);
        assert_eq!(m.count, 3.0);
    }

    #[test]
    fn reset_then_update_matches_fresh_meter() {
        let mut used = AverageMeter::new("Acc@1", ValueFormat::new(6, 2));
        used.update(10.0, 5.0);
        used.update(90.0, 5.0);
        used.reset();
        used.update(75.0, 4.0);

        let mut fresh = AverageMeter::new("Acc@1", ValueFormat::new(6, 2));
        fresh.update(75.0, 4.0);

        assert_eq!(used.avg, fresh.avg);
        assert_eq!(used.sum, fresh.sum);
        assert_eq!(used.count, fresh.count);
        assert_eq!(used.val, fresh.val);
    }

    #[test]
    fn untouched_meter_reports_zero() {
        let m = AverageMeter::new("Time", ValueFormat::default());
        assert_eq!(m.avg, 0.0);
    }

    #[test]
    fn display_uses_width_and_precision() {
        let mut m = AverageMeter::new("Time", ValueFormat::new(6, 2));
        m.update(1.5, 1.0);
        assert_eq!(m.to_string(), "Time   1.50");

        let mut bare = AverageMeter::new("Loss", ValueFormat::new(0, 2));
        bare.update(0.25, 1.0);
        assert_eq!(bare.to_string(), "Loss 0.25");
    }
}
