use rand::seq::SliceRandom;

use crate::data::source::{Example, ExampleSource};
use crate::math::matrix::Matrix;
use crate::run::collaborators::{Batch, BatchSource, RunError};

/// Assembles an [`ExampleSource`] into fixed-size batches of row-stacked
/// inputs. With `shuffle`, the visit order is re-randomized on every
/// `reset`, i.e. once per epoch; without it, indices run in order. Every
/// index is visited exactly once per pass and the final batch may be short.
pub struct Batcher<'a, S: ExampleSource> {
    source: &'a S,
    batch_size: usize,
    shuffle: bool,
    order: Vec<usize>,
    cursor: usize,
}

impl<'a, S: ExampleSource> Batcher<'a, S> {
    pub fn new(source: &'a S, batch_size: usize, shuffle: bool) -> Batcher<'a, S> {
        assert!(batch_size > 0, "batch_size must be at least 1");
        let mut batcher = Batcher {
            source,
            batch_size,
            shuffle,
            order: (0..source.len()).collect(),
            cursor: 0,
        };
        if shuffle {
            batcher.order.shuffle(&mut rand::thread_rng());
        }
        batcher
    }

    /// Sequential input-only batches for the prediction helpers. Accepts
    /// labeled and unlabeled examples; labels are dropped.
    pub fn input_batches(&self) -> impl Iterator<Item = Result<Matrix, RunError>> + '_ {
        let n = self.source.len();
        (0..n).step_by(self.batch_size).map(move |start| {
            let end = (start + self.batch_size).min(n);
            let mut rows = Vec::with_capacity(end - start);
            for idx in start..end {
                match self.source.get(idx)? {
                    Example::Labeled { input, .. } | Example::Unlabeled { input } => {
                        rows.push(input)
                    }
                    Example::DualView { .. } => {
                        return Err(RunError(format!(
                            "example {} is dual-view; expected a single input",
                            idx
                        )))
                    }
                }
            }
            rows_to_matrix(rows)
        })
    }

    /// Sequential dual-view batches, one matrix per view, for
    /// softmax-averaging prediction.
    pub fn view_batches(&self) -> impl Iterator<Item = Result<(Matrix, Matrix), RunError>> + '_ {
        let n = self.source.len();
        (0..n).step_by(self.batch_size).map(move |start| {
            let end = (start + self.batch_size).min(n);
            let mut firsts = Vec::with_capacity(end - start);
            let mut seconds = Vec::with_capacity(end - start);
            for idx in start..end {
                match self.source.get(idx)? {
                    Example::DualView { first, second } => {
                        firsts.push(first);
                        seconds.push(second);
                    }
                    _ => {
                        return Err(RunError(format!(
                            "example {} is not dual-view",
                            idx
                        )))
                    }
                }
            }
            Ok((rows_to_matrix(firsts)?, rows_to_matrix(seconds)?))
        })
    }
}

impl<S: ExampleSource> BatchSource for Batcher<'_, S> {
    type Input = Matrix;

    fn num_batches(&self) -> usize {
        (self.source.len() + self.batch_size - 1) / self.batch_size
    }

    fn reset(&mut self) {
        self.cursor = 0;
        if self.shuffle {
            self.order.shuffle(&mut rand::thread_rng());
        }
    }

    fn next_batch(&mut self) -> Option<Result<Batch<Matrix>, RunError>> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let picked = &self.order[self.cursor..end];
        self.cursor = end;

        let mut rows = Vec::with_capacity(picked.len());
        let mut labels = Vec::with_capacity(picked.len());
        for &idx in picked {
            match self.source.get(idx) {
                Ok(Example::Labeled { input, label }) => {
                    rows.push(input);
                    labels.push(label);
                }
                Ok(_) => {
                    return Some(Err(RunError(format!(
                        "example {} carries no label; training batches require labeled examples",
                        idx
                    ))))
                }
                Err(e) => return Some(Err(e.into())),
            }
        }

        Some(rows_to_matrix(rows).map(|inputs| Batch { inputs, labels }))
    }
}

fn rows_to_matrix(rows: Vec<Vec<f64>>) -> Result<Matrix, RunError> {
    if let Some(width) = rows.first().map(|r| r.len()) {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(RunError(format!(
                    "input width {} at batch row {} does not match first row's {}",
                    row.len(),
                    i,
                    width
                )));
            }
        }
    }
    Ok(Matrix::from_data(rows))
}
