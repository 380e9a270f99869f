//! Single-pass epoch loops. Each one drives the collaborator traits over a
//! batch source, feeds the per-batch scalars into meters, and returns the
//! epoch-level averages. Any collaborator or source error propagates
//! immediately and aborts the pass.

use std::time::Instant;

use crate::metric::accuracy::top_k_accuracy;
use crate::metric::average::{AverageMeter, ValueFormat};
use crate::metric::progress::{wall_clock_hms, ProgressMeter};
use crate::run::collaborators::{
    BatchSource, Device, LossFunction, Model, Optimizer, RunError, TrainableModel,
};
use crate::run::config::RunConfig;
use crate::run::step::StepStrategy;
use crate::run::summary::EpochSummary;

fn accuracy_meters(topk: &[usize], fmt: ValueFormat) -> Vec<AverageMeter> {
    topk.iter()
        .map(|k| AverageMeter::new(format!("Acc@{}", k), fmt))
        .collect()
}

/// Runs one training pass over `source`.
///
/// Per batch: waits for the batch (tracked as `Data` time), transfers it to
/// the device, runs the forward pass and loss, applies exactly one strategy
/// step, then folds loss and top-k accuracy into the meters weighted by the
/// batch's example count. The optimizer therefore steps once per delivered
/// batch. A final progress line is printed when the pass completes.
pub fn train_epoch<M, S, O, L, St, D>(
    model: &mut M,
    source: &mut S,
    optimizer: &mut O,
    loss_fn: &L,
    strategy: &mut St,
    device: &D,
    config: &RunConfig,
) -> Result<EpochSummary, RunError>
where
    M: TrainableModel,
    S: BatchSource<Input = M::Input>,
    O: Optimizer,
    L: LossFunction,
    St: StepStrategy<M, O>,
    D: Device<M::Input>,
{
    let fmt = ValueFormat::new(6, 2);
    let mut batch_time = AverageMeter::new("Time", fmt);
    let mut data_time = AverageMeter::new("Data", fmt);
    let mut losses = AverageMeter::new("Loss", fmt);
    let mut acc = accuracy_meters(&config.topk, fmt);

    let prefix = config.prefix.clone().unwrap_or_else(|| {
        format!("{} Train Epoch: [{}]", wall_clock_hms(), config.epoch + 1)
    });
    let progress = ProgressMeter::new(source.num_batches(), prefix);

    source.reset();
    let epoch_start = Instant::now();
    let mut end = Instant::now();
    let mut batch_idx = 0usize;

    while let Some(batch) = source.next_batch() {
        let batch = batch?;
        // Time strictly spent waiting on the source, before any transfer.
        data_time.update(end.elapsed().as_secs_f64(), 1.0);

        let n = batch.size() as f64;
        let labels = batch.labels;
        let inputs = device.transfer(batch.inputs)?;

        let scores = model.forward(&inputs)?;
        let loss = loss_fn.loss(&scores, &labels)?;
        strategy.apply(model, optimizer, loss)?;

        let ranks = top_k_accuracy(&scores, &labels, &config.topk)?;
        losses.update(loss, n);
        for (meter, &pct) in acc.iter_mut().zip(ranks.iter()) {
            meter.update(pct, n);
        }

        batch_time.update(end.elapsed().as_secs_f64(), 1.0);
        end = Instant::now();
        batch_idx += 1;

        if config.print_freq > 0 && batch_idx % config.print_freq == 0 {
            progress.display(batch_idx, &meter_refs(&batch_time, &data_time, &losses, &acc));
        }
    }

    progress.display(batch_idx, &meter_refs(&batch_time, &data_time, &losses, &acc));

    Ok(EpochSummary {
        loss: losses.avg,
        accuracy: acc[0].avg,
        elapsed_ms: epoch_start.elapsed().as_millis() as u64,
    })
}

fn meter_refs<'a>(
    batch_time: &'a AverageMeter,
    data_time: &'a AverageMeter,
    losses: &'a AverageMeter,
    acc: &'a [AverageMeter],
) -> Vec<&'a AverageMeter> {
    let mut refs = vec![batch_time, data_time, losses];
    refs.extend(acc.iter());
    refs
}

/// Runs one inference-only pass: same skeleton as [`train_epoch`] but with
/// no gradient work and no data-wait tracking; only loss and accuracy
/// meters accumulate. Prints `"HH:MM:SS <prefix> <top-1 avg>"` when a
/// prefix is configured.
pub fn evaluate_epoch<M, S, L, D>(
    model: &mut M,
    source: &mut S,
    loss_fn: &L,
    device: &D,
    config: &RunConfig,
) -> Result<EpochSummary, RunError>
where
    M: Model,
    S: BatchSource<Input = M::Input>,
    L: LossFunction,
    D: Device<M::Input>,
{
    let fmt = ValueFormat::new(3, 2);
    let mut losses = AverageMeter::new("Loss", fmt);
    let mut acc = accuracy_meters(&config.topk, fmt);

    source.reset();
    let epoch_start = Instant::now();

    while let Some(batch) = source.next_batch() {
        let batch = batch?;
        let n = batch.size() as f64;
        let labels = batch.labels;
        let inputs = device.transfer(batch.inputs)?;

        let scores = model.forward(&inputs)?;
        let loss = loss_fn.loss(&scores, &labels)?;

        let ranks = top_k_accuracy(&scores, &labels, &config.topk)?;
        losses.update(loss, n);
        for (meter, &pct) in acc.iter_mut().zip(ranks.iter()) {
            meter.update(pct, n);
        }
    }

    if let Some(ref prefix) = config.prefix {
        println!("{} {} {:.2}", wall_clock_hms(), prefix, acc[0].avg);
    }

    Ok(EpochSummary {
        loss: losses.avg,
        accuracy: acc[0].avg,
        elapsed_ms: epoch_start.elapsed().as_millis() as u64,
    })
}

/// Inference-only pass over two models: per batch, the softmax-normalized
/// score matrices of both models are averaged and accuracy is computed on
/// the mixture. Returns the running top-rank accuracy percentage.
///
/// There is deliberately no ensemble counterpart on the training side.
pub fn evaluate_ensemble<M1, M2, S, D>(
    model1: &mut M1,
    model2: &mut M2,
    source: &mut S,
    device: &D,
    config: &RunConfig,
) -> Result<f64, RunError>
where
    M1: Model,
    M2: Model<Input = M1::Input>,
    S: BatchSource<Input = M1::Input>,
    D: Device<M1::Input>,
{
    let mut acc = accuracy_meters(&config.topk, ValueFormat::new(3, 2));

    source.reset();

    while let Some(batch) = source.next_batch() {
        let batch = batch?;
        let n = batch.size() as f64;
        let labels = batch.labels;
        let inputs = device.transfer(batch.inputs)?;

        let mixed = (model1.forward(&inputs)?.softmax_rows()
            + model2.forward(&inputs)?.softmax_rows())
        .map(|x| x * 0.5);

        let ranks = top_k_accuracy(&mixed, &labels, &config.topk)?;
        for (meter, &pct) in acc.iter_mut().zip(ranks.iter()) {
            meter.update(pct, n);
        }
    }

    if let Some(ref prefix) = config.prefix {
        println!("{} {} {:.2}", wall_clock_hms(), prefix, acc[0].avg);
    }

    Ok(acc[0].avg)
}
