//! Epoch runner behavior with scripted collaborators: step counts, meter
//! weighting, mixed-precision call ordering, fail-fast propagation, and the
//! ensemble variant.

use std::cell::RefCell;
use std::rc::Rc;

use trainkit::{
    evaluate_ensemble, evaluate_epoch, train_epoch, Batch, BatchSource, GradScaler, HostDevice,
    LossFunction, Matrix, Model, Optimizer, RunConfig, RunError, ScaledStep, StandardStep,
    TrainableModel,
};

type EventLog = Rc<RefCell<Vec<String>>>;

fn log(events: &EventLog, what: &str) {
    events.borrow_mut().push(what.to_string());
}

/// Scores are the inputs themselves; one-hot input rows make a perfectly
/// confident "model".
struct EchoModel {
    events: EventLog,
}

impl Model for EchoModel {
    type Input = Matrix;

    fn forward(&mut self, inputs: &Matrix) -> Result<Matrix, RunError> {
        Ok(inputs.clone())
    }
}

impl TrainableModel for EchoModel {
    fn backward(&mut self, _loss: f64) -> Result<(), RunError> {
        log(&self.events, "backward");
        Ok(())
    }
}

/// Ignores its input and always emits the same score rows.
struct ConstModel {
    scores: Vec<f64>,
}

impl Model for ConstModel {
    type Input = Matrix;

    fn forward(&mut self, inputs: &Matrix) -> Result<Matrix, RunError> {
        Ok(Matrix::from_data(vec![self.scores.clone(); inputs.rows]))
    }
}

struct CountingOptimizer {
    events: EventLog,
    steps: usize,
    resets: usize,
}

impl CountingOptimizer {
    fn new(events: EventLog) -> Self {
        CountingOptimizer { events, steps: 0, resets: 0 }
    }
}

impl Optimizer for CountingOptimizer {
    fn reset_gradients(&mut self) {
        self.resets += 1;
        log(&self.events, "reset");
    }

    fn step(&mut self) -> Result<(), RunError> {
        self.steps += 1;
        log(&self.events, "opt_step");
        Ok(())
    }
}

/// Loss equal to the batch size, making the weighted epoch average easy to
/// compute by hand.
struct BatchSizeLoss;

impl LossFunction for BatchSizeLoss {
    fn loss(&self, _scores: &Matrix, labels: &[usize]) -> Result<f64, RunError> {
        Ok(labels.len() as f64)
    }
}

struct RecordingScaler {
    events: EventLog,
}

impl GradScaler for RecordingScaler {
    fn scale(&self, loss: f64) -> f64 {
        log(&self.events, "scale");
        loss * 1024.0
    }

    fn step<O: Optimizer>(&mut self, optimizer: &mut O) -> Result<(), RunError> {
        log(&self.events, "scaler_step");
        optimizer.step()
    }

    fn update(&mut self) {
        log(&self.events, "update");
    }
}

/// Replays a fixed list of batches; an entry of `None` simulates a source
/// failure at that position.
struct ScriptedSource {
    batches: Vec<Option<(Matrix, Vec<usize>)>>,
    cursor: usize,
}

impl ScriptedSource {
    fn new(batches: Vec<Option<(Matrix, Vec<usize>)>>) -> Self {
        ScriptedSource { batches, cursor: 0 }
    }

    /// One-hot rows per label: the echo model classifies these perfectly.
    fn perfect(batch_sizes: &[usize], classes: usize) -> Self {
        let batches = batch_sizes
            .iter()
            .map(|&n| {
                let labels: Vec<usize> = (0..n).map(|i| i % classes).collect();
                let rows = labels
                    .iter()
                    .map(|&l| {
                        let mut row = vec![0.0; classes];
                        row[l] = 1.0;
                        row
                    })
                    .collect();
                Some((Matrix::from_data(rows), labels))
            })
            .collect();
        ScriptedSource::new(batches)
    }
}

impl BatchSource for ScriptedSource {
    type Input = Matrix;

    fn num_batches(&self) -> usize {
        self.batches.len()
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }

    fn next_batch(&mut self) -> Option<Result<Batch<Matrix>, RunError>> {
        let entry = self.batches.get(self.cursor)?;
        self.cursor += 1;
        Some(match entry {
            Some((inputs, labels)) => Ok(Batch {
                inputs: inputs.clone(),
                labels: labels.clone(),
            }),
            None => Err(RunError("scripted source failure".into())),
        })
    }
}

fn config() -> RunConfig {
    RunConfig::new(0).with_topk(vec![1, 2])
}

#[test]
fn train_steps_optimizer_once_per_batch() {
    let events: EventLog = Rc::default();
    let mut model = EchoModel { events: events.clone() };
    let mut optimizer = CountingOptimizer::new(events);
    let mut source = ScriptedSource::perfect(&[4, 4, 4, 2], 3);

    let summary = train_epoch(
        &mut model,
        &mut source,
        &mut optimizer,
        &BatchSizeLoss,
        &mut StandardStep,
        &HostDevice,
        &config(),
    )
    .unwrap();

    assert_eq!(optimizer.steps, 4);
    assert_eq!(optimizer.resets, 4);
    // One-hot inputs through the echo model are always top-1 correct.
    assert_eq!(summary.accuracy, 100.0);
}

#[test]
fn loss_average_is_weighted_by_batch_size() {
    let events: EventLog = Rc::default();
    let mut model = EchoModel { events: events.clone() };
    let mut optimizer = CountingOptimizer::new(events);
    let mut source = ScriptedSource::perfect(&[2, 1], 2);

    let summary = train_epoch(
        &mut model,
        &mut source,
        &mut optimizer,
        &BatchSizeLoss,
        &mut StandardStep,
        &HostDevice,
        &config(),
    )
    .unwrap();

    // Per-batch losses are 2 and 1, weighted by batch sizes 2 and 1.
    let expected = (2.0 * 2.0 + 1.0 * 1.0) / 3.0;
    assert!((summary.loss - expected).abs() < 1e-12);
}

#[test]
fn scaled_step_preserves_amp_ordering() {
    let events: EventLog = Rc::default();
    let mut model = EchoModel { events: events.clone() };
    let mut optimizer = CountingOptimizer::new(events.clone());
    let mut strategy = ScaledStep::new(RecordingScaler { events: events.clone() });
    let mut source = ScriptedSource::perfect(&[3, 3], 2);

    train_epoch(
        &mut model,
        &mut source,
        &mut optimizer,
        &BatchSizeLoss,
        &mut strategy,
        &HostDevice,
        &config(),
    )
    .unwrap();

    let per_batch = ["reset", "scale", "backward", "scaler_step", "opt_step", "update"];
    let expected: Vec<String> = per_batch
        .iter()
        .cycle()
        .take(per_batch.len() * 2)
        .map(|s| s.to_string())
        .collect();
    assert_eq!(*events.borrow(), expected);
}

#[test]
fn source_failure_aborts_the_epoch() {
    let events: EventLog = Rc::default();
    let mut model = EchoModel { events: events.clone() };
    let mut optimizer = CountingOptimizer::new(events);

    let good = ScriptedSource::perfect(&[2], 2).batches.remove(0);
    let mut source = ScriptedSource::new(vec![good, None]);

    let err = train_epoch(
        &mut model,
        &mut source,
        &mut optimizer,
        &BatchSizeLoss,
        &mut StandardStep,
        &HostDevice,
        &config(),
    )
    .unwrap_err();

    assert!(err.0.contains("scripted source failure"));
    // The first batch was fully processed before the abort.
    assert_eq!(optimizer.steps, 1);
}

#[test]
fn evaluate_never_touches_gradients() {
    let events: EventLog = Rc::default();
    let mut model = EchoModel { events: events.clone() };
    let mut source = ScriptedSource::perfect(&[4, 4], 2);

    let summary = evaluate_epoch(&mut model, &mut source, &BatchSizeLoss, &HostDevice, &config())
        .unwrap();

    assert_eq!(summary.accuracy, 100.0);
    // No backward, no optimizer events of any kind.
    assert!(events.borrow().is_empty());
}

#[test]
fn ensemble_averages_softmax_distributions() {
    // Model 1 leans (weakly) toward the wrong class; model 2 is confidently
    // right. The averaged mixture follows model 2.
    let mut weak_wrong = ConstModel { scores: vec![0.0, 1.0] };
    let mut strong_right = ConstModel { scores: vec![5.0, -5.0] };

    let inputs = Matrix::from_data(vec![vec![0.0, 0.0]; 4]);
    let labels = vec![0usize; 4];

    let mut source = ScriptedSource::new(vec![Some((inputs, labels))]);
    let acc = evaluate_ensemble(
        &mut weak_wrong,
        &mut strong_right,
        &mut source,
        &HostDevice,
        &config(),
    )
    .unwrap();
    assert_eq!(acc, 100.0);

    // Alone, the weak model gets everything wrong.
    source.reset();
    let solo = evaluate_epoch(&mut weak_wrong, &mut source, &BatchSizeLoss, &HostDevice, &config())
        .unwrap();
    assert_eq!(solo.accuracy, 0.0);
}

#[test]
fn empty_source_reports_zero_averages() {
    let events: EventLog = Rc::default();
    let mut model = EchoModel { events };
    let mut source = ScriptedSource::new(vec![]);

    let summary = evaluate_epoch(&mut model, &mut source, &BatchSizeLoss, &HostDevice, &config())
        .unwrap();
    assert_eq!(summary.loss, 0.0);
    assert_eq!(summary.accuracy, 0.0);
}
