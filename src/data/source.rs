use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetError(pub String);

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for DatasetError {}

/// How a dataset presents each indexed example. One adapter serves all
/// three shapes; the mode is picked at construction time instead of
/// spawning a separate adapter type per shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMode {
    /// Input plus its (possibly noisy) class label.
    Labeled,
    /// Input only; labels ignored even if present in the annotations.
    Unlabeled,
    /// Two independently augmented views of the same input, no label.
    DualView,
}

/// One retrieved example, shaped by the source's [`SampleMode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Example {
    Labeled { input: Vec<f64>, label: usize },
    Unlabeled { input: Vec<f64> },
    DualView { first: Vec<f64>, second: Vec<f64> },
}

/// Random access over a finite set of examples. Retrieval is fallible:
/// a missing or undecodable file surfaces here and aborts whatever pass
/// requested it.
pub trait ExampleSource {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> Result<Example, DatasetError>;
}
