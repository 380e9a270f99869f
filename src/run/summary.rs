use serde::{Serialize, Deserialize};

/// Epoch-level averages returned by the epoch runners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochSummary {
    /// Mean loss over all examples seen this epoch.
    pub loss: f64,
    /// Running accuracy percentage for the first configured rank
    /// (top-1 under the default config).
    pub accuracy: f64,
    /// Wall-clock duration of the pass in milliseconds.
    pub elapsed_ms: u64,
}

/// Accumulates per-epoch summaries for a whole run and persists them as
/// pretty-printed JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunHistory {
    pub epochs: Vec<EpochSummary>,
}

impl RunHistory {
    pub fn new() -> RunHistory {
        RunHistory::default()
    }

    pub fn push(&mut self, summary: EpochSummary) {
        self.epochs.push(summary);
    }

    /// Serializes the history to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a history from a JSON file previously written by
    /// `save_json`.
    pub fn load_json(path: &str) -> std::io::Result<RunHistory> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}
