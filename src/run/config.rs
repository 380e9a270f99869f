/// Configuration for a single epoch run.
///
/// # Fields
/// - `epoch`      — 0-based epoch number; progress lines show `epoch + 1`
/// - `topk`       — accuracy ranks tracked as `Acc@k` meters; the first rank
///                  is the one reported in the epoch summary
/// - `print_freq` — display a progress line every `print_freq` batches;
///                  `0` prints only the final line
/// - `prefix`     — overrides the default progress/summary prefix. For
///                  evaluation runs, `None` suppresses the summary line.
pub struct RunConfig {
    pub epoch: usize,
    pub topk: Vec<usize>,
    pub print_freq: usize,
    pub prefix: Option<String>,
}

impl RunConfig {
    /// Creates a config tracking top-1 and top-5 accuracy with no per-batch
    /// printing.
    pub fn new(epoch: usize) -> Self {
        RunConfig {
            epoch,
            topk: vec![1, 5],
            print_freq: 0,
            prefix: None,
        }
    }

    pub fn with_topk(mut self, topk: Vec<usize>) -> Self {
        assert!(!topk.is_empty(), "at least one accuracy rank is required");
        self.topk = topk;
        self
    }

    pub fn with_print_freq(mut self, print_freq: usize) -> Self {
        self.print_freq = print_freq;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}
