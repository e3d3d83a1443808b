pub mod jsonl;
pub mod memory;
pub mod sink;

pub use jsonl::{JsonlSink, METRICS_FILE};
pub use memory::MemorySink;
pub use sink::{HistogramSummary, MetricEvent, MetricsSink};
