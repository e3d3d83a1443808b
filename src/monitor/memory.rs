use crate::error::Result;
use crate::monitor::sink::{wall_time, HistogramSummary, MetricEvent, MetricsSink, HISTOGRAM_BUCKETS};

/// Keeps every event in memory. Handy for embedding the trainer and for
/// asserting on emitted metrics.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub events: Vec<MetricEvent>,
    pub closed: bool,
}

impl MemorySink {
    pub fn new() -> MemorySink {
        MemorySink::default()
    }

    /// `(step, value)` pairs recorded under a scalar tag, in order.
    pub fn scalars(&self, tag: &str) -> Vec<(usize, f64)> {
        self.events.iter()
            .filter_map(|e| match e {
                MetricEvent::Scalar { tag: t, step, value, .. } if t == tag => Some((*step, *value)),
                _ => None,
            })
            .collect()
    }

    /// Tags of every histogram recorded at `step`.
    pub fn histogram_tags(&self, step: usize) -> Vec<&str> {
        self.events.iter()
            .filter(|e| matches!(e, MetricEvent::Histogram { .. }) && e.step() == step)
            .map(MetricEvent::tag)
            .collect()
    }
}

impl MetricsSink for MemorySink {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()> {
        self.events.push(MetricEvent::Scalar { tag: tag.to_owned(), step, value, wall_time: wall_time() });
        Ok(())
    }

    fn add_histogram(&mut self, tag: &str, values: &[f64], step: usize) -> Result<()> {
        if let Some(summary) = HistogramSummary::from_values(values, HISTOGRAM_BUCKETS) {
            self.events.push(MetricEvent::Histogram { tag: tag.to_owned(), step, wall_time: wall_time(), summary });
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
