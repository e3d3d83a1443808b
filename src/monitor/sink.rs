use serde::{Serialize, Deserialize};

use crate::error::Result;

/// Number of equal-width buckets in a histogram summary.
pub const HISTOGRAM_BUCKETS: usize = 30;

/// Destination for per-epoch scalars and parameter distributions.
///
/// Writes come from the single training thread; implementations need no
/// internal locking.
pub trait MetricsSink {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()>;

    fn add_histogram(&mut self, tag: &str, values: &[f64], step: usize) -> Result<()>;

    /// Flushes and releases the sink. Called once when a session completes.
    fn close(&mut self) -> Result<()>;
}

impl<T: MetricsSink + ?Sized> MetricsSink for &mut T {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()> {
        (**self).add_scalar(tag, value, step)
    }

    fn add_histogram(&mut self, tag: &str, values: &[f64], step: usize) -> Result<()> {
        (**self).add_histogram(tag, values, step)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Compact description of a value distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
    /// Upper edge of every bucket; the last equals `max`.
    pub bucket_limits: Vec<f64>,
    pub bucket_counts: Vec<usize>,
}

impl HistogramSummary {
    /// Summarizes `values`, or `None` when there are none.
    pub fn from_values(values: &[f64], buckets: usize) -> Option<HistogramSummary> {
        if values.is_empty() || buckets == 0 {
            return None;
        }
        let count = values.len();
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / count as f64;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        let width = (max - min) / buckets as f64;
        let mut bucket_counts = vec![0usize; buckets];
        for &v in values {
            let idx = if width > 0.0 { ((v - min) / width) as usize } else { 0 };
            bucket_counts[idx.min(buckets - 1)] += 1;
        }
        let bucket_limits = (1..=buckets)
            .map(|i| if i == buckets { max } else { min + width * i as f64 })
            .collect();

        Some(HistogramSummary { count, min, max, mean, std: var.sqrt(), bucket_limits, bucket_counts })
    }
}

/// One record written by a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricEvent {
    Scalar {
        tag: String,
        step: usize,
        value: f64,
        wall_time: f64,
    },
    Histogram {
        tag: String,
        step: usize,
        wall_time: f64,
        summary: HistogramSummary,
    },
}

impl MetricEvent {
    pub fn tag(&self) -> &str {
        match self {
            MetricEvent::Scalar { tag, .. } | MetricEvent::Histogram { tag, .. } => tag,
        }
    }

    pub fn step(&self) -> usize {
        match self {
            MetricEvent::Scalar { step, .. } | MetricEvent::Histogram { step, .. } => *step,
        }
    }
}

/// Seconds since the Unix epoch, with millisecond resolution.
pub(crate) fn wall_time() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
