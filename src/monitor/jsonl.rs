use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, TrainError};
use crate::monitor::sink::{wall_time, HistogramSummary, MetricEvent, MetricsSink, HISTOGRAM_BUCKETS};

/// File name of the event log inside a run directory.
pub const METRICS_FILE: &str = "metrics.jsonl";

/// Appends one JSON object per metric event to a file.
pub struct JsonlSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl JsonlSink {
    pub fn create(path: &Path) -> Result<JsonlSink> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(JsonlSink { path: path.to_path_buf(), writer: Some(BufWriter::new(file)) })
    }

    pub fn in_dir(run_dir: &Path) -> Result<JsonlSink> {
        JsonlSink::create(&run_dir.join(METRICS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&mut self, event: &MetricEvent) -> Result<()> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            TrainError::Io(std::io::Error::other(format!(
                "metrics sink '{}' is closed",
                self.path.display()
            )))
        })?;
        serde_json::to_writer(&mut *writer, event)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

impl MetricsSink for JsonlSink {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()> {
        self.write(&MetricEvent::Scalar { tag: tag.to_owned(), step, value, wall_time: wall_time() })
    }

    fn add_histogram(&mut self, tag: &str, values: &[f64], step: usize) -> Result<()> {
        match HistogramSummary::from_values(values, HISTOGRAM_BUCKETS) {
            Some(summary) => self.write(&MetricEvent::Histogram {
                tag: tag.to_owned(),
                step,
                wall_time: wall_time(),
                summary,
            }),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}
