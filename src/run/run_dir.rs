use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use crate::checkpoint::CheckpointStore;
use crate::config::Config;
use crate::error::Result;
use crate::train::TrainingHistory;

/// Copy of the configuration a run was started with.
pub const CONFIG_FILE: &str = "config.yml";
pub const LOG_FILE: &str = "log.txt";
pub const HISTORY_FILE: &str = "history.json";

/// Per-run output directory, `<root>/log-<dataset>-<model>-<timestamp>`.
///
/// Holds the stored config, the log, the checkpoint, metric events, the
/// history and the plot of one run.
#[derive(Debug, Clone)]
pub struct RunDir {
    path: PathBuf,
}

impl RunDir {
    /// Directory name for a run started at `started`.
    pub fn dir_name(config: &Config, started: &DateTime<Local>) -> String {
        format!(
            "log-{}-{}-{}",
            config.dataset.name,
            config.model.name,
            started.format("%m_%d_%Y-%H_%M_%S")
        )
    }

    /// Creates a fresh run directory under `config.logging.root` and stores
    /// `config` in it as `config.yml`.
    pub fn create(config: &Config) -> Result<RunDir> {
        RunDir::create_at(config, &Local::now())
    }

    pub fn create_at(config: &Config, started: &DateTime<Local>) -> Result<RunDir> {
        std::fs::create_dir_all(&config.logging.root)?;
        let path = config.logging.root.join(RunDir::dir_name(config, started));
        std::fs::create_dir(&path)?;
        std::fs::write(path.join(CONFIG_FILE), serde_yaml::to_string(config)?)?;
        Ok(RunDir { path })
    }

    /// Replaces the stored config with a byte copy of the file it was
    /// loaded from, comments included.
    pub fn copy_config(&self, source: &Path) -> Result<()> {
        std::fs::copy(source, self.config_path())?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        CheckpointStore::path_in(&self.path)
    }

    pub fn config_path(&self) -> PathBuf {
        self.path.join(CONFIG_FILE)
    }

    /// Location of the loss/accuracy chart, `train_<model>_<dataset>.png`.
    pub fn plot_path(&self, config: &Config) -> PathBuf {
        self.path.join(format!("train_{}_{}.png", config.model.name, config.dataset.name))
    }

    pub fn write_history(&self, history: &TrainingHistory) -> Result<PathBuf> {
        let path = self.path.join(HISTORY_FILE);
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, history)?;
        info!("Saved training history to {}", path.display());
        Ok(path)
    }
}
