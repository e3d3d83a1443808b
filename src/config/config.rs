use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::data::DatasetName;
use crate::error::{Result, TrainError};
use crate::network::ModelName;
use crate::optim::{OptimizerConfig, SchedulerConfig};

/// A full run description, loaded once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Seeds weight initialization and shuffling when set.
    #[serde(default)]
    pub seed: Option<u64>,
    pub dataset: DatasetConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub name: DatasetName,
    /// Directory holding IDX files; defaults to `data/<name>`.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: ModelName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub batch_size: BatchSizeConfig,
    pub optimizer: OptimizerConfig,
    pub scheduler: SchedulerConfig,
    pub num_epochs: usize,
    #[serde(default)]
    pub resume: ResumeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSizeConfig {
    pub train: usize,
    pub val: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeConfig {
    #[serde(default)]
    pub from_checkpoint: bool,
    /// Run directory of the run to resume from.
    #[serde(default)]
    pub checkpoint_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Parent directory under which run directories are created.
    #[serde(default = "default_log_root")]
    pub root: PathBuf,
}

fn default_log_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { root: default_log_root() }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Config> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            TrainError::config(format!("cannot read config file '{}': {}", path.display(), e))
        })?;
        Config::from_yaml(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let training = &self.training;
        if training.batch_size.train == 0 || training.batch_size.val == 0 {
            return Err(TrainError::config("training.batch_size.train and .val must be positive"));
        }
        if training.num_epochs == 0 {
            return Err(TrainError::config("training.num_epochs must be positive"));
        }
        let lr = training.optimizer.learning_rate();
        if !(lr.is_finite() && lr > 0.0) {
            return Err(TrainError::config(format!("learning rate must be positive, got {}", lr)));
        }
        if training.resume.from_checkpoint && training.resume.checkpoint_dir.is_none() {
            return Err(TrainError::config(
                "training.resume.checkpoint_dir is required when from_checkpoint is true",
            ));
        }
        Ok(())
    }

    /// The checkpoint directory to resume from, if resuming was requested.
    pub fn resume_dir(&self) -> Option<&Path> {
        let resume = &self.training.resume;
        if resume.from_checkpoint {
            resume.checkpoint_dir.as_deref()
        } else {
            None
        }
    }
}

#[cfg(test)]
pub(crate) const EXAMPLE: &str = "\
seed: 42
dataset:
  name: Circles
model:
  name: MLP
training:
  batch_size:
    train: 32
    val: 64
  optimizer:
    name: SGD
    lr: 0.1
    momentum: 0.9
    weight_decay: 0.0005
  scheduler:
    name: CosineAnnealingLR
  num_epochs: 20
  resume:
    from_checkpoint: false
logging:
  root: runs
";

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_example() {
        let config = Config::from_yaml(EXAMPLE).unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.dataset.name, DatasetName::Circles);
        assert_eq!(config.model.name, ModelName::Mlp);
        assert_eq!(config.training.batch_size, BatchSizeConfig { train: 32, val: 64 });
        assert_eq!(config.logging.root, PathBuf::from("runs"));
        assert_eq!(config.resume_dir(), None);
    }

    #[test]
    fn test_optional_sections_default() {
        let text = EXAMPLE.replace("seed: 42\n", "").replace("logging:\n  root: runs\n", "");
        let config = Config::from_yaml(&text).unwrap();
        assert_eq!(config.seed, None);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_resume_without_dir_is_rejected() {
        let text = EXAMPLE.replace("from_checkpoint: false", "from_checkpoint: true");
        assert!(matches!(Config::from_yaml(&text), Err(TrainError::Config(_))));
    }

    #[test]
    fn test_zero_epochs_is_rejected() {
        let text = EXAMPLE.replace("num_epochs: 20", "num_epochs: 0");
        assert!(Config::from_yaml(&text).is_err());
    }

    #[test]
    fn test_unknown_model_is_yaml_error() {
        let text = EXAMPLE.replace("name: MLP", "name: ResNet18");
        assert!(matches!(Config::from_yaml(&text), Err(TrainError::Yaml(_))));
    }
}
