//! Error types for the training driver.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a training run.
///
/// `ConfigIncompatible` and `CheckpointNotFound` are raised while a session
/// is bootstrapped, before any epoch executes. `Computation` is raised from
/// inside an epoch and is never retried.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("Different basic configuration from checkpoint, cannot resume training: {0}")]
    ConfigIncompatible(String),

    #[error("Checkpoint path '{}' is not present", .0.display())]
    CheckpointNotFound(PathBuf),

    #[error("Computation failure: {0}")]
    Computation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl TrainError {
    pub fn computation(msg: impl Into<String>) -> Self {
        Self::Computation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, TrainError>;
