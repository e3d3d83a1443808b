pub mod compat;
pub mod config;

pub use compat::{compatible, mismatches};
pub use config::{BatchSizeConfig, Config, DatasetConfig, LoggingConfig, ModelConfig, ResumeConfig, TrainingConfig};
