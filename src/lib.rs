pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod data;
pub mod config;
pub mod checkpoint;
pub mod monitor;
pub mod train;
pub mod run;
pub mod plot;

// Convenience re-exports
pub use error::{Result, TrainError};
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::{ModelName, Network};
pub use loss::{Criterion, CrossEntropyLoss};
pub use optim::{Optimizer, Scheduler};
pub use data::{DataLoader, Dataset, DatasetName};
pub use config::Config;
pub use checkpoint::CheckpointStore;
pub use monitor::{JsonlSink, MemorySink, MetricsSink};
pub use train::{EpochMetrics, SessionPhase, TrainingHistory, TrainingSession, TrainingState};
pub use run::RunDir;
