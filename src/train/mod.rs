pub mod epoch;
pub mod epoch_stats;
pub mod session;
pub mod state;

pub use epoch::EpochRunner;
pub use epoch_stats::{EpochMetrics, TrainingHistory};
pub use session::{SessionPhase, TrainingSession};
pub use state::TrainingState;
