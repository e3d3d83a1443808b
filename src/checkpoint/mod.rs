pub mod store;

pub use store::{Checkpoint, CheckpointStore, CHECKPOINT_FILE};
