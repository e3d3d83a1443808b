use crate::network::Network;
use crate::optim::{Optimizer, Scheduler};

/// Everything that evolves while a session trains.
///
/// Owned by `TrainingSession` and lent to the epoch runner one epoch at a
/// time. `best_accuracy` only ever increases and only through
/// `EpochRunner::checkpoint_if_best`.
#[derive(Debug, Clone)]
pub struct TrainingState {
    /// Epoch currently (or next) being run.
    pub current_epoch: usize,
    /// Best validation accuracy seen so far, on the 0–100 scale.
    pub best_accuracy: f64,
    pub network: Network,
    pub optimizer: Optimizer,
    pub scheduler: Scheduler,
}

impl TrainingState {
    /// Starting point of a run that does not resume: epoch 0, best 0.
    pub fn fresh(network: Network, optimizer: Optimizer, scheduler: Scheduler) -> TrainingState {
        TrainingState { current_epoch: 0, best_accuracy: 0.0, network, optimizer, scheduler }
    }
}
