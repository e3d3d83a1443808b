use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{error, info};

use crate::checkpoint::CheckpointStore;
use crate::config::{compatible, mismatches, Config};
use crate::data::{DataLoader, Dataset};
use crate::error::{Result, TrainError};
use crate::loss::{Criterion, CrossEntropyLoss};
use crate::monitor::MetricsSink;
use crate::run::run_dir::CONFIG_FILE;
use crate::train::epoch::EpochRunner;
use crate::train::epoch_stats::TrainingHistory;
use crate::train::state::TrainingState;

/// Where a session is in its lifecycle.
///
/// A session that cannot resume never exists: `bootstrap` returns the error
/// instead. `Aborted` marks a session whose epoch loop failed part way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    FreshStart,
    Resumed,
    Running,
    Complete,
    Aborted,
}

/// Drives epochs `start .. start + num_epochs`, owning the training state,
/// both loaders, the checkpoint location and the metrics sink.
pub struct TrainingSession<S: MetricsSink> {
    state: TrainingState,
    phase: SessionPhase,
    start_epoch: usize,
    num_epochs: usize,
    train_loader: DataLoader,
    val_loader: DataLoader,
    criterion: Box<dyn Criterion>,
    checkpoint_path: PathBuf,
    sink: S,
}

/// Validates and loads the resume source named by `config`, or returns
/// `None` when the run starts fresh.
fn resume_state(config: &Config, fresh: &TrainingState) -> Result<Option<TrainingState>> {
    let Some(dir) = config.resume_dir() else {
        return Ok(None);
    };

    let stored_config_path = dir.join(CONFIG_FILE);
    if !stored_config_path.is_file() {
        error!("Checkpoint directory '{}' has no {}!", dir.display(), CONFIG_FILE);
        return Err(TrainError::CheckpointNotFound(dir.to_path_buf()));
    }
    let stored = Config::load(&stored_config_path)?;
    if !compatible(config, &stored) {
        let diffs = mismatches(config, &stored).join(", ");
        error!("Different basic configuration from checkpoint. Cannot resume training! ({})", diffs);
        return Err(TrainError::ConfigIncompatible(diffs));
    }

    let checkpoint_path = CheckpointStore::path_in(dir);
    let state = CheckpointStore::load(&checkpoint_path).inspect_err(|e| {
        if matches!(e, TrainError::CheckpointNotFound(_)) {
            error!("Checkpoint path '{}' is not present!", checkpoint_path.display());
        }
    })?;

    if !state.network.same_architecture(&fresh.network) {
        error!("Checkpoint model does not match the configured architecture.");
        return Err(TrainError::ConfigIncompatible(
            "checkpoint model layers differ from the configured model".to_owned(),
        ));
    }
    if state.optimizer.kind() != fresh.optimizer.kind() || state.scheduler.kind() != fresh.scheduler.kind() {
        error!("Checkpoint optimizer or scheduler does not match the configuration.");
        return Err(TrainError::ConfigIncompatible(format!(
            "checkpoint holds {}/{} state, configuration asks for {}/{}",
            state.optimizer.kind(),
            state.scheduler.kind(),
            fresh.optimizer.kind(),
            fresh.scheduler.kind()
        )));
    }

    info!(
        "Resuming training from epoch {} checkpoint in {}.",
        state.current_epoch - 1,
        dir.display()
    );
    Ok(Some(state))
}

impl<S: MetricsSink> TrainingSession<S> {
    /// Decides the starting state of a run.
    ///
    /// Without resume the `fresh` state is used as is. With resume the
    /// stored configuration in the checkpoint directory must be compatible
    /// and the checkpoint must exist; otherwise this returns
    /// `CheckpointNotFound` or `ConfigIncompatible` and nothing is trained
    /// or written.
    pub fn bootstrap(
        config: &Config,
        fresh: TrainingState,
        dataset: Dataset,
        checkpoint_path: &Path,
        sink: S,
    ) -> Result<TrainingSession<S>> {
        let (state, phase) = match resume_state(config, &fresh)? {
            Some(resumed) => (resumed, SessionPhase::Resumed),
            None => (fresh, SessionPhase::FreshStart),
        };

        info!("Starting model training from epoch: {}", state.current_epoch);
        info!("Initial best accuracy: {}", state.best_accuracy);

        Ok(TrainingSession {
            start_epoch: state.current_epoch,
            state,
            phase,
            num_epochs: config.training.num_epochs,
            train_loader: dataset.train,
            val_loader: dataset.val,
            criterion: Box::new(CrossEntropyLoss),
            checkpoint_path: checkpoint_path.to_path_buf(),
            sink,
        })
    }

    /// Replaces the default cross-entropy objective.
    pub fn with_criterion(mut self, criterion: Box<dyn Criterion>) -> TrainingSession<S> {
        self.criterion = criterion;
        self
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> &TrainingState {
        &self.state
    }

    pub fn start_epoch(&self) -> usize {
        self.start_epoch
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Executes every scheduled epoch in order, closes the metrics sink and
    /// returns the per-epoch history. Any epoch failure aborts the run.
    pub fn run(&mut self) -> Result<TrainingHistory> {
        self.phase = SessionPhase::Running;
        let started = Instant::now();
        let mut history = TrainingHistory::default();

        if let Err(e) = self.run_epochs(&mut history) {
            self.phase = SessionPhase::Aborted;
            error!("Training aborted at epoch {}: {}", self.state.current_epoch, e);
            return Err(e);
        }

        info!("Training time: {:.2}s", started.elapsed().as_secs_f64());
        self.sink.close()?;
        self.phase = SessionPhase::Complete;
        Ok(history)
    }

    fn run_epochs(&mut self, history: &mut TrainingHistory) -> Result<()> {
        for epoch in self.start_epoch..self.start_epoch + self.num_epochs {
            self.state.current_epoch = epoch;

            let mut runner = EpochRunner::new(&mut self.sink, &self.checkpoint_path);
            let (train, val) = runner.run_epoch(
                &mut self.state,
                &mut self.train_loader,
                &mut self.val_loader,
                self.criterion.as_ref(),
            )?;

            self.state.scheduler.step(&mut self.state.optimizer);
            history.push(epoch, &train, &val);
        }
        self.state.current_epoch = self.start_epoch + self.num_epochs;
        Ok(())
    }
}
