use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::error::{Result, TrainError};
use crate::network::Network;
use crate::optim::{Optimizer, Scheduler};
use crate::train::epoch_stats::EpochMetrics;
use crate::train::state::TrainingState;

/// Fixed checkpoint file name inside a run directory.
pub const CHECKPOINT_FILE: &str = "ckpt.json";

/// On-disk checkpoint record.
///
/// `epoch` is the epoch whose validation produced `loss` and `acc`.
#[derive(Debug, Clone, Deserialize)]
pub struct Checkpoint {
    pub model: Network,
    pub optimizer: Optimizer,
    pub scheduler: Scheduler,
    pub epoch: usize,
    pub loss: f64,
    pub acc: f64,
}

#[derive(Serialize)]
struct CheckpointRef<'a> {
    model: &'a Network,
    optimizer: &'a Optimizer,
    scheduler: &'a Scheduler,
    epoch: usize,
    loss: f64,
    acc: f64,
}

/// Reads and writes the single best-so-far checkpoint of a run.
pub struct CheckpointStore;

impl CheckpointStore {
    pub fn path_in(run_dir: &Path) -> PathBuf {
        run_dir.join(CHECKPOINT_FILE)
    }

    /// Writes `state` with this epoch's validation metrics, replacing any
    /// previous checkpoint at `path`.
    ///
    /// The record goes to a sibling `.tmp` file first and is renamed into
    /// place, so a reader never sees a half-written checkpoint.
    pub fn save(path: &Path, state: &TrainingState, metrics: &EpochMetrics) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let record = CheckpointRef {
            model: &state.network,
            optimizer: &state.optimizer,
            scheduler: &state.scheduler,
            epoch: state.current_epoch,
            loss: metrics.loss,
            acc: metrics.accuracy,
        };

        let tmp = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut writer, &record)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Checkpoint> {
        if !path.is_file() {
            return Err(TrainError::CheckpointNotFound(path.to_path_buf()));
        }
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Restores the state a run should continue from: the epoch after the
    /// stored one, with the stored accuracy as the best so far.
    pub fn load(path: &Path) -> Result<TrainingState> {
        let checkpoint = CheckpointStore::read(path)?;
        Ok(TrainingState {
            current_epoch: checkpoint.epoch + 1,
            best_accuracy: checkpoint.acc,
            network: checkpoint.model,
            optimizer: checkpoint.optimizer,
            scheduler: checkpoint.scheduler,
        })
    }
}
