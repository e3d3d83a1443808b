use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::checkpoint::CheckpointStore;
use crate::data::DataLoader;
use crate::error::{Result, TrainError};
use crate::loss::Criterion;
use crate::math::matrix::Matrix;
use crate::monitor::MetricsSink;
use crate::network::Network;
use crate::optim::Optimizer;
use crate::train::epoch_stats::EpochMetrics;
use crate::train::state::TrainingState;

/// Runs the two phases of a single epoch and decides whether its result is
/// worth a checkpoint.
///
/// Borrows the session's metrics sink and checkpoint location for its own
/// lifetime; holds no state between epochs.
pub struct EpochRunner<'a, S: MetricsSink + ?Sized> {
    sink: &'a mut S,
    checkpoint_path: &'a Path,
}

/// Index of the maximum element in a slice.
fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn count_correct(outputs: &Matrix, targets: &[usize]) -> usize {
    outputs.data.iter().zip(targets.iter())
        .filter(|(row, t)| argmax(row) == **t)
        .count()
}

fn finish(phase: &str, loss_sum: f64, batches: usize, correct: usize, total: usize) -> Result<EpochMetrics> {
    if batches == 0 || total == 0 {
        return Err(TrainError::computation(format!("{} data loader yielded no batches", phase)));
    }
    Ok(EpochMetrics::from_totals(loss_sum, batches, correct, total))
}

impl<'a, S: MetricsSink + ?Sized> EpochRunner<'a, S> {
    pub fn new(sink: &'a mut S, checkpoint_path: &'a Path) -> Self {
        EpochRunner { sink, checkpoint_path }
    }

    /// One pass over `loader` with a parameter update after every batch.
    ///
    /// Loss is the mean of per-batch losses; accuracy is `100 * correct / total`
    /// over every example seen this epoch.
    pub fn run_training_phase<C: Criterion + ?Sized>(
        &mut self,
        epoch: usize,
        network: &mut Network,
        loader: &mut DataLoader,
        optimizer: &mut Optimizer,
        criterion: &C,
    ) -> Result<EpochMetrics> {
        info!("Training epoch: {}", epoch);
        let started = Instant::now();

        let mut loss_sum = 0.0;
        let mut batches = 0;
        let mut correct = 0;
        let mut total = 0;

        for batch in loader.batches() {
            let outputs = network.forward_train(&batch.inputs)?;
            let loss = criterion.loss(&outputs, &batch.targets)?;

            let grad = criterion.gradient(&outputs, &batch.targets)?;
            network.backward(&grad)?;
            optimizer.step(network)?;

            loss_sum += loss;
            batches += 1;
            total += batch.len();
            correct += count_correct(&outputs, &batch.targets);
        }

        let metrics = finish("training", loss_sum, batches, correct, total)?;
        info!(
            "Loss: {} | Acc: {}%, ({}/{}) | Time: {:.2}s",
            metrics.loss,
            metrics.accuracy,
            correct,
            total,
            started.elapsed().as_secs_f64()
        );

        self.sink.add_scalar("Training loss", metrics.loss, epoch)?;
        self.sink.add_scalar("Training accuracy", metrics.accuracy, epoch)?;
        for param in network.named_parameters() {
            self.sink.add_histogram(&param.name, &param.value.values(), epoch)?;
            self.sink.add_histogram(&format!("{}.grad", param.name), &param.grad.values(), epoch)?;
        }

        Ok(metrics)
    }

    /// One inference-only pass over `loader`. The network is borrowed
    /// immutably, so nothing can be recorded for backprop and no parameter
    /// can change.
    pub fn run_validation_phase<C: Criterion + ?Sized>(
        &mut self,
        epoch: usize,
        network: &Network,
        loader: &mut DataLoader,
        criterion: &C,
    ) -> Result<EpochMetrics> {
        info!("Validation epoch: {}", epoch);
        let started = Instant::now();

        let mut loss_sum = 0.0;
        let mut batches = 0;
        let mut correct = 0;
        let mut total = 0;

        for batch in loader.batches() {
            let outputs = network.predict(&batch.inputs)?;
            loss_sum += criterion.loss(&outputs, &batch.targets)?;
            batches += 1;
            total += batch.len();
            correct += count_correct(&outputs, &batch.targets);
        }

        let metrics = finish("validation", loss_sum, batches, correct, total)?;
        info!(
            "Loss: {} | Acc: {}%, ({}/{}) | Time: {:.2}s",
            metrics.loss,
            metrics.accuracy,
            correct,
            total,
            started.elapsed().as_secs_f64()
        );

        self.sink.add_scalar("Validation loss", metrics.loss, epoch)?;
        self.sink.add_scalar("Validation accuracy", metrics.accuracy, epoch)?;

        Ok(metrics)
    }

    /// Persists `state` and raises `best_accuracy` when `val` is at least as
    /// good as the best so far. Ties overwrite the previous checkpoint.
    pub fn checkpoint_if_best(&mut self, state: &mut TrainingState, val: &EpochMetrics) -> Result<bool> {
        if val.accuracy < state.best_accuracy {
            return Ok(false);
        }

        info!("Saving checkpoint from epoch {}.", state.current_epoch);
        info!("Best accuracy: was {}%, now: {}%.", state.best_accuracy, val.accuracy);

        CheckpointStore::save(self.checkpoint_path, state, val)?;
        state.best_accuracy = val.accuracy;
        Ok(true)
    }

    /// Training phase, validation phase, then the checkpoint decision for
    /// `state.current_epoch`.
    pub fn run_epoch<C: Criterion + ?Sized>(
        &mut self,
        state: &mut TrainingState,
        train_loader: &mut DataLoader,
        val_loader: &mut DataLoader,
        criterion: &C,
    ) -> Result<(EpochMetrics, EpochMetrics)> {
        let epoch = state.current_epoch;
        let train = self.run_training_phase(
            epoch,
            &mut state.network,
            train_loader,
            &mut state.optimizer,
            criterion,
        )?;
        let val = self.run_validation_phase(epoch, &state.network, val_loader, criterion)?;
        self.checkpoint_if_best(state, &val)?;
        Ok((train, val))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::CrossEntropyLoss;
    use crate::monitor::MemorySink;
    use crate::network::ModelName;
    use crate::optim::{Scheduler, SchedulerConfig, Sgd};
    use rand::{rngs::StdRng, SeedableRng};
    use tempfile::TempDir;

    fn xor_loader(batch_size: usize) -> DataLoader {
        let (x, y) = crate::data::toy::xor();
        DataLoader::new(x, y, batch_size).unwrap()
    }

    fn state() -> TrainingState {
        TrainingState::fresh(
            ModelName::Mlp.build(2, 2, &mut StdRng::seed_from_u64(11)),
            Optimizer::Sgd(Sgd::new(0.1)),
            Scheduler::from_config(&SchedulerConfig::Constant, 0.1, 1),
        )
    }

    fn metrics(accuracy: f64) -> EpochMetrics {
        EpochMetrics { loss: 1.0, accuracy, correct: 0, total: 0 }
    }

    #[test]
    fn test_training_accuracy_matches_counts() {
        let dir = TempDir::new().unwrap();
        let ckpt = dir.path().join("ckpt.json");
        let mut sink = MemorySink::new();
        let mut runner = EpochRunner::new(&mut sink, &ckpt);
        let mut st = state();

        let m = runner
            .run_training_phase(0, &mut st.network, &mut xor_loader(3), &mut st.optimizer, &CrossEntropyLoss)
            .unwrap();
        assert_eq!(m.total, 4);
        assert!((0.0..=100.0).contains(&m.accuracy));
        assert_eq!(m.accuracy, 100.0 * m.correct as f64 / m.total as f64);
        assert!(m.loss.is_finite());
    }

    #[test]
    fn test_training_emits_scalars_and_histograms() {
        let dir = TempDir::new().unwrap();
        let ckpt = dir.path().join("ckpt.json");
        let mut sink = MemorySink::new();
        let mut st = state();
        {
            let mut runner = EpochRunner::new(&mut sink, &ckpt);
            runner
                .run_training_phase(3, &mut st.network, &mut xor_loader(2), &mut st.optimizer, &CrossEntropyLoss)
                .unwrap();
        }
        assert_eq!(sink.scalars("Training loss").len(), 1);
        assert_eq!(sink.scalars("Training accuracy")[0].0, 3);
        let tags = sink.histogram_tags(3);
        assert!(tags.contains(&"layers.0.weight"));
        assert!(tags.contains(&"layers.1.bias.grad"));
        assert_eq!(tags.len(), 8);
    }

    #[test]
    fn test_validation_leaves_parameters_untouched() {
        let dir = TempDir::new().unwrap();
        let ckpt = dir.path().join("ckpt.json");
        let mut sink = MemorySink::new();
        let st = state();
        let before = st.network.layers[0].weights.clone();
        {
            let mut runner = EpochRunner::new(&mut sink, &ckpt);
            let m = runner.run_validation_phase(0, &st.network, &mut xor_loader(4), &CrossEntropyLoss).unwrap();
            assert_eq!(m.total, 4);
        }
        assert_eq!(st.network.layers[0].weights, before);
        assert!(st.network.layers[0].weights_grad.is_empty());
        assert!(sink.histogram_tags(0).is_empty());
        assert_eq!(sink.scalars("Validation accuracy").len(), 1);
    }

    #[test]
    fn test_checkpoint_on_improvement_and_tie_only() {
        let dir = TempDir::new().unwrap();
        let ckpt = dir.path().join("ckpt.json");
        let mut sink = MemorySink::new();
        let mut runner = EpochRunner::new(&mut sink, &ckpt);
        let mut st = state();

        assert!(runner.checkpoint_if_best(&mut st, &metrics(50.0)).unwrap());
        assert_eq!(st.best_accuracy, 50.0);

        st.current_epoch = 1;
        assert!(!runner.checkpoint_if_best(&mut st, &metrics(49.9)).unwrap());
        assert_eq!(CheckpointStore::read(&ckpt).unwrap().epoch, 0);

        st.current_epoch = 2;
        assert!(runner.checkpoint_if_best(&mut st, &metrics(50.0)).unwrap());
        assert_eq!(CheckpointStore::read(&ckpt).unwrap().epoch, 2);
        assert_eq!(st.best_accuracy, 50.0);
    }

    #[test]
    fn test_zero_accuracy_first_epoch_still_checkpoints() {
        let dir = TempDir::new().unwrap();
        let ckpt = dir.path().join("ckpt.json");
        let mut sink = MemorySink::new();
        let mut runner = EpochRunner::new(&mut sink, &ckpt);
        let mut st = state();
        assert!(runner.checkpoint_if_best(&mut st, &metrics(0.0)).unwrap());
        assert!(ckpt.exists());
    }

    #[test]
    fn test_shape_mismatch_aborts_phase() {
        let dir = TempDir::new().unwrap();
        let ckpt = dir.path().join("ckpt.json");
        let mut sink = MemorySink::new();
        let mut runner = EpochRunner::new(&mut sink, &ckpt);
        let mut st = state();
        let mut wide = DataLoader::new(vec![vec![0.0, 1.0, 2.0]], vec![0], 1).unwrap();
        let err = runner
            .run_training_phase(0, &mut st.network, &mut wide, &mut st.optimizer, &CrossEntropyLoss)
            .unwrap_err();
        assert!(matches!(err, TrainError::Computation(_)));
    }

    #[test]
    fn test_empty_loader_is_computation_error() {
        let dir = TempDir::new().unwrap();
        let ckpt = dir.path().join("ckpt.json");
        let mut sink = MemorySink::new();
        let mut runner = EpochRunner::new(&mut sink, &ckpt);
        let st = state();
        let mut empty = DataLoader::new(vec![], vec![], 1).unwrap();
        assert!(runner.run_validation_phase(0, &st.network, &mut empty, &CrossEntropyLoss).is_err());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::monitor::MemorySink;
    use crate::network::ModelName;
    use crate::optim::{Scheduler, SchedulerConfig, Sgd};
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};
    use tempfile::TempDir;

    /// Validation accuracies drawn from a coarse grid so ties are common.
    fn accuracies() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec((0u32..=20).prop_map(|k| k as f64 * 5.0), 1..12)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_checkpoint_iff_at_least_best(accs in accuracies(), initial_best in 0u32..=20) {
            let dir = TempDir::new().unwrap();
            let ckpt = dir.path().join("ckpt.json");
            let mut sink = MemorySink::new();
            let mut runner = EpochRunner::new(&mut sink, &ckpt);
            let mut state = TrainingState::fresh(
                ModelName::Linear.build(2, 2, &mut StdRng::seed_from_u64(0)),
                Optimizer::Sgd(Sgd::new(0.1)),
                Scheduler::from_config(&SchedulerConfig::Constant, 0.1, 1),
            );
            state.best_accuracy = initial_best as f64 * 5.0;
            let mut last_saved = None;

            for (epoch, acc) in accs.iter().enumerate() {
                state.current_epoch = epoch;
                let best_before = state.best_accuracy;
                let metrics = EpochMetrics { loss: 1.0, accuracy: *acc, correct: 0, total: 0 };

                let saved = runner.checkpoint_if_best(&mut state, &metrics).unwrap();
                prop_assert_eq!(saved, *acc >= best_before);
                prop_assert!(state.best_accuracy >= best_before);
                prop_assert_eq!(state.best_accuracy, best_before.max(*acc));
                if saved {
                    last_saved = Some(epoch);
                }

                match last_saved {
                    Some(e) => {
                        let stored = CheckpointStore::read(&ckpt).unwrap();
                        prop_assert_eq!(stored.epoch, e);
                        prop_assert_eq!(stored.acc, state.best_accuracy);
                    }
                    None => prop_assert!(!ckpt.exists()),
                }
            }
        }
    }
}
