use serde::{Serialize, Deserialize};

/// Loss and accuracy of one phase (training or validation) of one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Mean of the per-batch losses (every batch weighs the same).
    pub loss: f64,
    /// `100 * correct / total`, on the 0–100 scale.
    pub accuracy: f64,
    pub correct: usize,
    pub total: usize,
}

impl EpochMetrics {
    /// Builds metrics from per-phase accumulators.
    pub fn from_totals(loss_sum: f64, batches: usize, correct: usize, total: usize) -> EpochMetrics {
        EpochMetrics {
            loss: loss_sum / batches as f64,
            accuracy: 100.0 * correct as f64 / total as f64,
            correct,
            total,
        }
    }
}

/// Per-epoch metrics of a whole run, in execution order. All five vectors
/// always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<usize>,
    pub train_loss: Vec<f64>,
    pub train_acc: Vec<f64>,
    pub val_loss: Vec<f64>,
    pub val_acc: Vec<f64>,
}

impl TrainingHistory {
    pub fn push(&mut self, epoch: usize, train: &EpochMetrics, val: &EpochMetrics) {
        self.epochs.push(epoch);
        self.train_loss.push(train.loss);
        self.train_acc.push(train.accuracy);
        self.val_loss.push(val.loss);
        self.val_acc.push(val.accuracy);
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_accuracy_is_a_percentage(
            (total, correct) in (1usize..100_000).prop_flat_map(|t| (Just(t), 0..=t)),
            batches in 1usize..1000,
            loss_sum in 0.0f64..1e4,
        ) {
            let m = EpochMetrics::from_totals(loss_sum, batches, correct, total);
            prop_assert!((0.0..=100.0).contains(&m.accuracy));
            prop_assert_eq!(m.accuracy, 100.0 * correct as f64 / total as f64);
            prop_assert_eq!(m.loss, loss_sum / batches as f64);
        }
    }
}
