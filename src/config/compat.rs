//! Decides whether a checkpoint written under one configuration may be
//! resumed under another.
//!
//! Only fields that change parameter shapes or the layout of saved
//! optimizer/scheduler state take part. Epoch counts, batch sizes, seeds,
//! resume settings, data and log locations, and numeric hyperparameters may
//! all differ between the two runs.

use crate::config::config::Config;

/// Names of the resume-relevant fields that differ, as `field: current != stored`.
pub fn mismatches(current: &Config, stored: &Config) -> Vec<String> {
    let mut diffs = Vec::new();
    let mut check = |field: &str, a: &str, b: &str| {
        if a != b {
            diffs.push(format!("{}: {} != {}", field, a, b));
        }
    };

    check("dataset.name", current.dataset.name.as_str(), stored.dataset.name.as_str());
    check("model.name", current.model.name.as_str(), stored.model.name.as_str());
    check(
        "training.optimizer.name",
        current.training.optimizer.kind(),
        stored.training.optimizer.kind(),
    );
    check(
        "training.scheduler.name",
        current.training.scheduler.kind(),
        stored.training.scheduler.kind(),
    );
    diffs
}

pub fn compatible(current: &Config, stored: &Config) -> bool {
    mismatches(current, stored).is_empty()
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::config::config::EXAMPLE;
    use crate::optim::OptimizerConfig;
    use proptest::prelude::*;
    use std::path::PathBuf;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_run_length_and_hyperparameters_never_block_resume(
            num_epochs in 1usize..1000,
            train_bs in 1usize..512,
            val_bs in 1usize..512,
            seed in any::<Option<u64>>(),
            root in "[a-z]{1,8}(/[a-z]{1,8}){0,2}",
            lr in 1e-5f64..1.0,
            momentum in 0.0f64..1.0,
            weight_decay in 0.0f64..0.1,
            nesterov in any::<bool>(),
        ) {
            let stored = Config::from_yaml(EXAMPLE).unwrap();
            let mut current = stored.clone();
            current.training.num_epochs = num_epochs;
            current.training.batch_size.train = train_bs;
            current.training.batch_size.val = val_bs;
            current.seed = seed;
            current.logging.root = PathBuf::from(root);
            current.training.optimizer = OptimizerConfig::Sgd { lr, momentum, weight_decay, nesterov };

            prop_assert!(compatible(&current, &stored));
            prop_assert!(compatible(&stored, &current));
        }
    }
}
