use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{Result, TrainError};
use crate::math::matrix::Matrix;

/// One mini-batch: an `n × features` input matrix and `n` class targets.
#[derive(Debug, Clone)]
pub struct Batch {
    pub inputs: Matrix,
    pub targets: Vec<usize>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Splits an in-memory dataset into mini-batches, optionally reshuffling
/// the example order at the start of every epoch.
#[derive(Debug, Clone)]
pub struct DataLoader {
    inputs: Vec<Vec<f64>>,
    targets: Vec<usize>,
    batch_size: usize,
    shuffle: Option<StdRng>,
}

impl DataLoader {
    pub fn new(inputs: Vec<Vec<f64>>, targets: Vec<usize>, batch_size: usize) -> Result<DataLoader> {
        if inputs.len() != targets.len() {
            return Err(TrainError::dataset(format!(
                "{} inputs but {} targets",
                inputs.len(),
                targets.len()
            )));
        }
        if batch_size == 0 {
            return Err(TrainError::dataset("batch_size must be at least 1"));
        }
        if let Some(first) = inputs.first() {
            if inputs.iter().any(|x| x.len() != first.len()) {
                return Err(TrainError::dataset("inputs have inconsistent feature counts"));
            }
        }
        Ok(DataLoader { inputs, targets, batch_size, shuffle: None })
    }

    /// Reshuffles the example order every epoch using `rng`.
    pub fn shuffled(mut self, rng: StdRng) -> DataLoader {
        self.shuffle = Some(rng);
        self
    }

    /// Number of batches per epoch.
    pub fn len(&self) -> usize {
        self.targets.len().div_ceil(self.batch_size)
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn num_examples(&self) -> usize {
        self.targets.len()
    }

    pub fn feature_count(&self) -> usize {
        self.inputs.first().map(|x| x.len()).unwrap_or(0)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn epoch_order(&mut self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.targets.len()).collect();
        if let Some(rng) = self.shuffle.as_mut() {
            order.shuffle(rng);
        }
        order
    }

    /// Yields one epoch's batches. The last batch may be smaller.
    pub fn batches(&mut self) -> impl Iterator<Item = Batch> + '_ {
        let order = self.epoch_order();
        let batch_size = self.batch_size;
        let inputs = &self.inputs;
        let targets = &self.targets;

        (0..order.len()).step_by(batch_size).map(move |start| {
            let idx = &order[start..(start + batch_size).min(order.len())];
            Batch {
                inputs: Matrix::from_data(idx.iter().map(|&i| inputs[i].clone()).collect()),
                targets: idx.iter().map(|&i| targets[i]).collect(),
            }
        })
    }
}
