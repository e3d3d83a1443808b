use crate::error::{Result, TrainError};
use crate::loss::criterion::Criterion;
use crate::math::matrix::Matrix;

/// Categorical cross-entropy over softmax probabilities and class-index
/// targets, averaged over the examples of a batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropyLoss;

/// Small epsilon added inside log() to prevent log(0) = -inf.
const EPS: f64 = 1e-12;

fn check_targets(outputs: &Matrix, targets: &[usize]) -> Result<()> {
    if outputs.rows != targets.len() {
        return Err(TrainError::computation(format!(
            "batch has {} predictions but {} targets",
            outputs.rows,
            targets.len()
        )));
    }
    if let Some(&bad) = targets.iter().find(|&&t| t >= outputs.cols) {
        return Err(TrainError::computation(format!(
            "target class {} out of range for {} outputs",
            bad, outputs.cols
        )));
    }
    Ok(())
}

impl Criterion for CrossEntropyLoss {
    /// `L = -mean_b log(p[b, y_b] + eps)`
    fn loss(&self, outputs: &Matrix, targets: &[usize]) -> Result<f64> {
        check_targets(outputs, targets)?;
        if targets.is_empty() {
            return Err(TrainError::computation("cross-entropy over an empty batch"));
        }
        let total: f64 = outputs.data.iter().zip(targets.iter())
            .map(|(row, &t)| -(row[t] + EPS).ln())
            .sum();
        let loss = total / targets.len() as f64;
        if !loss.is_finite() {
            return Err(TrainError::computation(format!("loss is not finite ({})", loss)));
        }
        Ok(loss)
    }

    /// Combined softmax + cross-entropy gradient w.r.t. the logits,
    /// `(p - onehot(y)) / batch_size`.
    fn gradient(&self, outputs: &Matrix, targets: &[usize]) -> Result<Matrix> {
        check_targets(outputs, targets)?;
        let scale = 1.0 / targets.len().max(1) as f64;
        let data = outputs.data.iter().zip(targets.iter())
            .map(|(row, &t)| {
                row.iter().enumerate()
                    .map(|(j, &p)| (p - if j == t { 1.0 } else { 0.0 }) * scale)
                    .collect()
            })
            .collect();
        Ok(Matrix::from_data(data))
    }
}
