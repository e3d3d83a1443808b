use serde::{Serialize, Deserialize};
use std::f64::consts::E;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    Identity,
    /// Vector-valued; applied across the whole layer output by `apply()`.
    Softmax,
    Tanh,
    LeakyReLU { alpha: f64 },
}

impl ActivationFunction {
    /// Applies the activation to a full pre-activation vector.
    ///
    /// Softmax is computed with the max-subtraction trick so large logits do
    /// not overflow `exp`.
    pub fn apply(&self, z: &[f64]) -> Vec<f64> {
        match self {
            ActivationFunction::Softmax => {
                let max = z.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                let exps: Vec<f64> = z.iter().map(|x| (x - max).exp()).collect();
                let sum: f64 = exps.iter().sum();
                exps.into_iter().map(|e| e / sum).collect()
            }
            _ => z.iter().map(|&x| self.scalar(x)).collect(),
        }
    }

    fn scalar(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity => x,
            ActivationFunction::Softmax => x,
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
        }
    }

    /// Element-wise derivative at pre-activation `x`.
    ///
    /// Softmax is only ever paired with cross-entropy, whose combined
    /// gradient `p - y` is produced by the criterion, so it passes the delta
    /// through unchanged.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => {
                let fx = self.scalar(x);
                fx * (1.0 - fx)
            }
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Identity => 1.0,
            ActivationFunction::Softmax => 1.0,
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { 1.0 } else { *alpha },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let p = ActivationFunction::Softmax.apply(&[1000.0, 1001.0, 999.0]);
        let sum: f64 = p.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(p[1] > p[0] && p[0] > p[2]);
    }

    #[test]
    fn test_relu_is_elementwise() {
        assert_eq!(ActivationFunction::ReLU.apply(&[-1.0, 2.0]), vec![0.0, 2.0]);
        assert_eq!(ActivationFunction::ReLU.derivative(-0.5), 0.0);
    }
}
