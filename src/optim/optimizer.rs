use serde::{Serialize, Deserialize};

use crate::error::{Result, TrainError};
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::optim::adam::Adam;
use crate::optim::sgd::Sgd;

fn default_betas() -> (f64, f64) {
    (0.9, 0.999)
}

fn default_eps() -> f64 {
    1e-8
}

/// `training.optimizer` block: a named algorithm plus its hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum OptimizerConfig {
    #[serde(rename = "SGD")]
    Sgd {
        lr: f64,
        #[serde(default)]
        momentum: f64,
        #[serde(default)]
        weight_decay: f64,
        #[serde(default)]
        nesterov: bool,
    },
    Adam {
        lr: f64,
        #[serde(default = "default_betas")]
        betas: (f64, f64),
        #[serde(default = "default_eps")]
        eps: f64,
        #[serde(default)]
        weight_decay: f64,
    },
}

impl OptimizerConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            OptimizerConfig::Sgd { .. } => "SGD",
            OptimizerConfig::Adam { .. } => "Adam",
        }
    }

    pub fn learning_rate(&self) -> f64 {
        match self {
            OptimizerConfig::Sgd { lr, .. } | OptimizerConfig::Adam { lr, .. } => *lr,
        }
    }
}

/// A configured optimizer together with its per-parameter state. The whole
/// value is what a checkpoint stores as optimizer state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum Optimizer {
    #[serde(rename = "SGD")]
    Sgd(Sgd),
    Adam(Adam),
}

impl Optimizer {
    pub fn from_config(config: &OptimizerConfig) -> Optimizer {
        match *config {
            OptimizerConfig::Sgd { lr, momentum, weight_decay, nesterov } => Optimizer::Sgd(Sgd {
                momentum,
                weight_decay,
                nesterov,
                ..Sgd::new(lr)
            }),
            OptimizerConfig::Adam { lr, betas, eps, weight_decay } => Optimizer::Adam(Adam {
                beta1: betas.0,
                beta2: betas.1,
                eps,
                weight_decay,
                ..Adam::new(lr)
            }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Optimizer::Sgd(_) => "SGD",
            Optimizer::Adam(_) => "Adam",
        }
    }

    /// Updates every parameter of `network` from the gradients left by the
    /// last backward pass.
    pub fn step(&mut self, network: &mut Network) -> Result<()> {
        match self {
            Optimizer::Sgd(sgd) => sgd.step(network),
            Optimizer::Adam(adam) => adam.step(network),
        }
    }

    pub fn learning_rate(&self) -> f64 {
        match self {
            Optimizer::Sgd(sgd) => sgd.learning_rate,
            Optimizer::Adam(adam) => adam.learning_rate,
        }
    }

    pub fn set_learning_rate(&mut self, lr: f64) {
        match self {
            Optimizer::Sgd(sgd) => sgd.learning_rate = lr,
            Optimizer::Adam(adam) => adam.learning_rate = lr,
        }
    }
}

/// Lazily sizes a per-parameter state buffer to match the parameter list.
pub(crate) fn ensure_state(state: &mut Vec<Matrix>, params: &[(&mut Matrix, &Matrix)]) {
    let matches = state.len() == params.len()
        && state.iter().zip(params.iter()).all(|(s, (p, _))| s.shape() == p.shape());
    if !matches {
        *state = params.iter().map(|(p, _)| Matrix::zeros(p.rows, p.cols)).collect();
    }
}

pub(crate) fn check_gradient(index: usize, param: &Matrix, grad: &Matrix) -> Result<()> {
    if param.shape() != grad.shape() {
        return Err(TrainError::computation(format!(
            "parameter {} has gradient of shape {:?}, expected {:?}",
            index,
            grad.shape(),
            param.shape()
        )));
    }
    if !grad.all_finite() {
        return Err(TrainError::computation(format!("parameter {} has a non-finite gradient", index)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use crate::network::LayerSpec;
    use rand::{rngs::StdRng, SeedableRng};

    fn one_layer() -> Network {
        let spec = [LayerSpec { size: 1, input_size: 1, activation: ActivationFunction::Identity }];
        let mut net = Network::from_specs(&spec, &mut StdRng::seed_from_u64(0));
        net.layers[0].weights = Matrix::row(vec![1.0]);
        net.layers[0].weights_grad = Matrix::row(vec![0.5]);
        net.layers[0].biases_grad = Matrix::row(vec![1.0]);
        net
    }

    #[test]
    fn test_plain_sgd_step() {
        let mut net = one_layer();
        let mut opt = Optimizer::from_config(&OptimizerConfig::Sgd {
            lr: 0.1,
            momentum: 0.0,
            weight_decay: 0.0,
            nesterov: false,
        });
        opt.step(&mut net).unwrap();
        assert!((net.layers[0].weights.data[0][0] - 0.95).abs() < 1e-12);
        assert!((net.layers[0].biases.data[0][0] + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_momentum_accumulates_velocity() {
        let mut net = one_layer();
        let mut opt = Optimizer::from_config(&OptimizerConfig::Sgd {
            lr: 1.0,
            momentum: 0.5,
            weight_decay: 0.0,
            nesterov: false,
        });
        opt.step(&mut net).unwrap();
        opt.step(&mut net).unwrap();
        // v1 = 0.5, v2 = 0.5 * 0.5 + 0.5 = 0.75; w = 1 - 0.5 - 0.75
        assert!((net.layers[0].weights.data[0][0] + 0.25).abs() < 1e-12);
        match opt {
            Optimizer::Sgd(sgd) => assert_eq!(sgd.velocity.len(), 2),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_adam_first_step_moves_by_lr() {
        let mut net = one_layer();
        let mut opt = Optimizer::from_config(&OptimizerConfig::Adam {
            lr: 0.01,
            betas: (0.9, 0.999),
            eps: 1e-8,
            weight_decay: 0.0,
        });
        opt.step(&mut net).unwrap();
        assert!((net.layers[0].weights.data[0][0] - 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_missing_gradient_is_computation_error() {
        let spec = [LayerSpec { size: 1, input_size: 1, activation: ActivationFunction::Identity }];
        let mut net = Network::from_specs(&spec, &mut StdRng::seed_from_u64(0));
        let mut opt = Optimizer::Sgd(Sgd::new(0.1));
        assert!(matches!(opt.step(&mut net), Err(TrainError::Computation(_))));
    }

    #[test]
    fn test_state_survives_json() {
        let mut net = one_layer();
        let mut opt = Optimizer::Adam(Adam::new(0.001));
        opt.step(&mut net).unwrap();
        let json = serde_json::to_string(&opt).unwrap();
        let back: Optimizer = serde_json::from_str(&json).unwrap();
        match back {
            Optimizer::Adam(adam) => {
                assert_eq!(adam.step, 1);
                assert_eq!(adam.exp_avg.len(), 2);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_config_from_yaml() {
        let cfg: OptimizerConfig = serde_yaml::from_str("name: SGD\nlr: 0.1\nmomentum: 0.9\n").unwrap();
        assert_eq!(cfg.kind(), "SGD");
        assert_eq!(cfg.learning_rate(), 0.1);
    }
}
