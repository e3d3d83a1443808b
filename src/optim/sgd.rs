use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::optim::optimizer::{check_gradient, ensure_state};

/// Stochastic gradient descent with optional momentum, Nesterov momentum and
/// L2 weight decay. `velocity` holds one buffer per parameter once momentum
/// has been applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sgd {
    pub learning_rate: f64,
    pub momentum: f64,
    pub weight_decay: f64,
    pub nesterov: bool,
    #[serde(default)]
    pub velocity: Vec<Matrix>,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate, momentum: 0.0, weight_decay: 0.0, nesterov: false, velocity: Vec::new() }
    }

    /// Applies one update to every parameter of `network` from its stored
    /// gradients.
    pub fn step(&mut self, network: &mut Network) -> Result<()> {
        let mut params = network.parameters_mut();
        if self.momentum != 0.0 {
            ensure_state(&mut self.velocity, &params);
        }

        for (i, (param, grad)) in params.iter_mut().enumerate() {
            check_gradient(i, param, grad)?;

            let mut g = if self.weight_decay != 0.0 {
                grad.zip_with(param, |g, p| g + self.weight_decay * p)
            } else {
                (*grad).clone()
            };

            if self.momentum != 0.0 {
                let v = &mut self.velocity[i];
                *v = v.map(|x| x * self.momentum);
                v.add_scaled(&g, 1.0);
                g = if self.nesterov {
                    g.zip_with(v, |g, v| g + self.momentum * v)
                } else {
                    v.clone()
                };
            }

            param.add_scaled(&g, -self.learning_rate);
        }
        Ok(())
    }
}
