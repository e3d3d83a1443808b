use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::optim::optimizer::{check_gradient, ensure_state};

/// Adam with bias-corrected first and second moment estimates and L2
/// weight decay folded into the gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
    pub weight_decay: f64,
    #[serde(default)]
    pub step: u64,
    #[serde(default)]
    pub exp_avg: Vec<Matrix>,
    #[serde(default)]
    pub exp_avg_sq: Vec<Matrix>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Adam {
        Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            weight_decay: 0.0,
            step: 0,
            exp_avg: Vec::new(),
            exp_avg_sq: Vec::new(),
        }
    }

    pub fn step(&mut self, network: &mut Network) -> Result<()> {
        let mut params = network.parameters_mut();
        ensure_state(&mut self.exp_avg, &params);
        ensure_state(&mut self.exp_avg_sq, &params);
        self.step += 1;

        let bias1 = 1.0 - self.beta1.powi(self.step as i32);
        let bias2 = 1.0 - self.beta2.powi(self.step as i32);
        let step_size = self.learning_rate / bias1;

        for (i, (param, grad)) in params.iter_mut().enumerate() {
            check_gradient(i, param, grad)?;

            let g = if self.weight_decay != 0.0 {
                grad.zip_with(param, |g, p| g + self.weight_decay * p)
            } else {
                (*grad).clone()
            };

            let m = self.exp_avg[i].zip_with(&g, |m, g| self.beta1 * m + (1.0 - self.beta1) * g);
            let v = self.exp_avg_sq[i].zip_with(&g, |v, g| self.beta2 * v + (1.0 - self.beta2) * g * g);

            let update = m.zip_with(&v, |m, v| m / ((v / bias2).sqrt() + self.eps));
            param.add_scaled(&update, -step_size);

            self.exp_avg[i] = m;
            self.exp_avg_sq[i] = v;
        }
        Ok(())
    }
}
