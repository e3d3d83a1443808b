use serde::{Serialize, Deserialize};
use rand::Rng;

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// Activations remembered by a training-mode forward pass for backprop.
#[derive(Debug, Clone)]
struct ForwardCache {
    input: Matrix,
    pre_activation: Matrix,
}

/// Fully-connected layer operating on a batch of row vectors.
///
/// `weights` has shape `input_size × size`, `biases` is `1 × size`.
/// Gradients from the last `backward` are kept in `weights_grad` and
/// `biases_grad` until the next one overwrites them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub size: usize,
    pub input_size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction,
    #[serde(skip)]
    pub weights_grad: Matrix,
    #[serde(skip)]
    pub biases_grad: Matrix,
    #[serde(skip)]
    cache: Option<ForwardCache>,
}

impl Layer {
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Layer {
        let weights = match activation {
            ActivationFunction::ReLU | ActivationFunction::LeakyReLU { .. } => {
                Matrix::he(input_size, size, rng)
            }
            _ => Matrix::xavier(input_size, size, rng),
        };

        Layer {
            size,
            input_size,
            weights,
            biases: Matrix::zeros(1, size),
            activator: activation,
            weights_grad: Matrix::default(),
            biases_grad: Matrix::default(),
            cache: None,
        }
    }

    /// `z = xW + b` for every row of `input`.
    fn pre_activation(&self, input: &Matrix) -> Matrix {
        let mut z = input * &self.weights;
        for row in &mut z.data {
            for (x, b) in row.iter_mut().zip(self.biases.data[0].iter()) {
                *x += b;
            }
        }
        z
    }

    fn activate(&self, z: &Matrix) -> Matrix {
        Matrix::from_data(z.data.iter().map(|row| self.activator.apply(row)).collect())
    }

    /// Inference-mode forward pass. Nothing is cached, so no gradient can be
    /// derived from it.
    pub fn forward(&self, input: &Matrix) -> Matrix {
        self.activate(&self.pre_activation(input))
    }

    /// Training-mode forward pass; remembers the input and `z` for `backward`.
    pub fn forward_train(&mut self, input: &Matrix) -> Matrix {
        let z = self.pre_activation(input);
        let a = self.activate(&z);
        self.cache = Some(ForwardCache { input: input.clone(), pre_activation: z });
        a
    }

    /// Backpropagates `grad_output` (∂L/∂a, one row per example), stores this
    /// layer's parameter gradients and returns ∂L/∂input.
    ///
    /// Returns `None` when no training-mode forward pass preceded the call.
    pub fn backward(&mut self, grad_output: &Matrix) -> Option<Matrix> {
        let cache = self.cache.take()?;

        let act_derivative = cache.pre_activation.map(|x| self.activator.derivative(x));
        let delta = grad_output.zip_with(&act_derivative, |g, d| g * d);

        self.weights_grad = &cache.input.transpose() * &delta;
        let mut bias_grad = vec![0.0; self.size];
        for row in &delta.data {
            for (acc, d) in bias_grad.iter_mut().zip(row.iter()) {
                *acc += d;
            }
        }
        self.biases_grad = Matrix::row(bias_grad);

        Some(&delta * &self.weights.transpose())
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn identity_layer() -> Layer {
        let mut layer = Layer::new(2, 2, ActivationFunction::Identity, &mut StdRng::seed_from_u64(1));
        layer.weights = Matrix::from_data(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        layer.biases = Matrix::row(vec![0.5, -0.5]);
        layer
    }

    #[test]
    fn test_forward_adds_bias_per_row() {
        let layer = identity_layer();
        let out = layer.forward(&Matrix::from_data(vec![vec![1.0, 2.0], vec![0.0, 0.0]]));
        assert_eq!(out.data, vec![vec![1.5, 1.5], vec![0.5, -0.5]]);
    }

    #[test]
    fn test_backward_without_forward_is_none() {
        let mut layer = identity_layer();
        assert!(layer.backward(&Matrix::row(vec![1.0, 1.0])).is_none());
    }

    #[test]
    fn test_backward_sums_bias_grad_over_batch() {
        let mut layer = identity_layer();
        layer.forward_train(&Matrix::from_data(vec![vec![1.0, 0.0], vec![0.0, 1.0]]));
        let grad_in = layer
            .backward(&Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0]]))
            .unwrap();
        assert_eq!(layer.biases_grad.data[0], vec![4.0, 6.0]);
        assert_eq!(layer.weights_grad.data, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(grad_in.shape(), (2, 2));
    }
}
