use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{Result, TrainError};
use crate::layers::dense::Layer;
use crate::math::matrix::Matrix;
use crate::network::spec::LayerSpec;

/// One trainable tensor with its most recent gradient.
pub struct NamedParameter<'a> {
    pub name: String,
    pub value: &'a Matrix,
    pub grad: &'a Matrix,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
}

impl Network {
    /// Builds a network from an ordered list of layer descriptions.
    pub fn from_specs<R: Rng + ?Sized>(specs: &[LayerSpec], rng: &mut R) -> Network {
        let layers = specs.iter()
            .map(|s| Layer::new(s.size, s.input_size, s.activation, rng))
            .collect();
        Network { layers }
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(|l| l.input_size).unwrap_or(0)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(|l| l.size).unwrap_or(0)
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    /// Layer-by-layer `(input_size, size, activation)` comparison.
    pub fn same_architecture(&self, other: &Network) -> bool {
        self.layers.len() == other.layers.len()
            && self.layers.iter().zip(other.layers.iter()).all(|(a, b)| {
                a.input_size == b.input_size
                    && a.size == b.size
                    && a.activator == b.activator
                    && a.weights.shape() == b.weights.shape()
                    && a.biases.shape() == b.biases.shape()
            })
    }

    fn check_input(&self, batch: &Matrix) -> Result<()> {
        if self.layers.is_empty() {
            return Err(TrainError::computation("network has no layers"));
        }
        if batch.cols != self.input_size() || batch.data.iter().any(|r| r.len() != batch.cols) {
            return Err(TrainError::computation(format!(
                "input shape mismatch: network expects {} features, batch has {}",
                self.input_size(),
                batch.cols
            )));
        }
        Ok(())
    }

    /// Training-mode forward pass; every layer caches what `backward` needs.
    pub fn forward_train(&mut self, batch: &Matrix) -> Result<Matrix> {
        self.check_input(batch)?;
        let mut current = batch.clone();
        for layer in &mut self.layers {
            current = layer.forward_train(&current);
        }
        Ok(current)
    }

    /// Inference-mode forward pass. Borrowing `&self` guarantees no
    /// activations are recorded and no parameter can change.
    pub fn predict(&self, batch: &Matrix) -> Result<Matrix> {
        self.check_input(batch)?;
        let mut current = batch.clone();
        for layer in &self.layers {
            current = layer.forward(&current);
        }
        Ok(current)
    }

    /// Backpropagates ∂L/∂output through every layer, replacing the stored
    /// gradients of the previous step.
    pub fn backward(&mut self, grad_output: &Matrix) -> Result<()> {
        let mut grad = grad_output.clone();
        for (i, layer) in self.layers.iter_mut().enumerate().rev() {
            grad = layer.backward(&grad).ok_or_else(|| {
                TrainError::computation(format!("layer {} has no forward activations to backpropagate", i))
            })?;
        }
        Ok(())
    }

    /// `(parameter, gradient)` pairs in the same order as `named_parameters`.
    pub fn parameters_mut(&mut self) -> Vec<(&mut Matrix, &Matrix)> {
        self.layers.iter_mut()
            .flat_map(|layer| {
                let Layer { weights, biases, weights_grad, biases_grad, .. } = layer;
                [(weights, &*weights_grad), (biases, &*biases_grad)]
            })
            .collect()
    }

    /// Parameters in a stable order: `layers.{i}.weight`, `layers.{i}.bias`.
    pub fn named_parameters(&self) -> Vec<NamedParameter<'_>> {
        self.layers.iter().enumerate()
            .flat_map(|(i, layer)| {
                [
                    NamedParameter {
                        name: format!("layers.{}.weight", i),
                        value: &layer.weights,
                        grad: &layer.weights_grad,
                    },
                    NamedParameter {
                        name: format!("layers.{}.bias", i),
                        value: &layer.biases,
                        grad: &layer.biases_grad,
                    },
                ]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use rand::{rngs::StdRng, SeedableRng};

    fn small() -> Network {
        let specs = [
            LayerSpec { size: 4, input_size: 3, activation: ActivationFunction::ReLU },
            LayerSpec { size: 2, input_size: 4, activation: ActivationFunction::Softmax },
        ];
        Network::from_specs(&specs, &mut StdRng::seed_from_u64(3))
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let net = small();
        let err = net.predict(&Matrix::row(vec![1.0, 2.0])).unwrap_err();
        assert!(matches!(err, TrainError::Computation(_)));
    }

    #[test]
    fn test_predict_outputs_probabilities() {
        let net = small();
        let out = net.predict(&Matrix::from_data(vec![vec![0.1, 0.2, 0.3]; 5])).unwrap();
        assert_eq!(out.shape(), (5, 2));
        for row in &out.data {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_backward_requires_training_forward() {
        let mut net = small();
        net.predict(&Matrix::row(vec![0.0, 0.0, 1.0])).unwrap();
        assert!(net.backward(&Matrix::row(vec![0.5, -0.5])).is_err());
    }

    #[test]
    fn test_named_parameters_order() {
        let net = small();
        let names: Vec<String> = net.named_parameters().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["layers.0.weight", "layers.0.bias", "layers.1.weight", "layers.1.bias"]);
        assert_eq!(net.parameter_count(), 3 * 4 + 4 + 4 * 2 + 2);
    }
}
