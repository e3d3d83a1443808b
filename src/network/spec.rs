use serde::{Serialize, Deserialize};
use crate::activation::activation::ActivationFunction;

/// Describes one layer in a network architecture.
///
/// Fields:
/// - `size`: number of neurons in this layer
/// - `input_size`: output size of the previous layer, or the raw input
///   dimension for the first layer
/// - `activation`: applied after the linear transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub input_size: usize,
    pub activation: ActivationFunction,
}

/// Chains hidden widths into layer specs ending in a softmax classifier head.
pub fn classifier(in_features: usize, hidden: &[usize], num_classes: usize) -> Vec<LayerSpec> {
    let mut specs = Vec::with_capacity(hidden.len() + 1);
    let mut input_size = in_features;
    for &size in hidden {
        specs.push(LayerSpec { size, input_size, activation: ActivationFunction::ReLU });
        input_size = size;
    }
    specs.push(LayerSpec { size: num_classes, input_size, activation: ActivationFunction::Softmax });
    specs
}
