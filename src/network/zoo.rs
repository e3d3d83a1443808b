use std::fmt;

use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::network::network::Network;
use crate::network::spec::{classifier, LayerSpec};

/// The fixed set of architectures a run can name in `model.name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelName {
    /// Single softmax layer (multinomial logistic regression).
    Linear,
    /// One hidden ReLU layer of 64 units.
    #[serde(rename = "MLP")]
    Mlp,
    /// Three hidden ReLU layers, 256 → 128 → 64.
    #[serde(rename = "DeepMLP")]
    DeepMlp,
    /// Two hidden ReLU layers of 512 units.
    #[serde(rename = "WideMLP")]
    WideMlp,
}

impl ModelName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelName::Linear => "Linear",
            ModelName::Mlp => "MLP",
            ModelName::DeepMlp => "DeepMLP",
            ModelName::WideMlp => "WideMLP",
        }
    }

    fn hidden(&self) -> &'static [usize] {
        match self {
            ModelName::Linear => &[],
            ModelName::Mlp => &[64],
            ModelName::DeepMlp => &[256, 128, 64],
            ModelName::WideMlp => &[512, 512],
        }
    }

    /// Layer layout for a dataset with `num_classes` targets and
    /// `in_channels` input features.
    pub fn layer_specs(&self, num_classes: usize, in_channels: usize) -> Vec<LayerSpec> {
        classifier(in_channels, self.hidden(), num_classes)
    }

    /// Constructs a freshly initialized network.
    pub fn build<R: Rng + ?Sized>(&self, num_classes: usize, in_channels: usize, rng: &mut R) -> Network {
        Network::from_specs(&self.layer_specs(num_classes, in_channels), rng)
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_every_model_maps_channels_to_classes() {
        for name in [ModelName::Linear, ModelName::Mlp, ModelName::DeepMlp, ModelName::WideMlp] {
            let net = name.build(10, 784, &mut StdRng::seed_from_u64(0));
            assert_eq!(net.input_size(), 784, "{}", name);
            assert_eq!(net.output_size(), 10, "{}", name);
        }
    }

    #[test]
    fn test_serde_names() {
        let name: ModelName = serde_yaml::from_str("DeepMLP").unwrap();
        assert_eq!(name, ModelName::DeepMlp);
        assert_eq!(serde_yaml::to_string(&ModelName::Mlp).unwrap().trim(), "MLP");
    }
}
