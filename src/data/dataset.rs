use std::fmt;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::data::idx::parse_idx_pair;
use crate::data::loader::DataLoader;
use crate::data::toy;
use crate::error::{Result, TrainError};

/// Samples generated for the circles and blobs problems.
const TOY_SAMPLES: usize = 400;
/// Samples generated for the spiral problem.
const SPIRAL_SAMPLES: usize = 600;
/// Percentage of toy samples held out for validation.
const TOY_VAL_PCT: usize = 20;

/// The fixed set of datasets a run can name in `dataset.name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetName {
    #[serde(rename = "MNIST")]
    Mnist,
    #[serde(rename = "FashionMNIST")]
    FashionMnist,
    #[serde(rename = "XOR")]
    Xor,
    Circles,
    Blobs,
    Spiral,
}

impl DatasetName {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetName::Mnist => "MNIST",
            DatasetName::FashionMnist => "FashionMNIST",
            DatasetName::Xor => "XOR",
            DatasetName::Circles => "Circles",
            DatasetName::Blobs => "Blobs",
            DatasetName::Spiral => "Spiral",
        }
    }

    pub fn num_classes(&self) -> usize {
        match self {
            DatasetName::Mnist | DatasetName::FashionMnist => 10,
            DatasetName::Spiral => 3,
            DatasetName::Xor | DatasetName::Circles | DatasetName::Blobs => 2,
        }
    }

    /// Where IDX files are looked up when `dataset.root` is not set.
    pub fn default_root(&self) -> PathBuf {
        Path::new("data").join(self.as_str().to_lowercase())
    }
}

impl fmt::Display for DatasetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Training and validation loaders plus the shape facts a model needs.
#[derive(Debug)]
pub struct Dataset {
    pub name: DatasetName,
    pub num_classes: usize,
    /// Features per example fed to the first layer.
    pub in_channels: usize,
    pub train: DataLoader,
    pub val: DataLoader,
}

type Split = (Vec<Vec<f64>>, Vec<usize>);

fn read_idx(root: &Path, images: &str, labels: &str, n_classes: usize) -> Result<Split> {
    let read = |file: &str| {
        let path = root.join(file);
        std::fs::read(&path)
            .map_err(|e| TrainError::dataset(format!("cannot read '{}': {}", path.display(), e)))
    };
    parse_idx_pair(&read(images)?, &read(labels)?, n_classes)
}

impl Dataset {
    /// Loads `name` and wraps it in loaders. The training loader reshuffles
    /// every epoch from a stream seeded off `rng`; validation order is fixed.
    pub fn load(
        name: DatasetName,
        root: Option<&Path>,
        train_batch_size: usize,
        val_batch_size: usize,
        rng: &mut StdRng,
    ) -> Result<Dataset> {
        let num_classes = name.num_classes();
        let ((train_x, train_y), (val_x, val_y)) = match name {
            DatasetName::Mnist | DatasetName::FashionMnist => {
                let root = root.map(Path::to_path_buf).unwrap_or_else(|| name.default_root());
                debug!(root = %root.display(), "reading IDX files");
                (
                    read_idx(&root, "train-images-idx3-ubyte", "train-labels-idx1-ubyte", num_classes)?,
                    read_idx(&root, "t10k-images-idx3-ubyte", "t10k-labels-idx1-ubyte", num_classes)?,
                )
            }
            DatasetName::Xor => (toy::xor(), toy::xor()),
            DatasetName::Circles => {
                let (x, y) = toy::circles(TOY_SAMPLES);
                toy::split(x, y, TOY_VAL_PCT)
            }
            DatasetName::Blobs => {
                let (x, y) = toy::blobs(TOY_SAMPLES);
                toy::split(x, y, TOY_VAL_PCT)
            }
            DatasetName::Spiral => {
                let (x, y) = toy::spiral(SPIRAL_SAMPLES);
                toy::split(x, y, TOY_VAL_PCT)
            }
        };

        let shuffle_rng = StdRng::seed_from_u64(rng.gen());
        let train = DataLoader::new(train_x, train_y, train_batch_size)?.shuffled(shuffle_rng);
        let val = DataLoader::new(val_x, val_y, val_batch_size)?;

        if train.is_empty() || val.is_empty() {
            return Err(TrainError::dataset(format!("{} has an empty training or validation split", name)));
        }
        if train.feature_count() != val.feature_count() {
            return Err(TrainError::dataset(format!(
                "{} splits disagree on feature count ({} vs {})",
                name,
                train.feature_count(),
                val.feature_count()
            )));
        }

        Ok(Dataset { name, num_classes, in_channels: train.feature_count(), train, val })
    }
}
