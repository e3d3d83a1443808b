pub mod dataset;
pub mod idx;
pub mod loader;
pub mod toy;

pub use dataset::{Dataset, DatasetName};
pub use loader::{Batch, DataLoader};
