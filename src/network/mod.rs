pub mod network;
pub mod spec;
pub mod zoo;

pub use network::{NamedParameter, Network};
pub use spec::LayerSpec;
pub use zoo::ModelName;
