pub mod criterion;
pub mod cross_entropy;

pub use criterion::Criterion;
pub use cross_entropy::CrossEntropyLoss;
