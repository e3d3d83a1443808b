pub mod chart;

pub use chart::{render, save_plot};
