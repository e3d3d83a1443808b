pub mod logging;
pub mod run_dir;
pub mod seed;

pub use logging::init_logging;
pub use run_dir::{RunDir, CONFIG_FILE, HISTORY_FILE, LOG_FILE};
pub use seed::seeded_rng;
