use rand::{rngs::StdRng, SeedableRng};
use tracing::warn;

use crate::config::Config;

/// The single random source of a run. Weight initialization and the
/// training loader's shuffle stream are both drawn from it, so a fixed
/// `seed` reproduces the whole run.
pub fn seeded_rng(config: &Config) -> StdRng {
    match config.seed {
        Some(seed) => {
            warn!(
                "You have chosen to seed training with {}. Runs are reproducible, but \
                 results may differ between machines and library versions.",
                seed
            );
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config::EXAMPLE;
    use rand::Rng;

    #[test]
    fn test_same_seed_same_stream() {
        let config = Config::from_yaml(EXAMPLE).unwrap();
        let a: Vec<u64> = seeded_rng(&config).sample_iter(rand::distributions::Standard).take(8).collect();
        let b: Vec<u64> = seeded_rng(&config).sample_iter(rand::distributions::Standard).take(8).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_different_stream() {
        let a = Config::from_yaml(EXAMPLE).unwrap();
        let mut b = a.clone();
        b.seed = Some(43);
        assert_ne!(seeded_rng(&a).gen::<u64>(), seeded_rng(&b).gen::<u64>());
    }
}
