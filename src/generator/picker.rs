//! Seedable selection from fixed pools.

use crate::config::Variety;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Chooses an entry from a non-empty pool.
///
/// [`Variety::Single`] always returns the first entry. [`Variety::Random`]
/// picks uniformly using an owned RNG, which can be seeded for repeatable
/// choices.
#[derive(Debug)]
pub struct Picker {
    variety: Variety,
    rng: Mutex<StdRng>,
}

impl Picker {
    /// Picker seeded from OS entropy.
    pub fn new(variety: Variety) -> Self {
        Self {
            variety,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Picker with a fixed seed.
    pub fn seeded(variety: Variety, seed: u64) -> Self {
        Self {
            variety,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn variety(&self) -> Variety {
        self.variety
    }

    /// Pick an entry. Returns `None` only for an empty pool.
    pub fn pick<'a>(&self, pool: &[&'a str]) -> Option<&'a str> {
        if pool.len() <= 1 || self.variety == Variety::Single {
            return pool.first().copied();
        }

        let index = match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0..pool.len()),
            // A poisoned RNG still holds usable state.
            Err(poisoned) => poisoned.into_inner().gen_range(0..pool.len()),
        };
        pool.get(index).copied()
    }
}
