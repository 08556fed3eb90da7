#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Seeded spawning system responsible for emitting tile spawn commands.

use log::error;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tile_slide_core::{Command, Event, TileValue};
use tile_slide_world::{query, World};

/// Probability of spawning a four instead of a two when nothing else is configured.
pub const DEFAULT_FOUR_PROBABILITY: f64 = 0.5;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
    four_probability: f64,
}

impl Config {
    /// Creates a new configuration using the provided seed and the default value odds.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            four_probability: DEFAULT_FOUR_PROBABILITY,
        }
    }

    /// Overrides the probability of spawning a four. Values are clamped to `0.0..=1.0`;
    /// non-finite values fall back to the default.
    #[must_use]
    pub fn with_four_probability(mut self, probability: f64) -> Self {
        self.four_probability = if probability.is_finite() {
            probability.clamp(0.0, 1.0)
        } else {
            DEFAULT_FOUR_PROBABILITY
        };
        self
    }
}

/// Pure system that answers every spawn request with a tile in a random empty cell.
#[derive(Debug)]
pub struct Spawning {
    rng: ChaCha8Rng,
    four_probability: f64,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            four_probability: config.four_probability,
        }
    }

    /// Consumes events and emits one spawn command per spawn request.
    ///
    /// The world requests tiles one at a time, so each request observes the cells
    /// left empty by the previous spawn.
    pub fn handle(&mut self, events: &[Event], world: &World, out: &mut Vec<Command>) {
        for event in events {
            if !matches!(event, Event::SpawnRequested) {
                continue;
            }

            match query::random_empty_cell(world, &mut self.rng) {
                Ok(cell) => {
                    let value = self.next_value();
                    out.push(Command::SpawnTile { cell, value });
                }
                Err(error) => error!("cannot honour spawn request: {error}"),
            }
        }
    }

    fn next_value(&mut self) -> TileValue {
        if self.rng.gen_bool(self.four_probability) {
            TileValue::FOUR
        } else {
            TileValue::TWO
        }
    }
}
