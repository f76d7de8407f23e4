//! Texas Holdem engine: cards, decks, exact hand evaluation, and win/tie/lose
//! equity computation over unknown cards.
//!
//! The core is pure and deterministic: the evaluator ranks any 5-to-7 card set
//! into a totally ordered [`hand::Hand`], and the equity engine either
//! enumerates every completion of the unknown cards exactly or samples them
//! with a seeded, reproducible Monte Carlo run. A lightweight table driver in
//! [`texas`] runs betting rounds to a showdown on top of the same evaluator.

pub mod betting;
pub mod cli;
pub mod combo;
pub mod deck;
pub mod equity;
pub mod error;
pub mod hand;
pub mod texas;

use rand::prelude::*;
use rand_chacha::ChaCha20Rng;
use rand_seeder::Seeder;

/// Unique identifier for a player at a table, or a contender in an equity
/// query. Opaque to the engine: no behavior is attached.
pub type PlayerID = u64;

/// Construct a random number generator from a seed string, or use a default-initialized one if no seed is provided
pub fn rng_from_seed<S: AsRef<[u8]>>(seed: Option<S>) -> Box<dyn RngCore> {
    match seed {
        // with a seed, create a ChaCha20Rng from the seed
        Some(seed) => Box::new(Seeder::from(seed.as_ref()).into_rng::<ChaCha20Rng>()),
        // without a seed, use the default random number generator
        None => Box::new(rand::rng()),
    }
}
