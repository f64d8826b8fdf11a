//! Seed derivation for reproducible runs.
//!
//! Every consumer of randomness gets its own ChaCha8 stream derived from the
//! run seed, the tick, and (for organisms) the stable id. Streams never depend
//! on processing order, so passes can run in parallel.

use genesis_data::OrganismId;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const TICK_SALT: u64 = 0x5EED;
const ID_PRIME: u64 = 0x9E37_79B9_7F4A_7C15;

/// Seed for everything that happens in `tick`.
#[must_use]
pub fn tick_seed(run_seed: u64, tick: u64) -> u64 {
    run_seed.wrapping_add(tick).wrapping_add(TICK_SALT)
}

#[must_use]
pub fn create_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Independent stream for one organism within one tick.
#[must_use]
pub fn organism_rng(tick_seed: u64, id: OrganismId, stream: u64) -> ChaCha8Rng {
    let mixed = tick_seed
        .wrapping_add(id.wrapping_mul(ID_PRIME))
        .rotate_left(17)
        ^ stream.wrapping_mul(ID_PRIME);
    ChaCha8Rng::seed_from_u64(mixed)
}

/// Standard normal sample (Box-Muller).
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    let u1 = rng.gen::<f32>().clamp(f32::MIN_POSITIVE, 1.0);
    let u2 = rng.gen::<f32>();
    (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos()
}
