//! Thread-safe source of uniform floats, integers, and booleans for the
//! optimization kernel. Seeding *policy* (how a run picks its initial seed,
//! whether runs are replayed bit-for-bit) is a collaborator's decision, not
//! this crate's; what the kernel needs is only the `rand::RngCore` contract
//! plus a convenient per-thread PRNG to hand to algorithms that don't care
//! which generator backs it.

pub use rand::{Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// A 32-byte seed, opaque to the kernel. Two simulation steps replayed with
/// the same `Seed` draw the same sequence of random numbers from `Prng`.
pub type Seed = [u8; 32];

/// The concrete PRNG used when a caller has no reason to plug in their own.
/// `Xoshiro256PlusPlus` is not cryptographically secure, which is the right
/// trade for an optimization loop that may draw billions of numbers.
pub type Prng = Xoshiro256PlusPlus;

/// Derives a fresh, process-wide-unique seed from the OS entropy source.
/// Call once per simulation run, or once per generation if per-generation
/// replay is desired.
pub fn random_seed() -> Seed {
    let mut seed = Seed::default();
    rand::thread_rng().fill(&mut seed[..]);
    seed
}

/// Builds the kernel's standard `Prng` from a `Seed`.
pub fn seed_rng(seed: Seed) -> Prng {
    Prng::from_seed(seed)
}

/// Draws a `Prng` seeded from OS entropy, for callers that don't need replay.
pub fn thread_prng() -> Prng {
    seed_rng(random_seed())
}
