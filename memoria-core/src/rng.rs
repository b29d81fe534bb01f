//! Per-trial random streams.
//!
//! Each trial gets its own `ChaCha8Rng` seeded from the run seed and the trial
//! index, so a trial's outcome does not depend on how many trials ran before it
//! or on which thread runs it.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::Sha256;

const TRIAL_DOMAIN: &[u8] = b"memoria-trial";

/// Derive the seed of trial `trial` from a run seed.
#[must_use]
pub fn derive_trial_seed(seed: u64, trial: u64) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&seed.to_le_bytes()).expect("HMAC accepts any key length");
    mac.update(TRIAL_DOMAIN);
    mac.update(&trial.to_le_bytes());
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("SHA-256 digest has 32 bytes");
    u64::from_le_bytes(seed_bytes)
}

/// Random stream owned by a single trial.
#[must_use]
pub fn trial_rng(seed: u64, trial: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_trial_seed(seed, trial))
}

/// Fresh run seed from OS entropy.
#[must_use]
pub fn entropy_seed() -> u64 {
    rand::random()
}
