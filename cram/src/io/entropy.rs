//! Seeding the generator from the operating system.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use rand::rngs::OsRng;
use tracing::debug;

use crate::core::rng::Generator;

/// Seed a generator from OS entropy, falling back to a time and process-id
/// mix when the entropy source is unavailable.
pub fn seed_generator() -> Generator {
    Generator::from_seed(entropy_seed())
}

fn entropy_seed() -> u64 {
    let mut bytes = [0u8; 8];
    match OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => {
            let seed = u64::from_le_bytes(bytes);
            if seed != 0 {
                return seed;
            }
            debug!("os entropy returned zero seed; using fallback");
        }
        Err(err) => debug!(error = %err, "os entropy unavailable; using fallback"),
    }
    fallback_seed()
}

fn fallback_seed() -> u64 {
    let (secs, nanos) = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| (elapsed.as_secs(), u64::from(elapsed.subsec_nanos())))
        .unwrap_or((0, 0));
    nanos ^ (secs << 32) ^ u64::from(std::process::id())
}
