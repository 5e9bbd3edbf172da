//! Pseudo-random generator and unbiased shuffle.
//!
//! The generator is xorshift64* over a single non-zero word. Range draws use
//! Lemire-style rejection against `2^64 mod upper`, with a bounded number of
//! retries: after [`RETRY_LIMIT`] rejected draws one more draw is accepted
//! unconditionally. That last draw may carry a tiny modulo bias; the bound
//! keeps every call O(1).

use rand::RngCore;

/// Rejected draws tolerated before accepting one unconditionally.
pub const RETRY_LIMIT: usize = 16;

/// xorshift is stuck at zero, so a zero state is replaced by this constant.
const NONZERO_STATE: u64 = 0x9e37_79b9_7f4a_7c15;

const OUTPUT_MULTIPLIER: u64 = 0x2545_f491_4f6c_dd1d;

/// 64-bit xorshift-multiply generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generator {
    state: u64,
}

impl Generator {
    /// Build a generator from raw seed material. The seed is passed through a
    /// 64-bit finalizer so that nearby seeds give unrelated streams.
    pub fn from_seed(seed: u64) -> Self {
        let state = mix64(seed);
        Self {
            state: if state == 0 { NONZERO_STATE } else { state },
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(OUTPUT_MULTIPLIER)
    }

    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Uniform index in `[0, upper)`. Returns 0 when `upper == 0`.
    pub fn uniform(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        let upper = upper as u64;
        let threshold = upper.wrapping_neg() % upper;
        for _ in 0..RETRY_LIMIT {
            let draw = self.next_u64();
            if draw >= threshold {
                return (draw % upper) as usize;
            }
        }
        (self.next_u64() % upper) as usize
    }

    /// In-place Fisher–Yates, walking forward from index 1.
    pub fn shuffle<T>(&mut self, values: &mut [T]) {
        if values.len() < 2 {
            return;
        }
        for i in 1..values.len() {
            let j = self.uniform(i + 1);
            values.swap(i, j);
        }
    }
}

impl RngCore for Generator {
    fn next_u32(&mut self) -> u32 {
        Generator::next_u32(self)
    }

    fn next_u64(&mut self) -> u64 {
        Generator::next_u64(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = Generator::next_u64(self).to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// splitmix64 finalizer.
fn mix64(mut x: u64) -> u64 {
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33;
    x = x.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    x ^= x >> 33;
    x
}
