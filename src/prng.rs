//! Deterministic byte stream compatible with the SHA1PRNG generator used by
//! the wallet platform.
//!
//! Every wallet derives its whole key tree from this stream, so the output has
//! to match the platform byte-for-byte, including its signed-byte state update.

use rand::RngCore;
use sha1::{Digest, Sha1};
use zeroize::Zeroize;

use crate::error::{Error, Result};

const DIGEST_SIZE: usize = 20;

/// A seeded SHA1PRNG stream.
///
/// The stream is resumable: a draw of `n` bytes followed by a draw of `m`
/// bytes yields the same bytes as a single draw of `n + m`.
pub struct Sha1Prng {
    state: [u8; DIGEST_SIZE],
    remainder: [u8; DIGEST_SIZE],
    rem_count: usize,
}

impl Sha1Prng {
    pub fn new<A: AsRef<[u8]>>(seed: A) -> Self {
        Sha1Prng {
            state: Sha1::digest(seed.as_ref()).into(),
            remainder: [0u8; DIGEST_SIZE],
            rem_count: 0,
        }
    }

    pub fn next_bytes(&mut self, count: usize) -> Vec<u8> {
        let mut out = vec![0u8; count];
        self.fill(&mut out);
        out
    }

    pub fn fill(&mut self, out: &mut [u8]) {
        let mut index = 0;

        // Serve cached digest bytes first.
        if self.rem_count > 0 {
            let todo = out.len().min(DIGEST_SIZE - self.rem_count);
            let cached = &mut self.remainder[self.rem_count..self.rem_count + todo];
            out[..todo].copy_from_slice(cached);
            cached.fill(0);
            self.rem_count += todo;
            index += todo;
        }

        while index < out.len() {
            let mut output: [u8; DIGEST_SIZE] = Sha1::digest(self.state).into();
            self.update_state(&output);

            let todo = (out.len() - index).min(DIGEST_SIZE);
            out[index..index + todo].copy_from_slice(&output[..todo]);
            output[..todo].fill(0);
            index += todo;
            self.rem_count += todo;
            self.remainder = output;
        }

        self.rem_count %= DIGEST_SIZE;
    }

    /// Returns a value in `[0, bound)`.
    pub fn next_int(&mut self, bound: i32) -> Result<i32> {
        if bound <= 0 {
            return Err(Error::InvalidBound(bound));
        }
        Ok(self.bounded(bound))
    }

    /// Returns a value in `[0, 1)` built from a single byte.
    pub fn next_float(&mut self) -> f64 {
        let mut byte = [0u8; 1];
        self.fill(&mut byte);
        f64::from(byte[0]) / 256.0
    }

    /// `bound` must be positive.
    pub(crate) fn bounded(&mut self, bound: i32) -> i32 {
        debug_assert!(bound > 0);
        let mut r = self.next_bits(31) as i32;
        let m = bound - 1;
        if bound & m == 0 {
            return ((i64::from(bound) * i64::from(r)) >> 31) as i32;
        }
        // Reject draws from the incomplete block at the top of the range.
        let mut u = r;
        loop {
            r = u % bound;
            if u.wrapping_sub(r).wrapping_add(m) >= 0 {
                return r;
            }
            u = self.next_bits(31) as i32;
        }
    }

    fn next_bits(&mut self, bits: u32) -> u32 {
        let num_bytes = ((bits + 7) / 8) as usize;
        let mut bytes = [0u8; 4];
        self.fill(&mut bytes[..num_bytes]);
        let next = bytes[..num_bytes]
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
        (next >> (num_bytes as u32 * 8 - bits)) as u32
    }

    // state(n + 1) = (state(n) + output(n) + 1) % 2^160, on signed bytes.
    fn update_state(&mut self, output: &[u8; DIGEST_SIZE]) {
        let mut last: i32 = 1;
        let mut changed = false;
        for (state_byte, &output_byte) in self.state.iter_mut().zip(output.iter()) {
            let signed = i32::from(*state_byte as i8);
            let v = signed + i32::from(output_byte as i8) + last;
            let t = v & 0xFF;
            changed |= signed != t;
            *state_byte = t as u8;
            last = v >> 8;
        }

        if !changed {
            self.state[0] = self.state[0].wrapping_add(1) % 0xFF;
        }
    }
}

impl Drop for Sha1Prng {
    fn drop(&mut self) {
        self.state.zeroize();
        self.remainder.zeroize();
    }
}

impl RngCore for Sha1Prng {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.fill(&mut bytes);
        u32::from_be_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.fill(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.fill(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        self.fill(dest);
        Ok(())
    }
}
