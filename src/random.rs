/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use rand::distributions::Alphanumeric;
use rand::rngs::{OsRng, StdRng};
use rand::{Rng, RngCore, SeedableRng};

/// Cryptographically strong byte source (C2), with a seeded
/// pseudo-random fallback for when the OS entropy device is
/// unavailable. The fallback is reseeded per sub-pass with
/// `seed ^ pass_index ^ offset` so filler data still differs block to
/// block even without a working primary source.
pub struct RandomSource {
    fallback_seed: u64,
}

impl RandomSource {
    pub fn new() -> Self {
        RandomSource {
            fallback_seed: Self::gather_nondeterministic_seed(),
        }
    }

    fn gather_nondeterministic_seed() -> u64 {
        let mut buf = [0u8; 8];
        if OsRng.try_fill_bytes(&mut buf).is_ok() {
            return u64::from_le_bytes(buf);
        }
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        nanos ^ (std::process::id() as u64)
    }

    /// Fills `buf` with fresh random bytes for sub-pass `sub_pass_index`
    /// of top-level pass `pass_index`, at file `offset`.
    pub fn fill(&self, buf: &mut [u8], pass_index: u32, sub_pass_index: u8, offset: u64) {
        if OsRng.try_fill_bytes(buf).is_ok() {
            return;
        }
        let seed = self.fallback_seed ^ u64::from(pass_index) ^ u64::from(sub_pass_index) ^ offset;
        let mut fallback = StdRng::seed_from_u64(seed);
        fallback.fill_bytes(buf);
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::new()
    }
}

/// A 32-character name drawn uniformly from the 62-symbol alphanumeric
/// alphabet, used to obfuscate a file's name before unlink (spec.md
/// §4.6's rename-to-temp step).
pub fn random_alphanumeric_name(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
