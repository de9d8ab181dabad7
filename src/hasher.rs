/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! 32-byte content digest (C3), used only when verification chooses
//! hash-compare over byte-compare. Optional at build time: with the
//! `hash-verify` feature disabled, [`digest`] is absent and verification
//! falls back to byte-compare exclusively.

#[cfg(feature = "hash-verify")]
use sha2::{Digest, Sha256};

#[cfg(feature = "hash-verify")]
pub fn digest(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
#[cfg(feature = "hash-verify")]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(digest(b"hello"), digest(b"hello"));
    }

    #[test]
    fn digest_distinguishes_content() {
        assert_ne!(digest(b"hello"), digest(b"world"));
    }
}
