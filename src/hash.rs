//! Polynomial string hash used for replica identities, key placement on the
//! ring, and bucket selection in the durable store.
//!
//! The function must stay bit-for-bit stable: replica ids and on-disk bucket
//! names are derived from it.

const SEED: i64 = 1125899906842597;

/// Java-style `hashCode` widened to 64 bits with wrapping arithmetic.
pub fn hash_64_bit(s: &str) -> i64 {
    s.bytes().fold(SEED, |h, b| {
        h.wrapping_mul(31).wrapping_add(b as i8 as i64)
    })
}
