//! Random shortcode allocation.
//!
//! Codes are drawn from the 62-character alphanumeric alphabet and
//! re-sampled until one is free. With a 6-character code space of
//! 62^6 entries the expected number of attempts is ~1 for any realistic
//! store, so the loop is effectively unbounded; the attempt cap exists
//! only to turn a corrupted exclusion set into an error instead of a hang.

use rand::RngExt;
use std::collections::HashSet;
use thiserror::Error;

const ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const DEFAULT_CODE_LENGTH: usize = 6;

const MAX_ATTEMPTS: usize = 1 << 20;

#[derive(Debug, Error)]
#[error("no free shortcode of length {length} after {attempts} attempts")]
pub struct AllocationExhausted {
    pub length: usize,
    pub attempts: usize,
}

/// Returns a random code of `length` characters that is absent from
/// `existing`. The caller is responsible for folding the returned code
/// into `existing` before allocating again in the same batch.
pub fn allocate(
    existing: &HashSet<String>,
    length: usize,
) -> Result<String, AllocationExhausted> {
    let mut rng = rand::rng();
    for _ in 0..MAX_ATTEMPTS {
        let code: String = (0..length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        if !existing.contains(&code) {
            return Ok(code);
        }
    }
    Err(AllocationExhausted {
        length,
        attempts: MAX_ATTEMPTS,
    })
}
