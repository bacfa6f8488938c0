//! The fold behind generated `hash_code()` methods.
//!
//! ```text
//! hash = 17
//! for each non-derived field: hash = hash * 31 + hash_of(field)
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub const HASH_SEED: u64 = 17;
pub const HASH_MULTIPLIER: u64 = 31;

/// Hashes one field value with a fixed-key hasher, so equal values give
/// equal results within a process.
pub fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Folds one field hash into the accumulator.
pub fn combine(accumulator: u64, field_hash: u64) -> u64 {
    accumulator
        .wrapping_mul(HASH_MULTIPLIER)
        .wrapping_add(field_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_values_hash_equal() {
        assert_eq!(hash_of("alpha"), hash_of(&"alpha".to_string()));
        assert_eq!(hash_of(&Some(3u8)), hash_of(&Some(3u8)));
    }

    #[test]
    fn combine_is_order_sensitive() {
        let ab = combine(combine(HASH_SEED, hash_of(&1u8)), hash_of(&2u8));
        let ba = combine(combine(HASH_SEED, hash_of(&2u8)), hash_of(&1u8));
        assert_ne!(ab, ba);
    }

    #[test]
    fn combine_with_zero_is_the_plain_fold() {
        assert_eq!(combine(HASH_SEED, 0), 17 * 31);
    }
}
