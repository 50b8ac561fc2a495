//! Child seed derivation.
//!
//! A fork's seed is a pure function of its parent's seed and its label:
//! FNV-1a over the label with the offset basis salted by the parent, followed by
//! a murmur3 finalizer so that single-character label edits avalanche across all
//! output bits. The result is folded into the Lehmer state space
//! `[1, 2^31 - 2]`.

use crate::stream::MODULUS;

const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Substitute for a derivation that folds to zero, the generator's fixed point.
pub const DERIVED_ZERO_REMAP: u32 = 0x1B87_3593;

/// Derive the seed of the fork named `label` under `parent_seed`.
pub fn derive(parent_seed: u32, label: &str) -> u32 {
    let hash = fnv1a32(fmix32(parent_seed) ^ FNV_OFFSET_BASIS, label.as_bytes());
    fold(fmix32(hash ^ parent_seed.rotate_left(16)))
}

/// Fold an arbitrary text seed into the state space.
pub fn seed_from_text(text: &str) -> u32 {
    derive(0, text)
}

fn fnv1a32(basis: u32, bytes: &[u8]) -> u32 {
    let mut hash = basis;
    for &b in bytes {
        hash ^= u32::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Murmur3 32-bit finalizer. A bijection on `u32`.
pub(crate) fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 13;
    h = h.wrapping_mul(0xC2B2_AE35);
    h ^ (h >> 16)
}

fn fold(value: u32) -> u32 {
    match value % MODULUS {
        0 => DERIVED_ZERO_REMAP,
        folded => folded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::RandomSource;
    use crate::stream::Stream;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn derive_is_deterministic() {
        assert_eq!(derive(1337, "starfield"), derive(1337, "starfield"));
        assert_eq!(seed_from_text("belt"), seed_from_text("belt"));
    }

    #[test]
    fn parent_changes_child() {
        assert_ne!(derive(1, "belt"), derive(2, "belt"));
    }

    #[test]
    fn fold_never_yields_zero() {
        assert_eq!(fold(0), DERIVED_ZERO_REMAP);
        assert_eq!(fold(MODULUS), DERIVED_ZERO_REMAP);
        assert_eq!(fold(MODULUS + 5), 5);
    }

    #[test]
    fn ten_thousand_label_pairs_are_independent() {
        let mut labels = Stream::new(97, "labels");
        let mut total_bits = 0u64;
        let pairs = 10_000;
        for index in 0..pairs {
            let parent = labels.draw();
            let a = format!("fork-{}-{}", index, labels.draw());
            let b = format!("fork-{}-{}", index, labels.draw());
            let (seed_a, seed_b) = (derive(parent, &a), derive(parent, &b));
            assert_ne!(seed_a, seed_b, "collision for {a} / {b} under {parent}");
            total_bits += u64::from((seed_a ^ seed_b).count_ones());
        }
        let mean = total_bits as f64 / pairs as f64;
        assert!((14.5..16.5).contains(&mean), "mean differing bits {mean}");
    }

    #[test]
    fn sibling_labels_do_not_collide() {
        let seeds: HashSet<u32> = (0..10_000)
            .map(|index| derive(1337, &format!("fragment:{index}")))
            .collect();
        assert_eq!(seeds.len(), 10_000);
    }

    #[test]
    fn one_character_edit_avalanches() {
        let mut flipped = 0u32;
        for index in 0..2_000 {
            let base = format!("belt-{index:04}a");
            let edited = format!("belt-{index:04}b");
            flipped += (derive(42, &base) ^ derive(42, &edited)).count_ones();
        }
        let mean = f64::from(flipped) / 2_000.0;
        assert!((14.0..17.0).contains(&mean), "mean flipped bits {mean}");
    }

    proptest! {
        #[test]
        fn derived_seeds_stay_in_state_space(parent in any::<u32>(), label in ".{0,32}") {
            let seed = derive(parent, &label);
            prop_assert!(seed >= 1);
            prop_assert!(seed < MODULUS);
        }
    }
}
