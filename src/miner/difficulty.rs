// src/miner/difficulty.rs
//! Leading-zero difficulty rule
//!
//! Difficulty counts leading `'0'` characters in the lowercase hex rendering
//! of a digest. Each unit is one hex nibble (four zero bits); this is not a
//! leading-zero-bits rule and the two must not be mixed.

use crate::miner::digest::{DIGEST_LEN, Digest};

/// Highest difficulty a 32-byte digest can meet
pub const MAX_DIFFICULTY: u32 = (DIGEST_LEN * 2) as u32;

/// Checks a hex digest string against `difficulty`
///
/// Equivalent to `digest_hex.starts_with(&"0".repeat(difficulty))`.
/// A difficulty of zero is met by every digest.
pub fn satisfies(digest_hex: &str, difficulty: u32) -> bool {
    let k = difficulty as usize;
    digest_hex.len() >= k && digest_hex.bytes().take(k).all(|c| c == b'0')
}

/// Number of leading zero hex digits in `bytes`
#[inline]
pub fn leading_zero_nibbles(bytes: &[u8]) -> u32 {
    let mut zeros = 0;
    for byte in bytes {
        if *byte == 0 {
            zeros += 2;
        } else {
            if *byte >> 4 == 0 {
                zeros += 1;
            }
            break;
        }
    }
    zeros
}

/// Byte-level form of [`satisfies`], used in the search loop
#[inline]
pub fn meets_difficulty(digest: &Digest, difficulty: u32) -> bool {
    leading_zero_nibbles(digest.as_bytes()) >= difficulty
}

/// Whether any digest can meet `difficulty`
///
/// Difficulties above [`MAX_DIFFICULTY`] are valid input but no nonce
/// satisfies them, so a search over any range ends exhausted.
#[inline]
pub fn is_attainable(difficulty: u32) -> bool {
    difficulty <= MAX_DIFFICULTY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::digest::DigestEngine;

    fn reference(hex: &str, k: u32) -> bool {
        hex.starts_with(&"0".repeat(k as usize))
    }

    #[test]
    fn zero_difficulty_always_satisfied() {
        assert!(satisfies("ffff", 0));
        assert!(satisfies("", 0));
        assert!(meets_difficulty(&Digest::from([0xff; 32]), 0));
    }

    #[test]
    fn counts_nibbles_not_bits() {
        // 0x0f has four leading zero bits: one nibble
        let mut bytes = [0xffu8; 32];
        bytes[0] = 0x00;
        bytes[1] = 0x0f;
        assert_eq!(leading_zero_nibbles(&bytes), 3);

        // 0x10 has three leading zero bits but no zero nibble
        bytes[1] = 0x10;
        assert_eq!(leading_zero_nibbles(&bytes), 2);
        assert_eq!(leading_zero_nibbles(&[0u8; 32]), 64);
    }

    #[test]
    fn hex_and_byte_predicates_agree() {
        let engine = DigestEngine::default();
        for i in 0..2000u32 {
            let digest = engine.digest(i.to_string().as_bytes());
            let hex = digest.to_hex();
            for k in 0..=6 {
                assert_eq!(satisfies(&hex, k), reference(&hex, k), "{} k={}", hex, k);
                assert_eq!(meets_difficulty(&digest, k), reference(&hex, k), "{} k={}", hex, k);
            }
        }
    }

    #[test]
    fn difficulty_longer_than_input_is_unsatisfied() {
        assert!(!satisfies("000", 4));
        assert!(satisfies("0000", 4));
    }

    #[test]
    fn attainable_bounds() {
        assert!(is_attainable(0));
        assert!(is_attainable(MAX_DIFFICULTY));
        assert!(!is_attainable(MAX_DIFFICULTY + 1));
        assert!(!meets_difficulty(&Digest::from([0u8; 32]), MAX_DIFFICULTY + 1));
    }
}
