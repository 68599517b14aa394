// src/miner/digest.rs
//! Digest engine with prefix state reuse
//!
//! The bytes of a block that do not depend on the nonce are absorbed once
//! into a [`PreparedState`]. Each candidate then only clones that state and
//! absorbs the nonce (plus any fixed trailing bytes) before finalising, so
//! the cost per candidate does not grow with the size of the prefix.

use crate::block::HashTemplate;
use crate::types::AlgorithmType;
use crate::utils::error::MinerError;
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::sync::Arc;

/// Length in bytes of every digest produced by the engine
pub const DIGEST_LEN: usize = 32;

/// A 32-byte digest
///
/// Rendered as 64 lowercase hex characters. The raw bytes stay accessible
/// so the digest can be fed into further hashing, e.g. an address pipeline.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a 64-character hex string
    pub fn from_hex(s: &str) -> Result<Self, MinerError> {
        let bytes = hex::decode(s)?;
        let bytes: [u8; DIGEST_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            MinerError::InputError(format!("Expected {} digest bytes, got {}", DIGEST_LEN, b.len()))
        })?;
        Ok(Self(bytes))
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

/// Hash state after absorbing the fixed prefix of a preimage
///
/// Cloning is cheap: the SHA-256 state is a few dozen bytes and the
/// trailing bytes are shared behind an `Arc`.
#[derive(Clone)]
pub struct PreparedState {
    hasher: Sha256,
    trailer: Arc<[u8]>,
}

impl fmt::Debug for PreparedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedState")
            .field("trailer_len", &self.trailer.len())
            .finish_non_exhaustive()
    }
}

/// Computes candidate digests for one algorithm
///
/// The engine itself holds no hashing state; every worker gets its own
/// [`PreparedState`] clone.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DigestEngine {
    algorithm: AlgorithmType,
}

impl DigestEngine {
    /// Creates an engine for `algorithm`
    pub fn new(algorithm: AlgorithmType) -> Self {
        Self { algorithm }
    }

    /// Creates an engine from a configured algorithm name
    ///
    /// # Errors
    /// `MinerError::ConfigError` if the name is not a supported algorithm.
    pub fn from_name(name: &str) -> Result<Self, MinerError> {
        let algorithm = name
            .parse()
            .map_err(|_| MinerError::ConfigError(format!("Invalid algorithm: {}", name)))?;
        Ok(Self::new(algorithm))
    }

    /// Algorithm this engine computes
    pub fn algorithm(&self) -> AlgorithmType {
        self.algorithm
    }

    /// Absorbs `prefix` once and returns the reusable state
    pub fn prepare(&self, prefix: &[u8]) -> PreparedState {
        let mut hasher = Sha256::new();
        hasher.update(prefix);
        PreparedState {
            hasher,
            trailer: Arc::from(&[][..]),
        }
    }

    /// Prepares a template: absorbs its prefix and records its suffix so
    /// [`extend_and_digest`](Self::extend_and_digest) appends it after the nonce
    pub fn prepare_template(&self, template: &HashTemplate) -> PreparedState {
        PreparedState {
            trailer: Arc::from(template.suffix()),
            ..self.prepare(template.prefix())
        }
    }

    /// Finishes a digest from a prepared state and the variable bytes
    pub fn extend_and_digest(&self, state: &PreparedState, suffix: &[u8]) -> Digest {
        let mut hasher = state.hasher.clone();
        hasher.update(suffix);
        hasher.update(&state.trailer);
        self.finish(hasher)
    }

    /// One-shot digest of a complete preimage
    pub fn digest(&self, data: &[u8]) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(data);
        self.finish(hasher)
    }

    #[inline]
    fn finish(&self, hasher: Sha256) -> Digest {
        let first = hasher.finalize();
        let mut out = [0u8; DIGEST_LEN];
        match self.algorithm {
            AlgorithmType::Sha256 => out.copy_from_slice(&first),
            AlgorithmType::Sha256d => out.copy_from_slice(&Sha256::digest(first)),
        }
        Digest(out)
    }
}

impl Default for DigestEngine {
    fn default() -> Self {
        Self::new(AlgorithmType::Sha256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn prepared_prefix_matches_one_shot_sha256() {
        let engine = DigestEngine::new(AlgorithmType::Sha256);
        let state = engine.prepare(b"ab");
        let digest = engine.extend_and_digest(&state, b"c");
        assert_eq!(
            digest.as_bytes(),
            &hex!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
        assert_eq!(digest, engine.digest(b"abc"));
    }

    #[test]
    fn double_sha256_known_vector() {
        let engine = DigestEngine::new(AlgorithmType::Sha256d);
        let state = engine.prepare(b"hel");
        assert_eq!(
            engine.extend_and_digest(&state, b"lo").as_bytes(),
            &hex!("9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50")
        );
    }

    #[test]
    fn state_is_reusable_across_candidates() {
        let engine = DigestEngine::default();
        let state = engine.prepare(b"payload-");
        let a = engine.extend_and_digest(&state, b"1");
        let b = engine.extend_and_digest(&state, b"2");
        assert_ne!(a, b);
        assert_eq!(a, engine.extend_and_digest(&state, b"1"));
        assert_eq!(a, engine.digest(b"payload-1"));
    }

    #[test]
    fn template_trailer_is_absorbed_after_nonce() {
        let engine = DigestEngine::default();
        let template = HashTemplate::new("pre|", "|post");
        let state = engine.prepare_template(&template);
        assert_eq!(
            engine.extend_and_digest(&state, b"99"),
            engine.digest(&template.preimage(99))
        );
    }

    #[test]
    fn hex_rendering_is_lowercase_and_fixed_length() {
        let digest = DigestEngine::default().digest(b"hello");
        let hex = digest.to_hex();
        assert_eq!(hex.len(), DIGEST_LEN * 2);
        assert_eq!(
            hex,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(Digest::from_hex(&hex).unwrap(), digest);
        assert!(Digest::from_hex("abcd").is_err());
    }

    #[test]
    fn unknown_algorithm_fails_at_construction() {
        assert!(matches!(
            DigestEngine::from_name("scrypt"),
            Err(MinerError::ConfigError(_))
        ));
        assert_eq!(
            DigestEngine::from_name("sha256d").unwrap().algorithm(),
            AlgorithmType::Sha256d
        );
    }
}
