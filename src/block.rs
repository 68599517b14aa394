// src/block.rs
//! Block payloads and the hash templates derived from them
//!
//! A [`BlockPayload`] is the caller's record of what is being mined. Before a
//! search starts it is flattened into a [`HashTemplate`]: the fixed bytes
//! before and after the decimal nonce. Once a nonce is found the payload is
//! wrapped into a [`MinedBlock`] carrying the winning nonce and hash.

use crate::miner::digest::{Digest, DigestEngine};
use crate::miner::scheduler::Solution;
use crate::types::{AlgorithmType, NoncePosition};
use serde::{Deserialize, Serialize};

/// Fixed bytes surrounding the nonce in a hash preimage
///
/// The full preimage for nonce `n` is `prefix || decimal(n) || suffix`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashTemplate {
    prefix: Vec<u8>,
    suffix: Vec<u8>,
}

impl HashTemplate {
    /// Creates a template from explicit prefix and suffix bytes
    pub fn new(prefix: impl Into<Vec<u8>>, suffix: impl Into<Vec<u8>>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Template where the nonce is appended to `prefix`
    pub fn nonce_last(prefix: impl Into<Vec<u8>>) -> Self {
        Self::new(prefix, Vec::new())
    }

    /// Template where the nonce comes before `suffix`
    pub fn nonce_first(suffix: impl Into<Vec<u8>>) -> Self {
        Self::new(Vec::new(), suffix)
    }

    /// Bytes absorbed before the nonce
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Bytes absorbed after the nonce
    pub fn suffix(&self) -> &[u8] {
        &self.suffix
    }

    /// Builds the complete preimage for `nonce`
    pub fn preimage(&self, nonce: u64) -> Vec<u8> {
        let mut buf = itoa::Buffer::new();
        let nonce = buf.format(nonce).as_bytes();
        let mut out = Vec::with_capacity(self.prefix.len() + nonce.len() + self.suffix.len());
        out.extend_from_slice(&self.prefix);
        out.extend_from_slice(nonce);
        out.extend_from_slice(&self.suffix);
        out
    }
}

/// A block waiting to be mined
///
/// Immutable for the duration of a search: the nonce is the search variable
/// and is only attached afterwards, in [`MinedBlock`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPayload {
    /// Height of the block in its chain
    pub index: u64,
    /// Hex hash of the preceding block
    pub previous_hash: String,
    /// Arbitrary block contents
    pub data: String,
    /// Creation time in seconds since the Unix epoch
    pub timestamp: i64,
    /// Required number of leading zero hex digits
    pub difficulty: u32,
}

impl BlockPayload {
    /// Creates a new payload
    pub fn new(
        index: u64,
        previous_hash: impl Into<String>,
        data: impl Into<String>,
        timestamp: i64,
        difficulty: u32,
    ) -> Self {
        Self {
            index,
            previous_hash: previous_hash.into(),
            data: data.into(),
            timestamp,
            difficulty,
        }
    }

    /// Flattens the payload into the fixed parts of its hash preimage
    ///
    /// See [`NoncePosition`] for the byte layout of each variant.
    pub fn template(&self, position: NoncePosition) -> HashTemplate {
        let body = format!("{}{}", self.data, self.timestamp);
        match position {
            NoncePosition::Leading => HashTemplate::nonce_first(body),
            NoncePosition::Trailing => {
                HashTemplate::nonce_last(format!("{}{}", self.previous_hash, body))
            }
        }
    }

    /// Hashes the payload with `nonce` in one shot, without a prepared state
    pub fn calculate_hash(
        &self,
        nonce: u64,
        position: NoncePosition,
        algorithm: AlgorithmType,
    ) -> Digest {
        DigestEngine::new(algorithm).digest(&self.template(position).preimage(nonce))
    }

    /// Attaches a winning solution, producing the mined block
    pub fn into_mined(
        self,
        solution: &Solution,
        position: NoncePosition,
        algorithm: AlgorithmType,
    ) -> MinedBlock {
        MinedBlock {
            payload: self,
            nonce: solution.nonce,
            hash: solution.digest.to_hex(),
            algorithm,
            nonce_position: position,
        }
    }
}

/// A payload together with the nonce that satisfies its difficulty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinedBlock {
    /// The payload that was mined
    #[serde(flatten)]
    pub payload: BlockPayload,
    /// Winning nonce
    pub nonce: u64,
    /// Lowercase hex digest of the preimage with the winning nonce
    pub hash: String,
    /// Digest algorithm the block was mined with
    pub algorithm: AlgorithmType,
    /// Preimage layout the block was mined with
    pub nonce_position: NoncePosition,
}

impl MinedBlock {
    /// Recomputes the hash from scratch and checks it against the stored
    /// hash and the payload's difficulty
    pub fn verify(&self) -> bool {
        let digest = self
            .payload
            .calculate_hash(self.nonce, self.nonce_position, self.algorithm);
        digest.to_hex() == self.hash
            && crate::miner::difficulty::satisfies(&self.hash, self.payload.difficulty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BlockPayload {
        BlockPayload::new(1, "0000", "Hello, Blockchain!", 1234567890, 4)
    }

    #[test]
    fn leading_layout_matches_reference_format() {
        let template = sample().template(NoncePosition::Leading);
        assert_eq!(template.preimage(42), b"42Hello, Blockchain!1234567890".to_vec());
        assert!(template.prefix().is_empty());
    }

    #[test]
    fn trailing_layout_commits_to_previous_hash() {
        let template = sample().template(NoncePosition::Trailing);
        assert_eq!(
            template.preimage(7),
            b"0000Hello, Blockchain!12345678907".to_vec()
        );
        assert!(template.suffix().is_empty());
    }

    #[test]
    fn negative_timestamps_render_with_sign() {
        let payload = BlockPayload::new(0, "", "x", -5, 0);
        assert_eq!(
            payload.template(NoncePosition::Leading).preimage(0),
            b"0x-5".to_vec()
        );
    }

    #[test]
    fn tampered_block_fails_verification() {
        let payload = sample();
        let digest = payload.calculate_hash(0, NoncePosition::Leading, AlgorithmType::Sha256);
        let block = MinedBlock {
            payload: BlockPayload { difficulty: 0, ..payload },
            nonce: 0,
            hash: digest.to_hex(),
            algorithm: AlgorithmType::Sha256,
            nonce_position: NoncePosition::Leading,
        };
        assert!(block.verify());

        let tampered = MinedBlock {
            nonce: 1,
            ..block
        };
        assert!(!tampered.verify());
    }
}
