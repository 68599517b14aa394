// src/types.rs
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported digest algorithms for the nonce search
///
/// Both variants produce 32-byte digests and are built on the same
/// incremental SHA-256 state, so either can reuse a prepared prefix.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmType {
    /// Single SHA-256 over the preimage
    #[default]
    #[clap(name = "sha256")]
    Sha256,

    /// Double SHA-256: SHA256(SHA256(preimage))
    ///
    /// The construction Bitcoin uses for block headers.
    #[clap(name = "sha256d")]
    Sha256d,
}

impl fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgorithmType::Sha256 => write!(f, "sha256"),
            AlgorithmType::Sha256d => write!(f, "sha256d"),
        }
    }
}

impl FromStr for AlgorithmType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(AlgorithmType::Sha256),
            "sha256d" | "double-sha256" => Ok(AlgorithmType::Sha256d),
            _ => Err(format!("Unknown algorithm: {}", s)),
        }
    }
}

/// Where the decimal nonce sits in a block's hash preimage
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoncePosition {
    /// `{nonce}{data}{timestamp}`
    ///
    /// The reference block format. Nothing precedes the nonce, so the
    /// prepared state is empty and the fixed bytes are absorbed after it.
    #[default]
    #[clap(name = "leading")]
    Leading,

    /// `{previous_hash}{data}{timestamp}{nonce}`
    ///
    /// Commits to the previous hash and lets every byte except the nonce
    /// be absorbed once into the prepared state.
    #[clap(name = "trailing")]
    Trailing,
}

impl fmt::Display for NoncePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoncePosition::Leading => write!(f, "leading"),
            NoncePosition::Trailing => write!(f, "trailing"),
        }
    }
}

impl FromStr for NoncePosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "leading" => Ok(NoncePosition::Leading),
            "trailing" => Ok(NoncePosition::Trailing),
            _ => Err(format!("Unknown nonce position: {}", s)),
        }
    }
}

/// How the parallel coordinator picks among solutions
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchStrategy {
    /// Return whichever worker finds a solution first in wall-clock time
    ///
    /// Fastest, but not deterministic when several solutions exist.
    #[default]
    #[clap(name = "first-found")]
    FirstFound,

    /// Return the lowest satisfying nonce in the searched range
    #[clap(name = "lowest")]
    Lowest,
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStrategy::FirstFound => write!(f, "first-found"),
            SearchStrategy::Lowest => write!(f, "lowest"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_names_round_trip() {
        for algo in [AlgorithmType::Sha256, AlgorithmType::Sha256d] {
            assert_eq!(algo.to_string().parse::<AlgorithmType>(), Ok(algo));
        }
        assert_eq!("SHA-256".parse::<AlgorithmType>(), Ok(AlgorithmType::Sha256));
        assert!("blake2".parse::<AlgorithmType>().is_err());
    }

    #[test]
    fn nonce_position_parses_case_insensitively() {
        assert_eq!("Trailing".parse::<NoncePosition>(), Ok(NoncePosition::Trailing));
        assert!("middle".parse::<NoncePosition>().is_err());
    }
}
