//! Deterministic pool identifier.
//!
//! [`PoolId`] is a 32-byte key derived from the canonically ordered token
//! pair and the fee rate. The same `(pair, fee)` always yields the same key
//! regardless of the order the caller passes the tokens in, so distinct fee
//! tiers of one pair are distinct pools.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use super::identity::{IdentityParseError, TokenId, decode_hex32};

/// Domain separation tag mixed into every pool key.
const POOL_KEY_TAG: &[u8] = b"hydra-dex/pool/v1";

/// Unique identifier for a constant-product pool.
///
/// Used as the key in [`super::PoolRegistry`], the event discriminator, and
/// the WebSocket subscription target.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoolId([u8; 32]);

impl PoolId {
    /// Derives the key for `(token_a, token_b, fee_bps)`.
    ///
    /// The pair is sorted before hashing, so
    /// `derive(a, b, fee) == derive(b, a, fee)`.
    #[must_use]
    pub fn derive(token_a: TokenId, token_b: TokenId, fee_bps: u32) -> Self {
        let (token0, token1) = sort_tokens(token_a, token_b);
        let mut hasher = Sha256::new();
        hasher.update(POOL_KEY_TAG);
        hasher.update(token0.as_bytes());
        hasher.update(token1.as_bytes());
        hasher.update(fee_bps.to_be_bytes());
        Self(hasher.finalize().into())
    }

    /// Wraps raw key bytes, e.g. an element of an encoded swap path.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Orders two tokens so that the first is the lower identifier.
#[must_use]
pub fn sort_tokens(token_a: TokenId, token_b: TokenId) -> (TokenId, TokenId) {
    if token_a <= token_b {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolId({self})")
    }
}

impl FromStr for PoolId {
    type Err = IdentityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_hex32(s).map(Self)
    }
}

impl Serialize for PoolId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PoolId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
