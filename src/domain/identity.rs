//! Fixed-width identities for tokens and accounts.
//!
//! Both [`TokenId`] and [`AccountId`] wrap a 32-byte value and render as
//! `0x`-prefixed lowercase hex. Ordering is lexicographic on the raw bytes,
//! which is the ordering used to canonicalize token pairs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when a hex identity string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityParseError {
    /// The string does not hold exactly 64 hex digits.
    #[error("expected 64 hex digits, got {0}")]
    InvalidLength(usize),

    /// The string holds a non-hex character.
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

/// Decodes an optionally `0x`-prefixed 64-digit hex string.
pub(crate) fn decode_hex32(s: &str) -> Result<[u8; 32], IdentityParseError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.len() != 64 {
        return Err(IdentityParseError::InvalidLength(digits.len()));
    }
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(digits, &mut bytes)
        .map_err(|e| IdentityParseError::InvalidHex(e.to_string()))?;
    Ok(bytes)
}

macro_rules! identity_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name([u8; 32]);

        impl $name {
            /// The all-zero identity.
            pub const ZERO: Self = Self([0u8; 32]);

            /// Creates the identity from raw bytes.
            #[must_use]
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Returns the raw bytes.
            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Returns `true` for the all-zero identity.
            #[must_use]
            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; 32]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({self})", stringify!($name))
            }
        }

        impl FromStr for $name {
            type Err = IdentityParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_hex32(s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

identity_type!(
    /// Identifier of a fungible token held by the ledger.
    TokenId
);

identity_type!(
    /// Identity of an account: a liquidity provider, trader, or recipient.
    ///
    /// [`AccountId::ZERO`] is the null identity. It can never act as a
    /// caller or receive swap output, and it owns the locked minimum
    /// liquidity of every pool.
    AccountId
);
