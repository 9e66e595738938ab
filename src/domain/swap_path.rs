//! Typed multi-hop path.
//!
//! A path alternates tokens and pool keys, `[token, pool, token, ..., token]`.
//! [`SwapPath::new`] is the only way to build one and checks the shape;
//! whether each pool really connects its neighbours is checked against the
//! registry by the router.

use std::collections::BTreeSet;

use super::{PoolId, TokenId};
use crate::error::DexError;

/// One element of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathElement {
    /// A token position (even index).
    Token(TokenId),
    /// A pool position (odd index).
    Pool(PoolId),
}

/// One swap step of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    /// Token sold into `pool_id`.
    pub token_in: TokenId,
    /// Pool traded against.
    pub pool_id: PoolId,
    /// Token bought from `pool_id`.
    pub token_out: TokenId,
}

/// Shape-checked, immutable token/pool sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPath {
    hops: Vec<Hop>,
}

fn expect_token(element: PathElement) -> Result<TokenId, DexError> {
    match element {
        PathElement::Token(token) => Ok(token),
        PathElement::Pool(_) => Err(DexError::InvalidPath("expected a token")),
    }
}

fn expect_pool(element: PathElement) -> Result<PoolId, DexError> {
    match element {
        PathElement::Pool(pool_id) => Ok(pool_id),
        PathElement::Token(_) => Err(DexError::InvalidPath("expected a pool key")),
    }
}

impl SwapPath {
    /// Validates the shape of `elements` and builds the path.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InvalidPath`] if the length is even or below 3,
    /// or if tokens and pools do not alternate starting with a token.
    pub fn new(elements: &[PathElement]) -> Result<Self, DexError> {
        if elements.len() < 3 {
            return Err(DexError::InvalidPath("path needs at least 3 elements"));
        }
        if elements.len() % 2 == 0 {
            return Err(DexError::InvalidPath("path length must be odd"));
        }

        let Some((first, rest)) = elements.split_first() else {
            return Err(DexError::InvalidPath("path needs at least 3 elements"));
        };
        let mut token_in = expect_token(*first)?;
        let mut hops = Vec::with_capacity(rest.len() / 2);
        for pair in rest.chunks_exact(2) {
            let &[pool, token] = pair else {
                continue;
            };
            let pool_id = expect_pool(pool)?;
            let token_out = expect_token(token)?;
            hops.push(Hop {
                token_in,
                pool_id,
                token_out,
            });
            token_in = token_out;
        }
        Ok(Self { hops })
    }

    /// Builds a path from untyped 32-byte words, typed by position: even
    /// indices are tokens, odd indices are pool keys.
    ///
    /// # Errors
    ///
    /// Same as [`SwapPath::new`].
    pub fn from_words(words: &[[u8; 32]]) -> Result<Self, DexError> {
        let elements: Vec<PathElement> = words
            .iter()
            .enumerate()
            .map(|(i, word)| {
                if i % 2 == 0 {
                    PathElement::Token(TokenId::from_bytes(*word))
                } else {
                    PathElement::Pool(PoolId::from_bytes(*word))
                }
            })
            .collect();
        Self::new(&elements)
    }

    /// Hops in execution order.
    #[must_use]
    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    /// Token sold by the caller.
    #[must_use]
    pub fn token_in(&self) -> TokenId {
        self.hops.first().map_or(TokenId::ZERO, |hop| hop.token_in)
    }

    /// Token delivered to the recipient.
    #[must_use]
    pub fn token_out(&self) -> TokenId {
        self.hops.last().map_or(TokenId::ZERO, |hop| hop.token_out)
    }

    /// Distinct pools on the path, in key order.
    #[must_use]
    pub fn distinct_pools(&self) -> Vec<PoolId> {
        self.hops
            .iter()
            .map(|hop| hop.pool_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Flattens the path back to `[token, pool, token, ...]`.
    #[must_use]
    pub fn elements(&self) -> Vec<PathElement> {
        let mut out = Vec::with_capacity(self.hops.len() * 2 + 1);
        out.push(PathElement::Token(self.token_in()));
        for hop in &self.hops {
            out.push(PathElement::Pool(hop.pool_id));
            out.push(PathElement::Token(hop.token_out));
        }
        out
    }
}
