//! Domain layer: identities, pool state, registry, paths and events.
//!
//! This module contains the engine's domain model: 32-byte token, account
//! and pool identities, the constant-product [`Pool`] state machine, pool
//! entries with LP positions and metadata, typed multi-hop paths, the event
//! bus for broadcasting state changes, and the registry for concurrent pool
//! storage.

pub mod event_bus;
pub mod identity;
pub mod pool;
pub mod pool_entry;
pub mod pool_event;
pub mod pool_id;
pub mod pool_registry;
pub mod swap_path;

pub use event_bus::EventBus;
pub use identity::{AccountId, IdentityParseError, TokenId};
pub use pool::{Deposit, Opening, Pool, SwapOutcome};
pub use pool_entry::{EntryCheckpoint, PoolEntry, PoolSummary, PoolView};
pub use pool_event::{LiquidityChangeType, PoolEvent};
pub use pool_id::PoolId;
pub use pool_registry::{InFlightGuard, PoolRegistry};
pub use swap_path::{Hop, PathElement, SwapPath};
