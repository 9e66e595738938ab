//! # hydra-dex
//!
//! Constant-product decentralized exchange engine with a REST API and a
//! WebSocket event stream.
//!
//! Pools hold two token reserves, price swaps on `x * y = k` with a
//! per-pool fee, and issue proportional LP shares. Token balances live in
//! an external [`ledger::Ledger`]; every public operation settles its
//! token movements as one batch and is rolled back if settlement fails.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── DexService (service/)
//!     │     ├── LiquidityManager
//!     │     ├── SwapRouter ── SwapEngine
//!     │
//!     ├── PoolRegistry + EventBus (domain/)
//!     ├── Pool math (math/)
//!     ├── Ledger (ledger/)
//!     │
//!     └── PostgreSQL Persistence
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod math;
pub mod persistence;
pub mod service;
pub mod ws;
