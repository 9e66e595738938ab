//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::DexConfig;
use crate::domain::{EventBus, PoolRegistry};
use crate::error::DexError;
use crate::ledger::{InMemoryLedger, Ledger};
use crate::persistence::PostgresPersistence;
use crate::service::DexService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Exchange facade for all business logic.
    pub dex: Arc<DexService>,
    /// Reference ledger; also reachable through `dex` as a `dyn Ledger`.
    pub ledger: Arc<InMemoryLedger>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Event log, when persistence is enabled.
    pub persistence: Option<PostgresPersistence>,
}

impl AppState {
    /// Wires registry, ledger, event bus and service from the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InvalidFee`] if the configured default fee is
    /// out of range.
    pub fn from_config(
        config: &DexConfig,
        persistence: Option<PostgresPersistence>,
    ) -> Result<Self, DexError> {
        let registry = Arc::new(PoolRegistry::new());
        let event_bus = EventBus::new(config.event_bus_capacity);
        let ledger = Arc::new(InMemoryLedger::new(config.ledger_custody));
        let shared = Arc::clone(&ledger) as Arc<dyn Ledger>;
        let dex = Arc::new(DexService::new(
            registry,
            shared,
            event_bus.clone(),
            config.default_fee_bps,
        )?);
        Ok(Self {
            dex,
            ledger,
            event_bus,
            persistence,
        })
    }
}
