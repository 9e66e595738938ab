//! Persistence layer: PostgreSQL event log and pool snapshots.
//!
//! The engine itself is purely in-memory. When persistence is enabled,
//! three background tasks mirror it to PostgreSQL: an event recorder fed
//! by the [`EventBus`], a periodic snapshotter and a snapshot cleanup job.

pub mod models;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

pub use models::{PoolSnapshot, StoredEvent};
pub use postgres::PostgresPersistence;

use crate::domain::EventBus;
use crate::service::DexService;

/// Appends every published event to the event log.
///
/// Lagged receivers log the number of dropped events and keep going; the
/// task ends when the bus is closed.
pub fn spawn_event_recorder(
    persistence: PostgresPersistence,
    event_bus: &EventBus,
) -> JoinHandle<()> {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Err(e) = persistence.save_event(&event).await {
                        tracing::error!(
                            pool_id = %event.pool_id(),
                            event_type = event.event_type_str(),
                            error = %e,
                            "failed to persist event"
                        );
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "event recorder lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::info!("event recorder stopped");
    })
}

/// Writes a snapshot of every pool each `interval_secs` seconds.
pub fn spawn_snapshotter(
    persistence: PostgresPersistence,
    dex: Arc<DexService>,
    interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let summaries = dex.snapshot_pools().await;
            let mut saved = 0usize;
            for summary in &summaries {
                match persistence.save_snapshot(summary).await {
                    Ok(_) => saved += 1,
                    Err(e) => {
                        tracing::error!(
                            pool_id = %summary.view.pool_id,
                            error = %e,
                            "snapshot failed"
                        );
                    }
                }
            }
            tracing::debug!(saved, total = summaries.len(), "pool snapshots written");
        }
    })
}

/// Deletes snapshots older than `after_days` once an hour.
///
/// Returns `None` when `after_days` is zero (keep forever).
pub fn spawn_snapshot_cleanup(
    persistence: PostgresPersistence,
    after_days: u64,
) -> Option<JoinHandle<()>> {
    if after_days == 0 {
        return None;
    }
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(3600));
        loop {
            ticker.tick().await;
            match persistence.delete_old_snapshots(after_days).await {
                Ok(0) => {}
                Ok(deleted) => tracing::info!(deleted, after_days, "old snapshots removed"),
                Err(e) => tracing::error!(error = %e, "snapshot cleanup failed"),
            }
        }
    }))
}
