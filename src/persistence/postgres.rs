//! PostgreSQL implementation of the persistence layer.
//!
//! Identifiers are stored as `0x`-prefixed hex `TEXT` and parsed back on
//! load.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::{PoolSnapshot, StoredEvent, snapshot_state};
use crate::config::DexConfig;
use crate::domain::{PoolEvent, PoolId, PoolSummary};
use crate::error::DexError;

/// Upper bound on the retention window; larger values overflow `chrono`.
const MAX_RETENTION_DAYS: i64 = 100_000;

type EventRow = (i64, String, String, serde_json::Value, DateTime<Utc>);
type SnapshotRow = (i64, String, String, String, i32, serde_json::Value, DateTime<Utc>);

fn db_error(e: impl std::fmt::Display) -> DexError {
    DexError::PersistenceError(e.to_string())
}

fn parse_id<T: std::str::FromStr>(raw: &str) -> Result<T, DexError>
where
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| DexError::PersistenceError(format!("corrupt identifier {raw}: {e}")))
}

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool from the configuration and runs the
    /// embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`DexError::PersistenceError`] if the database is
    /// unreachable or a migration fails.
    pub async fn connect(config: &DexConfig) -> Result<Self, DexError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.database_connect_timeout_secs,
            ))
            .connect(&config.database_url)
            .await
            .map_err(db_error)?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(db_error)?;
        tracing::info!("database migrations applied");
        Ok(Self::new(pool))
    }

    /// Appends an event to the event log.
    ///
    /// # Errors
    ///
    /// Returns a [`DexError::PersistenceError`] on database failure.
    pub async fn save_event(&self, event: &PoolEvent) -> Result<i64, DexError> {
        let payload = serde_json::to_value(event).map_err(db_error)?;
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO events (pool_id, event_type, payload, created_at) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(event.pool_id().to_string())
        .bind(event.event_type_str())
        .bind(payload)
        .bind(event.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row)
    }

    /// Saves a pool state snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`DexError::PersistenceError`] on database failure.
    pub async fn save_snapshot(&self, summary: &PoolSummary) -> Result<i64, DexError> {
        let fee_bps = i32::try_from(summary.view.fee_bps).map_err(db_error)?;
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO pool_snapshots (pool_id, token0, token1, fee_bps, state_json) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(summary.view.pool_id.to_string())
        .bind(summary.view.token0.to_string())
        .bind(summary.view.token1.to_string())
        .bind(fee_bps)
        .bind(snapshot_state(summary))
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row)
    }

    /// Loads the latest snapshot for each pool using `DISTINCT ON`.
    ///
    /// # Errors
    ///
    /// Returns a [`DexError::PersistenceError`] on database failure or a
    /// corrupt row.
    pub async fn load_latest_snapshots(&self) -> Result<Vec<PoolSnapshot>, DexError> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            "SELECT DISTINCT ON (pool_id) id, pool_id, token0, token1, fee_bps, state_json, snapshot_at \
             FROM pool_snapshots ORDER BY pool_id, snapshot_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter()
            .map(
                |(id, pool_id, token0, token1, fee_bps, state_json, snapshot_at)| {
                    Ok(PoolSnapshot {
                        id,
                        pool_id: parse_id(&pool_id)?,
                        token0: parse_id(&token0)?,
                        token1: parse_id(&token1)?,
                        fee_bps: u32::try_from(fee_bps).map_err(db_error)?,
                        state_json,
                        snapshot_at,
                    })
                },
            )
            .collect()
    }

    /// Loads events after the given timestamp, optionally filtered by pool.
    ///
    /// # Errors
    ///
    /// Returns a [`DexError::PersistenceError`] on database failure or a
    /// corrupt row.
    pub async fn load_events_after(
        &self,
        after: DateTime<Utc>,
        pool_id: Option<PoolId>,
    ) -> Result<Vec<StoredEvent>, DexError> {
        let rows = if let Some(pid) = pool_id {
            sqlx::query_as::<_, EventRow>(
                "SELECT id, pool_id, event_type, payload, created_at FROM events \
                 WHERE created_at > $1 AND pool_id = $2 ORDER BY id ASC",
            )
            .bind(after)
            .bind(pid.to_string())
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, EventRow>(
                "SELECT id, pool_id, event_type, payload, created_at FROM events \
                 WHERE created_at > $1 ORDER BY id ASC",
            )
            .bind(after)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(db_error)?;

        rows.into_iter()
            .map(|(id, pool_id, event_type, payload, created_at)| {
                Ok(StoredEvent {
                    id,
                    pool_id: parse_id(&pool_id)?,
                    event_type,
                    payload,
                    created_at,
                })
            })
            .collect()
    }

    /// Deletes snapshots older than the given number of days.
    ///
    /// # Errors
    ///
    /// Returns a [`DexError::PersistenceError`] on database failure.
    pub async fn delete_old_snapshots(&self, before_days: u64) -> Result<u64, DexError> {
        let days = i64::try_from(before_days)
            .unwrap_or(MAX_RETENTION_DAYS)
            .min(MAX_RETENTION_DAYS);
        let cutoff = Utc::now() - chrono::Duration::days(days);

        let result = sqlx::query("DELETE FROM pool_snapshots WHERE snapshot_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected())
    }
}
