//! # Order Snapshot Repository
//!
//! Storage for imported order snapshots. The verification engine reads
//! snapshots through this repository and never writes them back; imports
//! replace the whole document.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  export JSON ──► import() ──► order_snapshots.document                 │
//! │                                       │                                 │
//! │  verify-order <id> ──► get() ◄────────┘                                │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                   veritax_core::Order (deserialized, immutable)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDateTime;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use veritax_core::types::Order;

use crate::error::{DbError, DbResult};

/// Repository for imported order snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    pool: SqlitePool,
}

impl SnapshotRepository {
    /// Creates a new repository with the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        SnapshotRepository { pool }
    }

    /// Fetches one order snapshot by its internal id.
    ///
    /// ## Errors
    /// - `NotFound` when no snapshot was imported under this id
    /// - `MalformedDocument` when the stored JSON no longer matches the
    ///   snapshot shape
    pub async fn get(&self, internal_id: &str) -> DbResult<Order> {
        debug!(internal_id, "Fetching order snapshot");

        let row = sqlx::query("SELECT document FROM order_snapshots WHERE internal_id = ?")
            .bind(internal_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Order snapshot", internal_id))?;

        let document: String = row.get("document");
        serde_json::from_str(&document)
            .map_err(|e| DbError::malformed("order snapshot", internal_id, e))
    }

    /// Imports (or replaces) one order snapshot.
    ///
    /// The snapshot is keyed by the order's own `order_id`; re-importing
    /// replaces the previous document and refreshes `fetched_at`.
    pub async fn import(&self, order: &Order) -> DbResult<()> {
        let document = serde_json::to_string(order)
            .map_err(|e| DbError::SerializationFailed(e.to_string()))?;

        sqlx::query(
            "INSERT INTO order_snapshots (internal_id, document, fetched_at) \
             VALUES (?, ?, datetime('now')) \
             ON CONFLICT (internal_id) DO UPDATE SET \
                 document = excluded.document, \
                 fetched_at = excluded.fetched_at",
        )
        .bind(&order.order_id)
        .bind(&document)
        .execute(&self.pool)
        .await?;

        debug!(internal_id = %order.order_id, "Imported order snapshot");
        Ok(())
    }

    /// Imports a raw export document, returning the order id it was
    /// stored under.
    ///
    /// The document is parsed to prove it is a usable snapshot, but stored
    /// verbatim: export-side fields the engine does not model (partner
    /// ids and other envelope data) stay available through [`get_raw`].
    ///
    /// [`get_raw`]: SnapshotRepository::get_raw
    pub async fn import_raw(&self, document: &str) -> DbResult<String> {
        let order: Order = serde_json::from_str(document)
            .map_err(|e| DbError::malformed("order snapshot", "import", e))?;

        sqlx::query(
            "INSERT INTO order_snapshots (internal_id, document, fetched_at) \
             VALUES (?, ?, datetime('now')) \
             ON CONFLICT (internal_id) DO UPDATE SET \
                 document = excluded.document, \
                 fetched_at = excluded.fetched_at",
        )
        .bind(&order.order_id)
        .bind(document)
        .execute(&self.pool)
        .await?;

        debug!(internal_id = %order.order_id, "Imported raw order snapshot");
        Ok(order.order_id)
    }

    /// Fetches the stored document as untyped JSON.
    ///
    /// Used for envelope fields the engine does not model, like the
    /// partner id tuple needed for configuration lookup.
    pub async fn get_raw(&self, internal_id: &str) -> DbResult<serde_json::Value> {
        let row = sqlx::query("SELECT document FROM order_snapshots WHERE internal_id = ?")
            .bind(internal_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Order snapshot", internal_id))?;

        let document: String = row.get("document");
        serde_json::from_str(&document)
            .map_err(|e| DbError::malformed("order snapshot", internal_id, e))
    }

    /// Lists imported snapshots with their import time, newest first.
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<(String, NaiveDateTime)>> {
        let rows = sqlx::query(
            "SELECT internal_id, fetched_at FROM order_snapshots \
             ORDER BY fetched_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.get("internal_id"), r.get("fetched_at")))
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
