//! # Partner Configuration Repository
//!
//! Storage and lookup for partner configuration documents, keyed by the
//! four ids every order document carries: partner, application, brand
//! and location.
//!
//! ## Schema Flexibility
//! Aggregators attach arbitrary fields to a location configuration, and
//! the set differs per aggregator. Only the fields every document carries
//! are typed; everything else lands in an open map and is listed
//! generically by the display layer. Aggregator-specific fields are never
//! typed members.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

// =============================================================================
// Document Types
// =============================================================================

/// The key tuple identifying one partner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerKey {
    pub partner_id: String,
    pub application_id: String,
    pub brand_id: String,
    pub location_id: String,
}

/// One partner configuration document.
///
/// Known fields are typed; everything the aggregator adds beyond them is
/// collected verbatim in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerConfig {
    pub partner_id: String,
    pub application_id: String,
    pub brand_id: String,
    pub location_id: String,

    /// Location status (the one guaranteed non-id common field).
    #[serde(default)]
    pub status: Option<String>,

    /// Menu identifier, when the location has a menu configuration.
    #[serde(default)]
    pub menu_id: Option<String>,

    /// All remaining document fields, aggregator-specific and listed
    /// generically.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PartnerConfig {
    /// The key tuple this document is stored under.
    pub fn key(&self) -> PartnerKey {
        PartnerKey {
            partner_id: self.partner_id.clone(),
            application_id: self.application_id.clone(),
            brand_id: self.brand_id.clone(),
            location_id: self.location_id.clone(),
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for partner configuration documents.
#[derive(Debug, Clone)]
pub struct PartnerConfigRepository {
    pool: SqlitePool,
}

impl PartnerConfigRepository {
    /// Creates a new repository with the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        PartnerConfigRepository { pool }
    }

    /// Looks up the configuration for one key tuple.
    ///
    /// Returns `Ok(None)` when no document is stored; a missing partner
    /// config is an expected state, not an error.
    pub async fn find(&self, key: &PartnerKey) -> DbResult<Option<PartnerConfig>> {
        debug!(
            partner_id = %key.partner_id,
            brand_id = %key.brand_id,
            location_id = %key.location_id,
            "Looking up partner configuration"
        );

        let row = sqlx::query(
            "SELECT document FROM partner_configs \
             WHERE partner_id = ? AND application_id = ? AND brand_id = ? AND location_id = ?",
        )
        .bind(&key.partner_id)
        .bind(&key.application_id)
        .bind(&key.brand_id)
        .bind(&key.location_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Ok(None),
            Some(row) => {
                let document: String = row.get("document");
                serde_json::from_str(&document)
                    .map(Some)
                    .map_err(|e| DbError::malformed("partner config", &key.location_id, e))
            }
        }
    }

    /// Stores (or replaces) one partner configuration document.
    pub async fn upsert(&self, config: &PartnerConfig) -> DbResult<()> {
        let document = serde_json::to_string(config)
            .map_err(|e| DbError::SerializationFailed(e.to_string()))?;

        sqlx::query(
            "INSERT INTO partner_configs \
                 (partner_id, application_id, brand_id, location_id, document, updated_at) \
             VALUES (?, ?, ?, ?, ?, datetime('now')) \
             ON CONFLICT (partner_id, application_id, brand_id, location_id) DO UPDATE SET \
                 document = excluded.document, \
                 updated_at = excluded.updated_at",
        )
        .bind(&config.partner_id)
        .bind(&config.application_id)
        .bind(&config.brand_id)
        .bind(&config.location_id)
        .bind(&document)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
