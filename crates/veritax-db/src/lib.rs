//! # veritax-db: Database Layer for Veritax
//!
//! This crate provides storage for the Veritax audit tool. It uses SQLite
//! for local document storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Veritax Data Flow                                │
//! │                                                                         │
//! │  CLI command (verify-order)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    veritax-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌─────────────────┐   ┌──────────────┐ │   │
//! │  │   │   Database    │    │  Repositories   │   │  Migrations  │ │   │
//! │  │   │   (pool.rs)   │    │ (snapshot.rs,   │   │  (embedded)  │ │   │
//! │  │   │               │    │  partner_       │   │              │ │   │
//! │  │   │ SqlitePool    │◄───│  config.rs)     │   │ 001_init.sql │ │   │
//! │  │   │ WAL, rwc      │    │                 │   │              │ │   │
//! │  │   └───────────────┘    └─────────────────┘   └──────────────┘ │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (snapshots + partner configs as JSON documents)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Snapshot and partner-config repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use veritax_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./veritax.db")).await?;
//! let order = db.snapshots().get("ord-42").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::partner_config::{PartnerConfig, PartnerConfigRepository, PartnerKey};
pub use repository::snapshot::SnapshotRepository;
