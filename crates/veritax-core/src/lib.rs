//! # veritax-core: Pure Verification Logic for Veritax
//!
//! This crate is the **heart** of Veritax. It contains the whole tax audit
//! engine as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Veritax Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    veritax CLI (apps/cli)                       │   │
//! │  │    verify-order ──► render report ──► exit code                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ veritax-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌────────────┐    │   │
//! │  │   │  pattern  │ │ allocation│ │  backout  │ │ reconcile  │    │   │
//! │  │   │ classify  │ │ per-line  │ │ inclusive │ │ stored vs  │    │   │
//! │  │   │ 4 kinds   │ │ discount  │ │ tax split │ │ recomputed │    │   │
//! │  │   └───────────┘ └───────────┘ └───────────┘ └────────────┘    │   │
//! │  │   ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌────────────┐    │   │
//! │  │   │   types   │ │   money   │ │consistency│ │   verify   │    │   │
//! │  │   │  Order    │ │ tolerance │ │ menu vs   │ │orchestrator│    │   │
//! │  │   │  lines    │ │ rounding  │ │settlement │ │  pipeline  │    │   │
//! │  │   └───────────┘ └───────────┘ └───────────┘ └────────────┘    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  veritax-db (Database Layer)                    │   │
//! │  │         SQLite snapshots, partner configs, migrations           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Order, OrderLine, ItemView, LineComputation)
//! - [`money`] - Tolerance comparison and display rounding on `rust_decimal`
//! - [`error`] - Typed verification errors
//! - [`validation`] - Structural order validation
//! - [`pattern`] - Discount pattern classification
//! - [`allocation`] - Per-pattern discount allocation
//! - [`backout`] - Tax back-out under tax-inclusive pricing
//! - [`reconcile`] - Stored-vs-recomputed variance reporting
//! - [`consistency`] - Menu-vs-settlement structural cross-check
//! - [`verify`] - The orchestrator tying the pipeline together
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every run is deterministic - same snapshot, same result
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Decimal Money**: All amounts are `rust_decimal` values, never floats
//! 4. **Findings over Failures**: Numeric mismatches are reported, never thrown;
//!    only structurally unusable data aborts a run
//!
//! ## Example Usage
//!
//! ```rust
//! use rust_decimal::Decimal;
//! use std::collections::BTreeMap;
//! use veritax_core::types::{Order, OrderLine, RateLine};
//! use veritax_core::verify::{verify_order, VerifyOptions};
//!
//! let order = Order {
//!     order_id: "ord-1".to_string(),
//!     lines: vec![OrderLine {
//!         line_id: "l1".to_string(),
//!         name: "Burger".to_string(),
//!         qty: 1,
//!         unit_price: Decimal::new(1830000, 5), // 18.30000, tax-inclusive
//!         item_discount: Decimal::new(35000, 5), // 0.35000
//!         rates: vec![RateLine { tax_id: "vat".to_string(), rate: Decimal::new(10, 2) }],
//!         stored_taxes: BTreeMap::from([("vat".to_string(), Decimal::new(163182, 5))]),
//!         stored_net: None,
//!     }],
//!     order_discount: Decimal::ZERO,
//!     already_attributed: None,
//!     menu_view: None,
//!     settlement_view: None,
//! };
//!
//! let result = verify_order(&order, &VerifyOptions::default()).unwrap();
//!
//! // 17.95 / 1.1 backs out to tax 1.63182, matching the stored amount
//! assert!(result.passed());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod backout;
pub mod consistency;
pub mod error;
pub mod money;
pub mod pattern;
pub mod reconcile;
pub mod types;
pub mod validation;
pub mod verify;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use veritax_core::Order` instead of
// `use veritax_core::types::Order`

pub use error::{VerifyError, VerifyResult};
pub use money::{within_tolerance, DEFAULT_PRECISION, DEFAULT_TOLERANCE};
pub use pattern::DiscountPattern;
pub use reconcile::ReportStatus;
pub use types::*;
pub use verify::{verify_order, VerificationResult, VerifyOptions};
