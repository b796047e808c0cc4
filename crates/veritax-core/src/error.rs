//! # Error Types
//!
//! Verification error types for veritax-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  veritax-core errors (this file)                                       │
//! │  └── VerifyError      - Fatal input/allocation failures                │
//! │                                                                         │
//! │  veritax-db errors (separate crate)                                    │
//! │  └── DbError          - Snapshot store failures                        │
//! │                                                                         │
//! │  CLI boundary                                                          │
//! │  └── anyhow::Error    - What the operator sees                         │
//! │                                                                         │
//! │  Flow: VerifyError → anyhow (CLI) → exit code 1                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include the order/line identifiers in every message
//! 3. Errors are enum variants, never String
//! 4. Tax/net variances are NOT errors - they are findings carried in the
//!    result object. Only structurally invalid input aborts a run.

use rust_decimal::Decimal;
use thiserror::Error;

// =============================================================================
// Verify Error
// =============================================================================

/// Fatal verification errors.
///
/// Raising one of these aborts the run with no partial result: the order is
/// structurally unusable and any numbers computed from it would be noise.
/// Mismatched tax amounts are deliberately absent here - they are findings,
/// reported through [`crate::reconcile::VarianceReport`].
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Order has no lines at all.
    #[error("Order {order_id} has no lines to verify")]
    EmptyOrder { order_id: String },

    /// A line carries a non-positive quantity.
    #[error("Order {order_id}, line {line_id}: quantity {qty} must be positive")]
    InvalidQuantity {
        order_id: String,
        line_id: String,
        qty: i64,
    },

    /// A unit price, item discount, or order discount is negative.
    ///
    /// ## When This Occurs
    /// - Corrupted export from the pipeline
    /// - A refund document fed to the auditor by mistake
    #[error("Order {order_id}: {field} is negative ({value})")]
    NegativeAmount {
        order_id: String,
        field: String,
        value: Decimal,
    },

    /// An item discount exceeds the line gross it applies to.
    ///
    /// The engine refuses to clamp this silently: a discount larger than
    /// the line itself signals a data error upstream.
    #[error(
        "Order {order_id}, line {line_id}: item discount {discount} exceeds line gross {gross}"
    )]
    DiscountExceedsGross {
        order_id: String,
        line_id: String,
        discount: Decimal,
        gross: Decimal,
    },

    /// A line has tax recorded against it but no rate configuration.
    ///
    /// ## When This Occurs
    /// - Tax categories were never assigned to the menu item upstream
    /// - The rate set was stripped during export
    #[error(
        "Order {order_id}, line {line_id}: stored tax {stored} but no tax rates configured - \
         tax assignment is missing upstream"
    )]
    MissingTaxConfig {
        order_id: String,
        line_id: String,
        stored: Decimal,
    },

    /// A tax rate is negative, or rates sum such that `1 + R <= 0` and the
    /// back-out division degenerates.
    #[error("Order {order_id}, line {line_id}: invalid tax rate set (rate {rate})")]
    InvalidRate {
        order_id: String,
        line_id: String,
        rate: Decimal,
    },

    /// The classifier saw negative aggregate discount totals.
    ///
    /// Classification is total over non-negative inputs; negative totals
    /// mean the inputs are malformed, not that a fifth pattern exists.
    #[error(
        "Order {order_id}: discount totals are negative (item total {item_total}, \
         order discount {order_discount}) - cannot classify"
    )]
    AmbiguousDiscountState {
        order_id: String,
        item_total: Decimal,
        order_discount: Decimal,
    },

    /// A proportional split was required but the allocation base is zero.
    ///
    /// ## When This Occurs
    /// - Order-level discount on an order whose lines are all free
    /// - Item discounts consumed every line entirely before the residual
    ///   stage of a combined allocation
    #[error("Order {order_id}: cannot distribute discount {discount} over a zero {base} base")]
    AllocationBaseZero {
        order_id: String,
        discount: Decimal,
        base: String,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with VerifyError.
pub type VerifyResult<T> = Result<T, VerifyError>;

// =============================================================================
// Unit Tests
// =============================================================================
