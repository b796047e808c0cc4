//! # Money Module
//!
//! Shared decimal helpers for monetary comparison and display rounding.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  The pipeline stores tax amounts to 5 decimal places (1.63182).        │
//! │  An auditor that drifts in its own arithmetic cannot tell a real       │
//! │  variance from its own rounding noise.                                 │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal everywhere                                 │
//! │    Internal arithmetic at full precision, rounding only at display.    │
//! │    Equality is always tolerance-based, defined in exactly one place:   │
//! │    within_tolerance() below.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::prelude::*;

// =============================================================================
// Constants
// =============================================================================

/// Default absolute tolerance for monetary comparisons: 0.00001.
///
/// A stored and a recomputed amount are considered equal when they differ
/// by no more than this. Matches the 5-decimal storage precision of the
/// audited pipeline.
pub const DEFAULT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 5);

/// Default display precision (decimal places) for rendered figures.
pub const DEFAULT_PRECISION: u32 = 5;

/// Minimum configurable display precision.
pub const MIN_PRECISION: u32 = 2;

/// Maximum configurable display precision.
pub const MAX_PRECISION: u32 = 8;

// =============================================================================
// Tolerance Comparison
// =============================================================================

/// Checks whether two monetary values are equal within `tolerance`.
///
/// This is the single comparison primitive used by both the reconciliation
/// validator and the consistency cross-validator, so tolerance policy is
/// defined once and applied uniformly.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use veritax_core::money::{within_tolerance, DEFAULT_TOLERANCE};
///
/// let stored = Decimal::new(163182, 5);     // 1.63182
/// let computed = Decimal::new(163182, 5);   // 1.63182
/// assert!(within_tolerance(stored, computed, DEFAULT_TOLERANCE));
///
/// let off = Decimal::new(163282, 5);        // 1.63282, off by 0.001
/// assert!(!within_tolerance(stored, off, DEFAULT_TOLERANCE));
/// ```
#[inline]
pub fn within_tolerance(expected: Decimal, computed: Decimal, tolerance: Decimal) -> bool {
    (expected - computed).abs() <= tolerance
}

// =============================================================================
// Display Rounding
// =============================================================================

/// Rounds a value to the given display precision (half away from zero).
///
/// Internal engine arithmetic never rounds; this is applied only when a
/// figure leaves the engine - in rendered reports and serialized results.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use veritax_core::money::round_display;
///
/// let exclusive = Decimal::new(1663636363, 8); // 16.63636363
/// assert_eq!(round_display(exclusive, 5).to_string(), "16.63636");
/// assert_eq!(round_display(exclusive, 2).to_string(), "16.64");
/// ```
#[inline]
pub fn round_display(value: Decimal, precision: u32) -> Decimal {
    value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamps a requested precision into the supported 2..=8 range.
#[inline]
pub fn clamp_precision(precision: u32) -> u32 {
    precision.clamp(MIN_PRECISION, MAX_PRECISION)
}

// =============================================================================
// Unit Tests
// =============================================================================
