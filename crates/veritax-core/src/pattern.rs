//! # Discount Pattern Classification
//!
//! Every audited order falls into exactly one of four discount
//! combinations, decided entirely by its aggregate discount figures:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Σ item_discount = 0        Σ item_discount > 0            │
//! │            ┌────────────────────────┬────────────────────────┐         │
//! │  D_order=0 │  1 - No Discounts      │  3 - Item-Level Only   │         │
//! │            ├────────────────────────┼────────────────────────┤         │
//! │  D_order>0 │  2 - Order-Level Only  │  4 - Combined          │         │
//! │            └────────────────────────┴────────────────────────┘         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Classification is total over non-negative inputs and the patterns are
//! mutually exclusive; the only failure mode is malformed (negative)
//! totals. Which pattern applies determines how the allocator produces
//! each line's discounted gross.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{VerifyError, VerifyResult};

// =============================================================================
// Discount Pattern
// =============================================================================

/// The four mutually exclusive discount combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountPattern {
    /// Pattern 1: no discounts of any kind.
    NoDiscounts,
    /// Pattern 2: order-level discount only, distributed proportionally.
    OrderLevelOnly,
    /// Pattern 3: item-level discounts only, already applied per line.
    ItemLevelOnly,
    /// Pattern 4: both item-level and order-level discounts.
    Combined,
}

impl DiscountPattern {
    /// Ordinal used in operator-facing output ("Pattern 3").
    pub const fn number(self) -> u8 {
        match self {
            DiscountPattern::NoDiscounts => 1,
            DiscountPattern::OrderLevelOnly => 2,
            DiscountPattern::ItemLevelOnly => 3,
            DiscountPattern::Combined => 4,
        }
    }
}

impl fmt::Display for DiscountPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiscountPattern::NoDiscounts => "No Discounts",
            DiscountPattern::OrderLevelOnly => "Order-Level Discount Only",
            DiscountPattern::ItemLevelOnly => "Item-Level Discounts Only",
            DiscountPattern::Combined => "Combined (Item + Order Level Discounts)",
        };
        write!(f, "Pattern {}: {}", self.number(), label)
    }
}

// =============================================================================
// Pattern Result
// =============================================================================

/// The classification outcome plus the figures it was decided on.
///
/// Immutable once computed; `residual` and `degenerated` are filled in by
/// the allocator for Pattern 4 (zero / false otherwise).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternResult {
    pub pattern: DiscountPattern,

    /// `Σ item_discount` across all lines.
    pub item_discount_total: Decimal,

    /// Declared order-level discount from the header.
    pub order_discount: Decimal,

    /// Order discount left to distribute after item attribution
    /// (Pattern 4 only; zero elsewhere).
    pub residual: Decimal,

    /// True when a Combined order collapsed to Item-Level-Only semantics
    /// because the residual was numerically insignificant.
    pub degenerated: bool,
}

// =============================================================================
// Classifier
// =============================================================================

/// Selects the discount pattern from the order's aggregate figures.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use veritax_core::pattern::{classify, DiscountPattern};
///
/// let none = Decimal::ZERO;
/// let some = Decimal::new(15, 0);
/// assert_eq!(classify("o", none, none).unwrap(), DiscountPattern::NoDiscounts);
/// assert_eq!(classify("o", none, some).unwrap(), DiscountPattern::OrderLevelOnly);
/// assert_eq!(classify("o", some, none).unwrap(), DiscountPattern::ItemLevelOnly);
/// assert_eq!(classify("o", some, some).unwrap(), DiscountPattern::Combined);
/// ```
pub fn classify(
    order_id: &str,
    item_discount_total: Decimal,
    order_discount: Decimal,
) -> VerifyResult<DiscountPattern> {
    if item_discount_total < Decimal::ZERO || order_discount < Decimal::ZERO {
        return Err(VerifyError::AmbiguousDiscountState {
            order_id: order_id.to_string(),
            item_total: item_discount_total,
            order_discount,
        });
    }

    let has_item = item_discount_total > Decimal::ZERO;
    let has_order = order_discount > Decimal::ZERO;

    Ok(match (has_item, has_order) {
        (false, false) => DiscountPattern::NoDiscounts,
        (false, true) => DiscountPattern::OrderLevelOnly,
        (true, false) => DiscountPattern::ItemLevelOnly,
        (true, true) => DiscountPattern::Combined,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
