//! # Domain Types
//!
//! Core domain types for order verification.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  INPUT (one immutable snapshot per run)                                │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐            │
//! │  │     Order     │──►│   OrderLine   │──►│   RateLine    │            │
//! │  │  order_id     │   │  qty          │   │  tax_id       │            │
//! │  │  lines        │   │  unit_price   │   │  rate         │            │
//! │  │  order_disc   │   │  item_disc    │   └───────────────┘            │
//! │  │  views        │   │  stored taxes │                                 │
//! │  └───────────────┘   └───────────────┘                                 │
//! │                                                                         │
//! │  OUTPUT (created fresh, never mutated)                                 │
//! │  ┌───────────────┐   ┌───────────────┐                                 │
//! │  │ Verification  │──►│LineComputation│  discounted_gross, exclusive,  │
//! │  │    Result     │   └───────────────┘  per-rate tax, net             │
//! │  │  pattern      │                                                     │
//! │  │  reports      │                                                     │
//! │  └───────────────┘                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All amounts are tax-inclusive decimals unless a field name says
//! otherwise. Nothing here is mutated after construction: every
//! verification run consumes one snapshot and produces one result object.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Tax Rates
// =============================================================================

/// One applicable tax on a line: an opaque tax identifier and its rate as a
/// decimal fraction (`0.10` = 10%).
///
/// Rates on a line are additive, never compounding: a line taxed at 0.10
/// and 0.04 carries an aggregated rate `R = 0.14`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLine {
    /// Opaque tax identifier, matched against stored per-tax amounts.
    pub tax_id: String,

    /// Rate as a decimal fraction (0.10 = 10%). Non-negative.
    pub rate: Decimal,
}

// =============================================================================
// Order Lines
// =============================================================================

/// A single line of the audited order, in its catalog/menu orientation.
///
/// Carries both the computation inputs (price, discount, rates) and the
/// stored values being audited (per-tax amounts, net).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    /// Stable line identifier, shared with the settlement view.
    pub line_id: String,

    /// Display name shown in reports.
    pub name: String,

    /// Quantity sold. Positive integer.
    pub qty: i64,

    /// Tax-inclusive unit price.
    pub unit_price: Decimal,

    /// Item-level discount already granted on this line (currency amount,
    /// not a percentage). Non-negative, never larger than the line gross.
    #[serde(default)]
    pub item_discount: Decimal,

    /// Applicable tax rates, in the order the pipeline lists them.
    #[serde(default)]
    pub rates: Vec<RateLine>,

    /// Stored tax amount per tax id - the values under audit.
    #[serde(default)]
    pub stored_taxes: BTreeMap<String, Decimal>,

    /// Stored net amount, when the pipeline recorded one.
    #[serde(default)]
    pub stored_net: Option<Decimal>,
}

impl OrderLine {
    /// Tax-inclusive pre-discount line amount: `unit_price * qty`.
    pub fn gross(&self) -> Decimal {
        self.unit_price * Decimal::from(self.qty)
    }

    /// Aggregated tax rate `R` for this line (sum of all applicable rates).
    pub fn rate_sum(&self) -> Decimal {
        self.rates.iter().map(|r| r.rate).sum()
    }

    /// Sum of all stored per-tax amounts on this line.
    pub fn stored_tax_total(&self) -> Decimal {
        self.stored_taxes.values().copied().sum()
    }
}

// =============================================================================
// Item Views (consistency cross-check)
// =============================================================================

/// One item as described by a single source collection.
///
/// The audited pipeline records every order twice: once oriented toward
/// the catalog/menu structure and once toward settlement/taxation. Both
/// are flattened to this shape and compared field by field; `line_id` is
/// the shared stable identifier used for matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemView {
    /// Stable identifier shared across both collections.
    pub line_id: String,

    /// Display name (not compared; identification only).
    pub name: String,

    pub qty: i64,
    pub unit_price: Decimal,
    pub gross: Decimal,
    pub tax_exclusive_unit_price: Decimal,
    pub discount_amount: Decimal,
    pub tax_exclusive_discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub net_amount: Decimal,
    pub total_price: Decimal,
}

// =============================================================================
// Order
// =============================================================================

/// A fully resolved order snapshot - the engine's sole input.
///
/// ## Lifecycle
/// Fetched once by the snapshot repository, then treated as immutable.
/// The engine never writes back; mismatches are findings in the result
/// object, not corrections to the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Pipeline-internal order identifier, used in every error message.
    pub order_id: String,

    /// Ordered line items (menu orientation).
    pub lines: Vec<OrderLine>,

    /// Declared order-level discount from the order header (`D_order`).
    #[serde(default)]
    pub order_discount: Decimal,

    /// Portion of `order_discount` the upstream system has already folded
    /// into item-level discounts. An explicit input: when the export does
    /// not supply it, combined-pattern allocation treats the full order
    /// discount as residual.
    #[serde(default)]
    pub already_attributed: Option<Decimal>,

    /// Menu-oriented item view for the structural cross-check.
    #[serde(default)]
    pub menu_view: Option<Vec<ItemView>>,

    /// Settlement-oriented item view for the structural cross-check.
    #[serde(default)]
    pub settlement_view: Option<Vec<ItemView>>,
}

impl Order {
    /// Sum of all item-level discounts across lines.
    pub fn item_discount_total(&self) -> Decimal {
        self.lines.iter().map(|l| l.item_discount).sum()
    }

    /// Sum of all line grosses (the Pattern 2 allocation base).
    pub fn gross_total(&self) -> Decimal {
        self.lines.iter().map(|l| l.gross()).sum()
    }
}

// =============================================================================
// Line Computation
// =============================================================================

/// Per-line output of allocation + back-out.
///
/// Produced once per line per verification run; by construction
/// `taxes + net = discounted_gross` holds exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineComputation {
    pub line_id: String,
    pub name: String,

    /// Line gross after all applicable discount allocation.
    pub discounted_gross: Decimal,

    /// Discounted gross with tax backed out: `discounted_gross / (1 + R)`.
    pub exclusive: Decimal,

    /// Recomputed tax per tax id, in rate order.
    pub taxes: Vec<(String, Decimal)>,

    /// `discounted_gross` minus all recomputed taxes.
    pub net: Decimal,

    /// Order-level discount share allocated to this line (0 outside
    /// proportional patterns).
    pub allocated_discount: Decimal,

    /// True when allocation would have driven this line negative and the
    /// discounted gross was clamped to zero. A data-error signal, not a
    /// correction.
    pub clamped: bool,
}

impl LineComputation {
    /// Sum of all recomputed per-rate taxes on this line.
    pub fn tax_total(&self) -> Decimal {
        self.taxes.iter().map(|(_, t)| *t).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
