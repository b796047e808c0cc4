//! # Validation Module
//!
//! Structural validation of an order snapshot before the engine runs.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Two Kinds of Wrong                                 │
//! │                                                                         │
//! │  STRUCTURALLY INVALID (this module, fatal)                             │
//! │  ├── empty order, negative quantity/amount                             │
//! │  ├── item discount larger than its line                                │
//! │  ├── negative tax rate                                                 │
//! │  └── stored tax with no rate configuration                             │
//! │      → abort with a precise, order-identifying error                   │
//! │                                                                         │
//! │  NUMERICALLY MISMATCHED (reconcile module, never fatal)                │
//! │  └── stored vs recomputed variance beyond tolerance                    │
//! │      → reported as a finding, the run always completes                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;

use crate::error::{VerifyError, VerifyResult};
use crate::types::Order;

/// Validates an order snapshot for structural soundness.
///
/// Checks every line before returning so the first broken field found is
/// deterministic (document order), and no arithmetic runs on garbage.
///
/// ## Rules
/// - At least one line
/// - `qty > 0` on every line
/// - `unit_price`, `item_discount`, `order_discount` all non-negative
/// - `item_discount <= gross` per line (violation flagged, never clamped)
/// - Every rate non-negative
/// - A line with stored tax must have at least one rate configured
pub fn validate_order(order: &Order) -> VerifyResult<()> {
    if order.lines.is_empty() {
        return Err(VerifyError::EmptyOrder {
            order_id: order.order_id.clone(),
        });
    }

    if order.order_discount < Decimal::ZERO {
        return Err(VerifyError::NegativeAmount {
            order_id: order.order_id.clone(),
            field: "order_discount".to_string(),
            value: order.order_discount,
        });
    }

    if let Some(attributed) = order.already_attributed {
        if attributed < Decimal::ZERO {
            return Err(VerifyError::NegativeAmount {
                order_id: order.order_id.clone(),
                field: "already_attributed".to_string(),
                value: attributed,
            });
        }
    }

    for line in &order.lines {
        if line.qty <= 0 {
            return Err(VerifyError::InvalidQuantity {
                order_id: order.order_id.clone(),
                line_id: line.line_id.clone(),
                qty: line.qty,
            });
        }

        if line.unit_price < Decimal::ZERO {
            return Err(VerifyError::NegativeAmount {
                order_id: order.order_id.clone(),
                field: format!("unit_price on line {}", line.line_id),
                value: line.unit_price,
            });
        }

        if line.item_discount < Decimal::ZERO {
            return Err(VerifyError::NegativeAmount {
                order_id: order.order_id.clone(),
                field: format!("item_discount on line {}", line.line_id),
                value: line.item_discount,
            });
        }

        let gross = line.gross();
        if line.item_discount > gross {
            return Err(VerifyError::DiscountExceedsGross {
                order_id: order.order_id.clone(),
                line_id: line.line_id.clone(),
                discount: line.item_discount,
                gross,
            });
        }

        for rate in &line.rates {
            if rate.rate < Decimal::ZERO {
                return Err(VerifyError::InvalidRate {
                    order_id: order.order_id.clone(),
                    line_id: line.line_id.clone(),
                    rate: rate.rate,
                });
            }
        }

        // Tax recorded but no rates: the menu item was never assigned a
        // tax category upstream. Recomputing would silently compare
        // against zero, so refuse instead.
        let stored = line.stored_tax_total();
        if line.rates.is_empty() && stored != Decimal::ZERO {
            return Err(VerifyError::MissingTaxConfig {
                order_id: order.order_id.clone(),
                line_id: line.line_id.clone(),
                stored,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
