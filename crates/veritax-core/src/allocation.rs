//! # Discount Allocation
//!
//! One allocation strategy per discount pattern, all producing the same
//! thing: each line's `discounted_gross`, the tax-inclusive amount the
//! back-out then operates on.
//!
//! ## Strategies
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Pattern 1   identity          discounted_gross = gross                │
//! │                                                                         │
//! │  Pattern 2   proportional      alloc_i = D_order × gross_i / Σ gross   │
//! │                                discounted_gross = gross − alloc        │
//! │                                                                         │
//! │  Pattern 3   direct            discounted_gross = gross − item_disc    │
//! │                                                                         │
//! │  Pattern 4   two-stage         stage 1: post_item = gross − item_disc  │
//! │                                stage 2: proportional over post_item    │
//! │                                         with D_residual                │
//! │              degeneration      D_residual ≤ tolerance → stage 1 only   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conservation
//! Proportional allocation must neither lose nor create money: the
//! allocations sum to the declared discount exactly. Decimal division can
//! leave a residue in the last internal digit; that residue is assigned to
//! the line with the largest gross, where it is relatively smallest.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{VerifyError, VerifyResult};
use crate::pattern::DiscountPattern;
use crate::types::{Order, OrderLine};

// =============================================================================
// Allocation Output
// =============================================================================

/// Per-line allocation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineAllocation {
    /// Line gross after all applicable discounts.
    pub discounted_gross: Decimal,

    /// Order-level discount share assigned to this line (zero outside the
    /// proportional patterns).
    pub allocated_discount: Decimal,

    /// Allocation would have driven this line below zero and it was
    /// clamped. Flags a data error upstream; the run continues so every
    /// other finding still surfaces.
    pub clamped: bool,
}

/// Output of one allocation pass over a whole order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationOutcome {
    /// One entry per order line, in order.
    pub lines: Vec<LineAllocation>,

    /// The residual order discount distributed in stage 2 (Pattern 4
    /// only; zero elsewhere).
    pub residual: Decimal,

    /// True when Pattern 4 collapsed to Pattern 3 semantics because the
    /// residual was at or below tolerance.
    pub degenerated: bool,
}

// =============================================================================
// Allocator
// =============================================================================

/// Produces each line's discounted gross according to the classified
/// pattern.
///
/// ## Errors
/// `AllocationBaseZero` when a proportional split is required but its base
/// sums to zero (all-free lines, or item discounts that consumed every
/// line before the residual stage).
pub fn allocate(
    order: &Order,
    pattern: DiscountPattern,
    tolerance: Decimal,
) -> VerifyResult<AllocationOutcome> {
    match pattern {
        DiscountPattern::NoDiscounts => Ok(identity(&order.lines)),
        DiscountPattern::ItemLevelOnly => Ok(item_level(&order.lines)),
        DiscountPattern::OrderLevelOnly => order_level(order),
        DiscountPattern::Combined => combined(order, tolerance),
    }
}

/// Pattern 1: every line keeps its full gross. No discount, and no
/// rounding noise introduced by allocation.
fn identity(lines: &[OrderLine]) -> AllocationOutcome {
    AllocationOutcome {
        lines: lines
            .iter()
            .map(|line| LineAllocation {
                discounted_gross: line.gross(),
                allocated_discount: Decimal::ZERO,
                clamped: false,
            })
            .collect(),
        residual: Decimal::ZERO,
        degenerated: false,
    }
}

/// Pattern 3: item discounts are subtracted directly, line by line.
/// Validation has already guaranteed `item_discount <= gross`.
fn item_level(lines: &[OrderLine]) -> AllocationOutcome {
    AllocationOutcome {
        lines: lines
            .iter()
            .map(|line| LineAllocation {
                discounted_gross: line.gross() - line.item_discount,
                allocated_discount: Decimal::ZERO,
                clamped: false,
            })
            .collect(),
        residual: Decimal::ZERO,
        degenerated: false,
    }
}

/// Pattern 2: the order discount is spread over the lines in proportion
/// to their gross.
fn order_level(order: &Order) -> VerifyResult<AllocationOutcome> {
    let bases: Vec<Decimal> = order.lines.iter().map(|l| l.gross()).collect();
    let lines = distribute(order, &bases, &bases, order.order_discount, "gross")?;
    Ok(AllocationOutcome {
        lines,
        residual: Decimal::ZERO,
        degenerated: false,
    })
}

/// Pattern 4: item discounts first, then the residual order discount is
/// spread over the post-item amounts.
fn combined(order: &Order, tolerance: Decimal) -> VerifyResult<AllocationOutcome> {
    let post_item: Vec<Decimal> = order
        .lines
        .iter()
        .map(|l| l.gross() - l.item_discount)
        .collect();

    // Residual = order discount not already attributed item-wise. The
    // attribution figure is an explicit input; absent means none.
    let attributed = order.already_attributed.unwrap_or(Decimal::ZERO);
    let residual = (order.order_discount - attributed).max(Decimal::ZERO);

    // Degeneration rule: a residual at or below tolerance would only add
    // proportional noise. Skip stage 2 and keep stage-1 amounts.
    if residual <= tolerance {
        info!(
            order_id = %order.order_id,
            residual = %residual,
            "combined-discount order degenerated to item-level allocation"
        );
        return Ok(AllocationOutcome {
            lines: order
                .lines
                .iter()
                .zip(&post_item)
                .map(|(_, &pg)| LineAllocation {
                    discounted_gross: pg,
                    allocated_discount: Decimal::ZERO,
                    clamped: false,
                })
                .collect(),
            residual,
            degenerated: true,
        });
    }

    let grosses: Vec<Decimal> = order.lines.iter().map(|l| l.gross()).collect();
    let lines = distribute(order, &post_item, &grosses, residual, "post-item")?;
    Ok(AllocationOutcome {
        lines,
        residual,
        degenerated: false,
    })
}

/// Proportional distribution of `discount` over `bases`, starting each
/// line at its base amount.
///
/// `grosses` decides which line absorbs any division residue (the largest
/// gross); `base_label` names the base in the zero-base error.
fn distribute(
    order: &Order,
    bases: &[Decimal],
    grosses: &[Decimal],
    discount: Decimal,
    base_label: &str,
) -> VerifyResult<Vec<LineAllocation>> {
    let base_total: Decimal = bases.iter().copied().sum();
    if base_total <= Decimal::ZERO {
        return Err(VerifyError::AllocationBaseZero {
            order_id: order.order_id.clone(),
            discount,
            base: base_label.to_string(),
        });
    }

    let mut allocations: Vec<Decimal> = bases
        .iter()
        .map(|&base| discount * base / base_total)
        .collect();

    // Conservation: assign any residue from decimal division to the line
    // with the largest gross, where it is relatively smallest.
    let allocated: Decimal = allocations.iter().copied().sum();
    let residue = discount - allocated;
    if residue != Decimal::ZERO {
        let largest = grosses
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.cmp(b))
            .map(|(i, _)| i)
            .unwrap_or(0);
        allocations[largest] += residue;
    }

    let lines = order
        .lines
        .iter()
        .zip(bases.iter().zip(&allocations))
        .map(|(line, (&base, &alloc))| {
            let discounted = base - alloc;
            if discounted < Decimal::ZERO {
                warn!(
                    order_id = %order.order_id,
                    line_id = %line.line_id,
                    discounted_gross = %discounted,
                    "allocation drove line negative; clamping to zero"
                );
                LineAllocation {
                    discounted_gross: Decimal::ZERO,
                    allocated_discount: alloc,
                    clamped: true,
                }
            } else {
                LineAllocation {
                    discounted_gross: discounted,
                    allocated_discount: alloc,
                    clamped: false,
                }
            }
        })
        .collect();

    Ok(lines)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RateLine;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn line(id: &str, qty: i64, unit_price: Decimal, item_discount: Decimal) -> OrderLine {
        OrderLine {
            line_id: id.to_string(),
            name: format!("Item {id}"),
            qty,
            unit_price,
            item_discount,
            rates: vec![RateLine { tax_id: "vat".to_string(), rate: dec!(0.10) }],
            stored_taxes: BTreeMap::new(),
            stored_net: None,
        }
    }

    fn order(lines: Vec<OrderLine>, order_discount: Decimal) -> Order {
        Order {
            order_id: "ord-1".to_string(),
            lines,
            order_discount,
            already_attributed: None,
            menu_view: None,
            settlement_view: None,
        }
    }

    const TOL: Decimal = dec!(0.00001);

    #[test]
    fn test_pattern1_identity_is_exact() {
        let o = order(vec![line("a", 3, dec!(6.10), dec!(0))], dec!(0));
        let out = allocate(&o, DiscountPattern::NoDiscounts, TOL).unwrap();
        assert_eq!(out.lines[0].discounted_gross, dec!(18.30));
        assert_eq!(out.lines[0].allocated_discount, Decimal::ZERO);
    }

    #[test]
    fn test_pattern2_proportional_split() {
        // gross [100, 50], D_order 15 → alloc [10, 5], discounted [90, 45]
        let o = order(
            vec![line("a", 1, dec!(100), dec!(0)), line("b", 1, dec!(50), dec!(0))],
            dec!(15),
        );
        let out = allocate(&o, DiscountPattern::OrderLevelOnly, TOL).unwrap();
        assert_eq!(out.lines[0].allocated_discount, dec!(10));
        assert_eq!(out.lines[1].allocated_discount, dec!(5));
        assert_eq!(out.lines[0].discounted_gross, dec!(90));
        assert_eq!(out.lines[1].discounted_gross, dec!(45));
    }

    #[test]
    fn test_pattern2_conserves_the_discount() {
        // An awkward split (3-way thirds) must still sum exactly
        let o = order(
            vec![
                line("a", 1, dec!(10), dec!(0)),
                line("b", 1, dec!(10), dec!(0)),
                line("c", 1, dec!(10), dec!(0)),
            ],
            dec!(10),
        );
        let out = allocate(&o, DiscountPattern::OrderLevelOnly, TOL).unwrap();
        let total: Decimal = out.lines.iter().map(|l| l.allocated_discount).sum();
        assert_eq!(total, dec!(10));
    }

    #[test]
    fn test_pattern2_residue_goes_to_largest_gross() {
        let o = order(
            vec![
                line("small", 1, dec!(10), dec!(0)),
                line("large", 1, dec!(20), dec!(0)),
                line("mid", 1, dec!(15), dec!(0)),
            ],
            dec!(10),
        );
        let out = allocate(&o, DiscountPattern::OrderLevelOnly, TOL).unwrap();
        let total: Decimal = out.lines.iter().map(|l| l.allocated_discount).sum();
        assert_eq!(total, dec!(10));
        // Shares stay proportional to gross within tolerance
        assert!((out.lines[1].allocated_discount - out.lines[0].allocated_discount * dec!(2))
            .abs()
            < TOL);
    }

    #[test]
    fn test_pattern2_zero_base_rejected() {
        let o = order(vec![line("a", 1, dec!(0), dec!(0))], dec!(5));
        let err = allocate(&o, DiscountPattern::OrderLevelOnly, TOL).unwrap_err();
        assert!(matches!(err, VerifyError::AllocationBaseZero { .. }));
    }

    #[test]
    fn test_pattern3_direct_subtraction() {
        let o = order(vec![line("a", 1, dec!(18.3), dec!(0.35))], dec!(0));
        let out = allocate(&o, DiscountPattern::ItemLevelOnly, TOL).unwrap();
        assert_eq!(out.lines[0].discounted_gross, dec!(17.95));
    }

    #[test]
    fn test_pattern4_two_stage() {
        // gross [100, 50], item discounts [10, 5], D_order 27, none
        // attributed → post_item [90, 45], residual 27 → alloc [18, 9]
        let o = order(
            vec![line("a", 1, dec!(100), dec!(10)), line("b", 1, dec!(50), dec!(5))],
            dec!(27),
        );
        let out = allocate(&o, DiscountPattern::Combined, TOL).unwrap();
        assert!(!out.degenerated);
        assert_eq!(out.residual, dec!(27));
        assert_eq!(out.lines[0].discounted_gross, dec!(72));
        assert_eq!(out.lines[1].discounted_gross, dec!(36));
    }

    #[test]
    fn test_pattern4_degenerates_to_pattern3() {
        // Item discounts sum to 10, D_order 10, all attributed → residual 0
        let mut o = order(
            vec![line("a", 1, dec!(100), dec!(6)), line("b", 1, dec!(50), dec!(4))],
            dec!(10),
        );
        o.already_attributed = Some(dec!(10));

        let combined = allocate(&o, DiscountPattern::Combined, TOL).unwrap();
        assert!(combined.degenerated);
        assert_eq!(combined.residual, Decimal::ZERO);

        // Identical discounted grosses to a straight Pattern 3 pass
        let item_only = allocate(&o, DiscountPattern::ItemLevelOnly, TOL).unwrap();
        for (c, i) in combined.lines.iter().zip(&item_only.lines) {
            assert_eq!(c.discounted_gross, i.discounted_gross);
        }
    }

    #[test]
    fn test_pattern4_residual_never_negative() {
        // More attributed than declared: residual floors at zero
        let mut o = order(vec![line("a", 1, dec!(100), dec!(20))], dec!(5));
        o.already_attributed = Some(dec!(20));
        let out = allocate(&o, DiscountPattern::Combined, TOL).unwrap();
        assert_eq!(out.residual, Decimal::ZERO);
        assert!(out.degenerated);
    }

    #[test]
    fn test_pattern4_zero_post_item_base_rejected() {
        // Item discounts consume the lines entirely, residual remains
        let o = order(vec![line("a", 1, dec!(10), dec!(10))], dec!(5));
        let err = allocate(&o, DiscountPattern::Combined, TOL).unwrap_err();
        assert!(matches!(err, VerifyError::AllocationBaseZero { .. }));
    }

    #[test]
    fn test_overlarge_discount_clamps_and_flags() {
        // D_order exceeds the whole order: lines clamp at zero, flagged
        let o = order(
            vec![line("a", 1, dec!(10), dec!(0)), line("b", 1, dec!(5), dec!(0))],
            dec!(30),
        );
        let out = allocate(&o, DiscountPattern::OrderLevelOnly, TOL).unwrap();
        assert!(out.lines.iter().all(|l| l.clamped));
        assert!(out.lines.iter().all(|l| l.discounted_gross == Decimal::ZERO));
    }
}
