//! # Verification Orchestrator
//!
//! Runs the full audit pipeline for one order snapshot and assembles the
//! single immutable result object.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Order ──► validate ──► classify ──► allocate ──► back out ──┐        │
//! │              (fatal)     (pattern)   (per line)   (per line)  │        │
//! │                                                               ▼        │
//! │                                     ┌──────────── reconcile ──┤        │
//! │                                     │            (never fatal)│        │
//! │   menu/settlement views ──────────► cross-check               │        │
//! │                                     │            (never fatal)│        │
//! │                                     ▼                         ▼        │
//! │                              VerificationResult  (one per run)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Errors before allocation abort the run (the data is structurally
//! unusable); everything after produces findings and always completes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::allocation::allocate;
use crate::backout::back_out_line;
use crate::consistency::{cross_check, ConsistencyReport};
use crate::error::VerifyResult;
use crate::money::{clamp_precision, DEFAULT_PRECISION, DEFAULT_TOLERANCE};
use crate::pattern::{classify, PatternResult};
use crate::reconcile::{reconcile, ReportStatus, VarianceReport};
use crate::types::{LineComputation, Order};
use crate::validation::validate_order;

// =============================================================================
// Run Options
// =============================================================================

/// Explicit per-run knobs. The engine takes no configuration beyond these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VerifyOptions {
    /// Maximum absolute difference still counted as a match.
    pub tolerance: Decimal,

    /// Display rounding in decimal places (2..=8). Internal arithmetic
    /// always runs at full precision; this only shapes rendered output.
    pub precision: u32,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        VerifyOptions {
            tolerance: DEFAULT_TOLERANCE,
            precision: DEFAULT_PRECISION,
        }
    }
}

// =============================================================================
// Result Object
// =============================================================================

/// Everything one verification run produced. Created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub order_id: String,

    /// Classification outcome plus the figures it was decided on.
    pub pattern: PatternResult,

    /// Per-line allocation and back-out results, aligned with the order's
    /// lines.
    pub lines: Vec<LineComputation>,

    /// Stored-vs-recomputed variance report.
    pub reconciliation: VarianceReport,

    /// Menu-vs-settlement structural report.
    pub consistency: ConsistencyReport,

    /// The tolerance this run compared under.
    pub tolerance: Decimal,

    /// The display precision this run renders under.
    pub precision: u32,
}

impl VerificationResult {
    /// Overall verdict: both reports clean. Drives the process exit code.
    pub fn passed(&self) -> bool {
        self.reconciliation.status == ReportStatus::Pass && self.consistency.passed()
    }

    /// Sum of recomputed taxes across all lines.
    pub fn computed_tax_total(&self) -> Decimal {
        self.lines.iter().map(LineComputation::tax_total).sum()
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Verifies one order snapshot end to end.
///
/// ## Errors
/// Only structural problems abort: validation failures, a negative
/// discount aggregate at classification, an unusable rate during
/// back-out, or a zero proportional base during allocation. Numeric
/// mismatches never error; they land in the result's reports.
pub fn verify_order(order: &Order, options: &VerifyOptions) -> VerifyResult<VerificationResult> {
    validate_order(order)?;

    let item_discount_total = order.item_discount_total();
    let pattern = classify(&order.order_id, item_discount_total, order.order_discount)?;
    debug!(order_id = %order.order_id, pattern = %pattern, "classified order");

    let allocation = allocate(order, pattern, options.tolerance)?;

    let mut lines = Vec::with_capacity(order.lines.len());
    for (line, alloc) in order.lines.iter().zip(&allocation.lines) {
        let backed = back_out_line(
            alloc.discounted_gross,
            &line.rates,
            &order.order_id,
            &line.line_id,
        )?;
        lines.push(LineComputation {
            line_id: line.line_id.clone(),
            name: line.name.clone(),
            discounted_gross: alloc.discounted_gross,
            exclusive: backed.exclusive,
            taxes: backed.taxes,
            net: backed.net,
            allocated_discount: alloc.allocated_discount,
            clamped: alloc.clamped,
        });
    }

    let reconciliation = reconcile(order, &lines, options.tolerance);
    let consistency = cross_check(order, options.tolerance);

    Ok(VerificationResult {
        order_id: order.order_id.clone(),
        pattern: PatternResult {
            pattern,
            item_discount_total,
            order_discount: order.order_discount,
            residual: allocation.residual,
            degenerated: allocation.degenerated,
        },
        lines,
        reconciliation,
        consistency,
        tolerance: options.tolerance,
        precision: clamp_precision(options.precision),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VerifyError;
    use crate::pattern::DiscountPattern;
    use crate::types::{ItemView, OrderLine, RateLine};
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

    #[test]
    fn test_plain_order_single_rate() {
        // 18.30000 at 10%, no discounts: exclusive 16.63636, tax 1.66364
        let o = order(vec![line("l1", 1, dec!(18.30000), dec!(0))], dec!(0));
        let result = verify_order(&o, &VerifyOptions::default()).unwrap();

        assert_eq!(result.pattern.pattern, DiscountPattern::NoDiscounts);
        let l = &result.lines[0];
        assert_eq!(l.exclusive.round_dp(5), dec!(16.63636));
        assert_eq!(l.taxes[0].1.round_dp(5), dec!(1.66364));
        // Taxes plus net reassemble the discounted gross exactly
        assert_eq!(l.tax_total() + l.net, l.discounted_gross);
    }

    #[test]
    fn test_item_discount_matches_stored_tax() {
        // 18.30000 less 0.35000 item discount at 10%: tax 1.63182, and
        // the stored amount agrees within tolerance so the run passes
        let mut l = line("l1", 1, dec!(18.30000), dec!(0.35000));
        l.stored_taxes.insert("vat".to_string(), dec!(1.63182));
        let o = order(vec![l], dec!(0));

        let result = verify_order(&o, &VerifyOptions::default()).unwrap();
        assert_eq!(result.pattern.pattern, DiscountPattern::ItemLevelOnly);
        let l = &result.lines[0];
        assert_eq!(l.discounted_gross, dec!(17.95000));
        assert_eq!(l.exclusive.round_dp(5), dec!(16.31818));
        assert_eq!(l.taxes[0].1.round_dp(5), dec!(1.63182));
        assert_eq!(result.reconciliation.status, ReportStatus::Pass);
        assert!(result.passed());
    }

    #[test]
    fn test_order_discount_allocates_proportionally() {
        let o = order(
            vec![line("a", 1, dec!(100), dec!(0)), line("b", 1, dec!(50), dec!(0))],
            dec!(15),
        );
        let result = verify_order(&o, &VerifyOptions::default()).unwrap();
        assert_eq!(result.pattern.pattern, DiscountPattern::OrderLevelOnly);
        assert_eq!(result.lines[0].allocated_discount, dec!(10));
        assert_eq!(result.lines[1].allocated_discount, dec!(5));
        assert_eq!(result.lines[0].discounted_gross, dec!(90));
        assert_eq!(result.lines[1].discounted_gross, dec!(45));
    }

    #[test]
    fn test_fully_attributed_combined_order_degenerates() {
        let mut o = order(
            vec![line("a", 1, dec!(100), dec!(6)), line("b", 1, dec!(50), dec!(4))],
            dec!(10),
        );
        o.already_attributed = Some(dec!(10));

        let combined = verify_order(&o, &VerifyOptions::default()).unwrap();
        assert_eq!(combined.pattern.pattern, DiscountPattern::Combined);
        assert!(combined.pattern.degenerated);
        assert_eq!(combined.pattern.residual, Decimal::ZERO);

        // Same amounts as the pure item-level run on the same discounts
        let mut item_only = o.clone();
        item_only.order_discount = Decimal::ZERO;
        item_only.already_attributed = None;
        let reference = verify_order(&item_only, &VerifyOptions::default()).unwrap();
        for (c, r) in combined.lines.iter().zip(&reference.lines) {
            assert_eq!(c.discounted_gross, r.discounted_gross);
            assert_eq!(c.taxes, r.taxes);
        }
    }

    #[test]
    fn test_view_disagreement_flags_exactly_one_field() {
        fn view(unit_price: Decimal) -> ItemView {
            ItemView {
                line_id: "l1".to_string(),
                name: "Burger".to_string(),
                qty: 1,
                unit_price,
                gross: dec!(18.30),
                tax_exclusive_unit_price: dec!(16.63636),
                discount_amount: Decimal::ZERO,
                tax_exclusive_discount_amount: Decimal::ZERO,
                tax_amount: dec!(1.66364),
                net_amount: dec!(16.63636),
                total_price: dec!(18.30),
            }
        }

        let mut o = order(vec![line("l1", 1, dec!(18.30), dec!(0))], dec!(0));
        o.menu_view = Some(vec![view(dec!(18.30))]);
        o.settlement_view = Some(vec![view(dec!(19.30))]);

        let result = verify_order(&o, &VerifyOptions::default()).unwrap();
        assert!(!result.passed());
        match &result.consistency {
            ConsistencyReport::Checked { items, status, .. } => {
                assert_eq!(*status, ReportStatus::Fail);
                let bad: Vec<_> = items[0].fields.iter().filter(|f| !f.within).collect();
                assert_eq!(bad.len(), 1);
                assert_eq!(bad[0].field, "unit_price");
            }
            _ => panic!("expected checked consistency report"),
        }
    }

    #[test]
    fn test_multi_rate_line_splits_tax_per_id() {
        let mut l = line("l1", 1, dec!(100), dec!(0));
        l.rates = vec![
            RateLine { tax_id: "vat".to_string(), rate: dec!(0.10) },
            RateLine { tax_id: "levy".to_string(), rate: dec!(0.04) },
        ];
        let o = order(vec![l], dec!(0));
        let result = verify_order(&o, &VerifyOptions::default()).unwrap();
        let l = &result.lines[0];
        assert_eq!(l.taxes.len(), 2);
        assert_eq!(l.exclusive.round_dp(5), dec!(87.71930));
        assert_eq!(l.tax_total() + l.net, dec!(100));
    }

    #[test]
    fn test_structurally_broken_order_aborts() {
        let o = order(vec![], dec!(0));
        let err = verify_order(&o, &VerifyOptions::default()).unwrap_err();
        assert!(matches!(err, VerifyError::EmptyOrder { .. }));
    }

    #[test]
    fn test_mismatch_is_reported_not_fatal() {
        let mut l = line("l1", 1, dec!(18.30000), dec!(0.35000));
        l.stored_taxes.insert("vat".to_string(), dec!(1.79500));
        let o = order(vec![l], dec!(0));

        let result = verify_order(&o, &VerifyOptions::default()).unwrap();
        assert_eq!(result.reconciliation.status, ReportStatus::Fail);
        assert!(!result.passed());
        assert!(!result.reconciliation.failures().is_empty());
    }

    #[test]
    fn test_precision_is_clamped_into_display_range() {
        let o = order(vec![line("l1", 1, dec!(10), dec!(0))], dec!(0));
        let opts = VerifyOptions { tolerance: DEFAULT_TOLERANCE, precision: 12 };
        let result = verify_order(&o, &opts).unwrap();
        assert_eq!(result.precision, 8);
    }
}
