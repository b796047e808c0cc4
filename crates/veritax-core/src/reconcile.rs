//! # Reconciliation
//!
//! Compares stored amounts against recomputed ones and reports every
//! variance. This module never fails the run: numeric disagreement is a
//! finding, not an error, and the report is always complete so an auditor
//! sees every mismatch in one pass.
//!
//! ## Comparison Plan
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  per line, per tax id:   stored_tax[id]   vs  recomputed tax[id]       │
//! │  per line (if stored):   stored_net       vs  recomputed net           │
//! │  per order, per tax id:  Σ stored_tax[id] vs  Σ recomputed tax[id]     │
//! │                                                                         │
//! │  every row:  |expected − computed| ≤ tolerance  →  match               │
//! │  report:     PASS iff every row matches                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tax ids are compared over the union of stored and recomputed sets, so a
//! tax recorded but never recomputed (or vice versa) surfaces as a
//! variance against zero instead of disappearing.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::within_tolerance;
use crate::types::{LineComputation, Order};

// =============================================================================
// Report Types
// =============================================================================

/// Overall outcome of a variance or consistency report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Every compared row agreed within tolerance.
    Pass,
    /// At least one row disagreed beyond tolerance.
    Fail,
}

/// One compared value pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variance {
    /// What was compared: a tax id, or `"net"`.
    pub label: String,

    /// The stored value under audit.
    pub expected: Decimal,

    /// The engine's recomputed value.
    pub computed: Decimal,

    /// `expected - computed`, signed.
    pub delta: Decimal,

    /// True when `|delta|` is at or below the run tolerance.
    pub within: bool,
}

impl Variance {
    fn compare(label: &str, expected: Decimal, computed: Decimal, tolerance: Decimal) -> Self {
        Variance {
            label: label.to_string(),
            expected,
            computed,
            delta: expected - computed,
            within: within_tolerance(expected, computed, tolerance),
        }
    }
}

/// All variances found on one order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineVariances {
    pub line_id: String,
    pub name: String,

    /// One row per tax id (union of stored and recomputed).
    pub taxes: Vec<Variance>,

    /// Net comparison, present only when the pipeline stored a net amount.
    pub net: Option<Variance>,
}

impl LineVariances {
    /// True when every row on this line matched.
    pub fn passed(&self) -> bool {
        self.taxes.iter().all(|v| v.within) && self.net.as_ref().map_or(true, |v| v.within)
    }
}

/// The full reconciliation report for one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarianceReport {
    pub lines: Vec<LineVariances>,

    /// Order-level aggregate per tax id: summed stored vs summed
    /// recomputed. Catches compensating per-line errors that cancel out
    /// nowhere else.
    pub totals: Vec<Variance>,

    pub status: ReportStatus,
}

impl VarianceReport {
    /// Every row that disagreed, flattened for the failures view.
    pub fn failures(&self) -> Vec<(&str, &Variance)> {
        let mut out: Vec<(&str, &Variance)> = Vec::new();
        for line in &self.lines {
            for v in line.taxes.iter().filter(|v| !v.within) {
                out.push((line.line_id.as_str(), v));
            }
            if let Some(v) = line.net.as_ref().filter(|v| !v.within) {
                out.push((line.line_id.as_str(), v));
            }
        }
        for v in self.totals.iter().filter(|v| !v.within) {
            out.push(("order", v));
        }
        out
    }
}

// =============================================================================
// Reconciler
// =============================================================================

/// Builds the complete variance report for one order.
///
/// `computations` must be positionally aligned with `order.lines` (the
/// orchestrator guarantees this). Total, never errors.
pub fn reconcile(
    order: &Order,
    computations: &[LineComputation],
    tolerance: Decimal,
) -> VarianceReport {
    let mut lines = Vec::with_capacity(order.lines.len());
    let mut stored_totals: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut computed_totals: BTreeMap<String, Decimal> = BTreeMap::new();

    for (line, comp) in order.lines.iter().zip(computations) {
        let computed: BTreeMap<&str, Decimal> = comp
            .taxes
            .iter()
            .map(|(id, amount)| (id.as_str(), *amount))
            .collect();

        // Union of tax ids, stored first so the row order is stable.
        let mut ids: Vec<&str> = line.stored_taxes.keys().map(String::as_str).collect();
        for (id, _) in &comp.taxes {
            if !line.stored_taxes.contains_key(id) {
                ids.push(id.as_str());
            }
        }

        let taxes: Vec<Variance> = ids
            .iter()
            .map(|id| {
                let stored = line.stored_taxes.get(*id).copied().unwrap_or(Decimal::ZERO);
                let recomputed = computed.get(*id).copied().unwrap_or(Decimal::ZERO);
                *stored_totals.entry((*id).to_string()).or_default() += stored;
                *computed_totals.entry((*id).to_string()).or_default() += recomputed;
                Variance::compare(id, stored, recomputed, tolerance)
            })
            .collect();

        let net = line
            .stored_net
            .map(|stored| Variance::compare("net", stored, comp.net, tolerance));

        lines.push(LineVariances {
            line_id: line.line_id.clone(),
            name: line.name.clone(),
            taxes,
            net,
        });
    }

    let totals: Vec<Variance> = stored_totals
        .keys()
        .map(|id| {
            let stored = stored_totals[id];
            let recomputed = computed_totals.get(id).copied().unwrap_or(Decimal::ZERO);
            Variance::compare(id, stored, recomputed, tolerance)
        })
        .collect();

    let all_pass = lines.iter().all(LineVariances::passed) && totals.iter().all(|v| v.within);

    VarianceReport {
        lines,
        totals,
        status: if all_pass { ReportStatus::Pass } else { ReportStatus::Fail },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderLine, RateLine};
    use rust_decimal_macros::dec;

    const TOL: Decimal = dec!(0.00001);

    fn line_with_stored(stored: &[(&str, Decimal)], stored_net: Option<Decimal>) -> OrderLine {
        OrderLine {
            line_id: "l1".to_string(),
            name: "Item".to_string(),
            qty: 1,
            unit_price: dec!(17.95),
            item_discount: Decimal::ZERO,
            rates: vec![RateLine { tax_id: "vat".to_string(), rate: dec!(0.10) }],
            stored_taxes: stored
                .iter()
                .map(|(id, v)| (id.to_string(), *v))
                .collect(),
            stored_net,
        }
    }

    fn order_of(lines: Vec<OrderLine>) -> Order {
        Order {
            order_id: "ord-1".to_string(),
            lines,
            order_discount: Decimal::ZERO,
            already_attributed: None,
            menu_view: None,
            settlement_view: None,
        }
    }

    fn comp(taxes: Vec<(&str, Decimal)>, net: Decimal) -> LineComputation {
        LineComputation {
            line_id: "l1".to_string(),
            name: "Item".to_string(),
            discounted_gross: dec!(17.95),
            exclusive: dec!(16.31818),
            taxes: taxes.into_iter().map(|(id, v)| (id.to_string(), v)).collect(),
            net,
            allocated_discount: Decimal::ZERO,
            clamped: false,
        }
    }

    #[test]
    fn test_matching_amounts_pass() {
        let order = order_of(vec![line_with_stored(&[("vat", dec!(1.63182))], None)]);
        let comps = vec![comp(vec![("vat", dec!(1.631818181))], dec!(16.31818))];
        let report = reconcile(&order, &comps, TOL);
        assert_eq!(report.status, ReportStatus::Pass);
        assert!(report.failures().is_empty());
    }

    #[test]
    fn test_variance_beyond_tolerance_fails() {
        let order = order_of(vec![line_with_stored(&[("vat", dec!(1.79500))], None)]);
        let comps = vec![comp(vec![("vat", dec!(1.63182))], dec!(16.31818))];
        let report = reconcile(&order, &comps, TOL);
        assert_eq!(report.status, ReportStatus::Fail);
        let failures = report.failures();
        assert!(!failures.is_empty());
        // Delta is signed: stored overstates by the recomputation gap
        assert_eq!(report.lines[0].taxes[0].delta, dec!(1.79500) - dec!(1.63182));
    }

    #[test]
    fn test_stored_tax_with_no_recomputed_counterpart_surfaces() {
        // A stored tax id the rates never produce compares against zero
        let order = order_of(vec![line_with_stored(&[("levy", dec!(0.50))], None)]);
        let comps = vec![comp(vec![("vat", dec!(1.63182))], dec!(16.31818))];
        let report = reconcile(&order, &comps, TOL);
        assert_eq!(report.status, ReportStatus::Fail);
        let labels: Vec<&str> = report.lines[0].taxes.iter().map(|v| v.label.as_str()).collect();
        assert!(labels.contains(&"levy"));
        assert!(labels.contains(&"vat"));
    }

    #[test]
    fn test_net_compared_only_when_stored() {
        let without = order_of(vec![line_with_stored(&[("vat", dec!(1.63182))], None)]);
        let with = order_of(vec![line_with_stored(
            &[("vat", dec!(1.63182))],
            Some(dec!(16.31818)),
        )]);
        let comps = vec![comp(vec![("vat", dec!(1.63182))], dec!(16.318181818))];

        assert!(reconcile(&without, &comps, TOL).lines[0].net.is_none());
        let report = reconcile(&with, &comps, TOL);
        assert!(report.lines[0].net.as_ref().is_some_and(|v| v.within));
        assert_eq!(report.status, ReportStatus::Pass);
    }

    #[test]
    fn test_order_totals_aggregate_per_tax_id() {
        let mut a = line_with_stored(&[("vat", dec!(1.00000))], None);
        a.line_id = "a".to_string();
        let mut b = line_with_stored(&[("vat", dec!(2.00000))], None);
        b.line_id = "b".to_string();
        let order = order_of(vec![a, b]);

        let comps = vec![
            comp(vec![("vat", dec!(1.00000))], dec!(10)),
            comp(vec![("vat", dec!(2.00000))], dec!(20)),
        ];
        let report = reconcile(&order, &comps, TOL);
        assert_eq!(report.totals.len(), 1);
        assert_eq!(report.totals[0].expected, dec!(3.00000));
        assert_eq!(report.totals[0].computed, dec!(3.00000));
        assert_eq!(report.status, ReportStatus::Pass);
    }

    #[test]
    fn test_report_is_complete_despite_failures() {
        // Two bad lines: both appear; the first mismatch does not stop the run
        let mut a = line_with_stored(&[("vat", dec!(9.99))], None);
        a.line_id = "a".to_string();
        let mut b = line_with_stored(&[("vat", dec!(8.88))], None);
        b.line_id = "b".to_string();
        let order = order_of(vec![a, b]);

        let comps = vec![
            comp(vec![("vat", dec!(1.63182))], dec!(16.31818)),
            comp(vec![("vat", dec!(1.63182))], dec!(16.31818)),
        ];
        let report = reconcile(&order, &comps, TOL);
        assert_eq!(report.lines.len(), 2);
        assert!(report.failures().len() >= 2);
    }
}
