//! # Menu / Settlement Consistency
//!
//! The audited pipeline records each order twice: a menu-oriented item
//! collection and a settlement-oriented one. Both describe the same
//! physical items, so their per-item figures must agree. This module
//! pairs the two collections by line id and compares them field by field.
//!
//! Structural in nature, not arithmetic: it says nothing about whether
//! either collection's numbers are correct, only whether the two stories
//! match each other. The reconcile module judges correctness.
//!
//! Like reconciliation, the check never aborts the run. Missing
//! collections make it not-applicable; unmatched or disagreeing items
//! make it fail; either way verification completes with a full report.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::within_tolerance;
use crate::reconcile::ReportStatus;
use crate::types::{ItemView, Order};

// =============================================================================
// Comparison Types
// =============================================================================

/// One field compared between the two views of a single item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldComparison {
    pub field: String,
    pub menu: Decimal,
    pub settlement: Decimal,
    pub within: bool,
}

/// All field comparisons for one matched item pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemComparison {
    pub line_id: String,
    pub name: String,
    pub fields: Vec<FieldComparison>,
}

impl ItemComparison {
    /// True when every compared field agreed.
    pub fn passed(&self) -> bool {
        self.fields.iter().all(|f| f.within)
    }
}

/// Outcome of the cross-check for one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsistencyReport {
    /// One or both collections were absent from the snapshot.
    NotApplicable { reason: String },

    /// Both collections present and compared.
    Checked {
        items: Vec<ItemComparison>,
        /// Line ids present only in the menu view.
        unmatched_menu: Vec<String>,
        /// Line ids present only in the settlement view.
        unmatched_settlement: Vec<String>,
        status: ReportStatus,
    },
}

impl ConsistencyReport {
    /// True unless the check ran and found a disagreement. Not-applicable
    /// counts as passing; absence of data is not an inconsistency.
    pub fn passed(&self) -> bool {
        match self {
            ConsistencyReport::NotApplicable { .. } => true,
            ConsistencyReport::Checked { status, .. } => *status == ReportStatus::Pass,
        }
    }
}

// =============================================================================
// Cross-Check
// =============================================================================

/// Pairs the order's two item collections by line id and compares every
/// matched pair field by field.
pub fn cross_check(order: &Order, tolerance: Decimal) -> ConsistencyReport {
    // Absent and empty are the same state: nothing to compare. Skipping is
    // not a failure; absence of data is not an inconsistency.
    let menu = order.menu_view.as_deref().filter(|v| !v.is_empty());
    let settlement = order.settlement_view.as_deref().filter(|v| !v.is_empty());
    let (menu, settlement) = match (menu, settlement) {
        (Some(m), Some(s)) => (m, s),
        (None, None) => {
            return ConsistencyReport::NotApplicable {
                reason: "snapshot carries neither item collection".to_string(),
            }
        }
        (None, Some(_)) => {
            return ConsistencyReport::NotApplicable {
                reason: "snapshot carries no menu-oriented collection".to_string(),
            }
        }
        (Some(_), None) => {
            return ConsistencyReport::NotApplicable {
                reason: "snapshot carries no settlement-oriented collection".to_string(),
            }
        }
    };

    let mut items = Vec::new();
    let mut unmatched_menu = Vec::new();

    for m in menu {
        match settlement.iter().find(|s| s.line_id == m.line_id) {
            Some(s) => items.push(compare_pair(m, s, tolerance)),
            None => unmatched_menu.push(m.line_id.clone()),
        }
    }

    let unmatched_settlement: Vec<String> = settlement
        .iter()
        .filter(|s| !menu.iter().any(|m| m.line_id == s.line_id))
        .map(|s| s.line_id.clone())
        .collect();

    let all_pass = unmatched_menu.is_empty()
        && unmatched_settlement.is_empty()
        && items.iter().all(ItemComparison::passed);

    ConsistencyReport::Checked {
        items,
        unmatched_menu,
        unmatched_settlement,
        status: if all_pass { ReportStatus::Pass } else { ReportStatus::Fail },
    }
}

fn compare_pair(menu: &ItemView, settlement: &ItemView, tolerance: Decimal) -> ItemComparison {
    // Quantity is integral; tolerance comparison degrades to equality.
    let pairs: [(&str, Decimal, Decimal); 9] = [
        ("qty", Decimal::from(menu.qty), Decimal::from(settlement.qty)),
        ("unit_price", menu.unit_price, settlement.unit_price),
        ("gross", menu.gross, settlement.gross),
        (
            "tax_exclusive_unit_price",
            menu.tax_exclusive_unit_price,
            settlement.tax_exclusive_unit_price,
        ),
        ("discount_amount", menu.discount_amount, settlement.discount_amount),
        (
            "tax_exclusive_discount_amount",
            menu.tax_exclusive_discount_amount,
            settlement.tax_exclusive_discount_amount,
        ),
        ("tax_amount", menu.tax_amount, settlement.tax_amount),
        ("net_amount", menu.net_amount, settlement.net_amount),
        ("total_price", menu.total_price, settlement.total_price),
    ];

    ItemComparison {
        line_id: menu.line_id.clone(),
        name: menu.name.clone(),
        fields: pairs
            .into_iter()
            .map(|(field, m, s)| FieldComparison {
                field: field.to_string(),
                menu: m,
                settlement: s,
                within: within_tolerance(m, s, tolerance),
            })
            .collect(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const TOL: Decimal = dec!(0.00001);

    fn view(line_id: &str, tax_amount: Decimal) -> ItemView {
        ItemView {
            line_id: line_id.to_string(),
            name: "Burger".to_string(),
            qty: 1,
            unit_price: dec!(18.30),
            gross: dec!(18.30),
            tax_exclusive_unit_price: dec!(16.63636),
            discount_amount: dec!(0.35),
            tax_exclusive_discount_amount: dec!(0.31818),
            tax_amount,
            net_amount: dec!(16.31818),
            total_price: dec!(17.95),
        }
    }

    fn order_with_views(
        menu: Option<Vec<ItemView>>,
        settlement: Option<Vec<ItemView>>,
    ) -> Order {
        Order {
            order_id: "ord-1".to_string(),
            lines: vec![],
            order_discount: Decimal::ZERO,
            already_attributed: None,
            menu_view: menu,
            settlement_view: settlement,
        }
    }

    #[test]
    fn test_missing_collection_is_not_applicable() {
        let order = order_with_views(Some(vec![view("l1", dec!(1.63182))]), None);
        let report = cross_check(&order, TOL);
        assert!(matches!(report, ConsistencyReport::NotApplicable { .. }));
        assert!(report.passed());
    }

    #[test]
    fn test_empty_collection_is_not_applicable() {
        // An empty view is the same as an absent one
        let order = order_with_views(Some(vec![view("l1", dec!(1.63182))]), Some(vec![]));
        let report = cross_check(&order, TOL);
        assert!(matches!(report, ConsistencyReport::NotApplicable { .. }));
    }

    #[test]
    fn test_agreeing_views_pass() {
        let order = order_with_views(
            Some(vec![view("l1", dec!(1.63182))]),
            Some(vec![view("l1", dec!(1.63182))]),
        );
        let report = cross_check(&order, TOL);
        assert!(report.passed());
        match report {
            ConsistencyReport::Checked { items, .. } => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].fields.len(), 9);
            }
            _ => panic!("expected checked report"),
        }
    }

    #[test]
    fn test_disagreeing_field_fails() {
        let order = order_with_views(
            Some(vec![view("l1", dec!(1.63182))]),
            Some(vec![view("l1", dec!(1.79500))]),
        );
        let report = cross_check(&order, TOL);
        assert!(!report.passed());
        match report {
            ConsistencyReport::Checked { items, status, .. } => {
                assert_eq!(status, ReportStatus::Fail);
                let bad: Vec<&FieldComparison> =
                    items[0].fields.iter().filter(|f| !f.within).collect();
                assert_eq!(bad.len(), 1);
                assert_eq!(bad[0].field, "tax_amount");
            }
            _ => panic!("expected checked report"),
        }
    }

    #[test]
    fn test_unmatched_items_fail_both_directions() {
        let order = order_with_views(
            Some(vec![view("only-menu", dec!(1.63182))]),
            Some(vec![view("only-settlement", dec!(1.63182))]),
        );
        match cross_check(&order, TOL) {
            ConsistencyReport::Checked {
                unmatched_menu,
                unmatched_settlement,
                status,
                ..
            } => {
                assert_eq!(unmatched_menu, vec!["only-menu".to_string()]);
                assert_eq!(unmatched_settlement, vec!["only-settlement".to_string()]);
                assert_eq!(status, ReportStatus::Fail);
            }
            _ => panic!("expected checked report"),
        }
    }

    #[test]
    fn test_sub_tolerance_drift_still_passes() {
        let mut drifted = view("l1", dec!(1.63182));
        drifted.net_amount = dec!(16.318181);
        let order = order_with_views(
            Some(vec![view("l1", dec!(1.63182))]),
            Some(vec![drifted]),
        );
        assert!(cross_check(&order, TOL).passed());
    }
}
