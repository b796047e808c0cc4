//! # Report Rendering
//!
//! Turns a `VerificationResult` into the operator-facing text report.
//! Pure string building: no I/O, no process exit, so every view is unit
//! testable.
//!
//! All figures are rounded here, at the display boundary, to the run's
//! precision; the engine's internal values stay untouched.

use std::fmt::Write;

use clap::ValueEnum;
use rust_decimal::Decimal;

use veritax_core::consistency::ConsistencyReport;
use veritax_core::money::round_display;
use veritax_core::reconcile::Variance;
use veritax_core::verify::VerificationResult;
use veritax_db::{PartnerConfig, PartnerKey};

/// How much of the tax comparison to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaxView {
    /// One summary row per line.
    Basic,
    /// Every per-tax and net row, plus order totals.
    Full,
    /// Only the rows that disagreed.
    Failures,
}

fn verdict(within: bool) -> &'static str {
    if within {
        "PASS"
    } else {
        "FAIL"
    }
}

fn fmt_amount(value: Decimal, precision: u32) -> String {
    // Pad to the display precision so columns line up
    format!("{:.*}", precision as usize, round_display(value, precision))
}

// =============================================================================
// Verification Report
// =============================================================================

/// Renders the full verification report in the requested view.
pub fn render_report(result: &VerificationResult, view: TaxView) -> String {
    let p = result.precision;
    let mut out = String::new();

    let _ = writeln!(out, "{}", "=".repeat(64));
    let _ = writeln!(out, " TAX VERIFICATION - {}", result.order_id);
    let _ = writeln!(out, "{}", "=".repeat(64));
    let _ = writeln!(out, " {}", result.pattern.pattern);
    let _ = writeln!(
        out,
        " Item discounts:  {}",
        fmt_amount(result.pattern.item_discount_total, p)
    );
    let _ = writeln!(
        out,
        " Order discount:  {}",
        fmt_amount(result.pattern.order_discount, p)
    );
    if result.pattern.degenerated {
        let _ = writeln!(
            out,
            " Residual {} within tolerance: validated as item-level only",
            fmt_amount(result.pattern.residual, p)
        );
    } else if result.pattern.residual > Decimal::ZERO {
        let _ = writeln!(
            out,
            " Residual order discount distributed: {}",
            fmt_amount(result.pattern.residual, p)
        );
    }
    let _ = writeln!(out);

    match view {
        TaxView::Basic => render_basic(&mut out, result),
        TaxView::Full => render_full(&mut out, result),
        TaxView::Failures => render_failures(&mut out, result),
    }

    render_consistency(&mut out, result, view);

    let _ = writeln!(out, "{}", "=".repeat(64));
    let _ = writeln!(
        out,
        " RESULT: {}",
        if result.passed() { "PASS" } else { "FAIL" }
    );
    let _ = writeln!(out, "{}", "=".repeat(64));

    out
}

fn render_basic(out: &mut String, result: &VerificationResult) {
    let p = result.precision;
    let _ = writeln!(out, " LINE ITEMS");
    for (comp, vars) in result.lines.iter().zip(&result.reconciliation.lines) {
        let stored: Decimal = vars.taxes.iter().map(|v| v.expected).sum();
        let _ = writeln!(
            out,
            "   [{}] {}  gross {}  tax stored {} / computed {}  {}",
            comp.line_id,
            comp.name,
            fmt_amount(comp.discounted_gross, p),
            fmt_amount(stored, p),
            fmt_amount(comp.tax_total(), p),
            verdict(vars.passed()),
        );
    }
    let _ = writeln!(out);
}

fn render_full(out: &mut String, result: &VerificationResult) {
    let p = result.precision;
    let _ = writeln!(out, " LINE ITEMS");
    for (comp, vars) in result.lines.iter().zip(&result.reconciliation.lines) {
        let _ = writeln!(out, "   [{}] {}", comp.line_id, comp.name);
        let _ = writeln!(
            out,
            "       discounted gross: {}   exclusive: {}   net: {}",
            fmt_amount(comp.discounted_gross, p),
            fmt_amount(comp.exclusive, p),
            fmt_amount(comp.net, p),
        );
        if comp.allocated_discount > Decimal::ZERO {
            let _ = writeln!(
                out,
                "       allocated discount: {}",
                fmt_amount(comp.allocated_discount, p)
            );
        }
        if comp.clamped {
            let _ = writeln!(out, "       ! discounted gross clamped to zero (data error)");
        }
        for v in &vars.taxes {
            render_variance_row(out, v, p);
        }
        if let Some(v) = &vars.net {
            render_variance_row(out, v, p);
        }
    }

    let _ = writeln!(out, " ORDER TOTALS");
    for v in &result.reconciliation.totals {
        render_variance_row(out, v, p);
    }
    let _ = writeln!(out);
}

fn render_failures(out: &mut String, result: &VerificationResult) {
    let p = result.precision;
    let failures = result.reconciliation.failures();
    if failures.is_empty() {
        let _ = writeln!(out, " No tax variances beyond tolerance");
        let _ = writeln!(out);
        return;
    }
    let _ = writeln!(out, " FAILED COMPARISONS");
    for (scope, v) in failures {
        let _ = write!(out, "   [{scope}]");
        render_variance_row(out, v, p);
    }
    let _ = writeln!(out);
}

fn render_variance_row(out: &mut String, v: &Variance, precision: u32) {
    let _ = writeln!(
        out,
        "       {}: stored {}  computed {}  delta {}  {}",
        v.label,
        fmt_amount(v.expected, precision),
        fmt_amount(v.computed, precision),
        fmt_amount(v.delta, precision),
        verdict(v.within),
    );
}

fn render_consistency(out: &mut String, result: &VerificationResult, view: TaxView) {
    let p = result.precision;
    let _ = writeln!(out, " MENU/ITEM DETAILS CONSISTENCY");
    match &result.consistency {
        ConsistencyReport::NotApplicable { reason } => {
            let _ = writeln!(out, "   Not applicable: {reason}");
        }
        ConsistencyReport::Checked {
            items,
            unmatched_menu,
            unmatched_settlement,
            status,
        } => {
            for item in items {
                let show_fields = match view {
                    TaxView::Full => true,
                    TaxView::Basic | TaxView::Failures => !item.passed(),
                };
                let _ = writeln!(
                    out,
                    "   [{}] {}  {}",
                    item.line_id,
                    item.name,
                    verdict(item.passed())
                );
                if show_fields {
                    for f in item.fields.iter().filter(|f| view == TaxView::Full || !f.within) {
                        let _ = writeln!(
                            out,
                            "       {}: menu {}  settlement {}  {}",
                            f.field,
                            fmt_amount(f.menu, p),
                            fmt_amount(f.settlement, p),
                            verdict(f.within),
                        );
                    }
                }
            }
            for id in unmatched_menu {
                let _ = writeln!(out, "   [{id}] present only in menu collection  FAIL");
            }
            for id in unmatched_settlement {
                let _ = writeln!(out, "   [{id}] present only in settlement collection  FAIL");
            }
            let _ = writeln!(out, "   Consistency: {:?}", status);
        }
    }
    let _ = writeln!(out);
}

// =============================================================================
// Partner Configuration
// =============================================================================

/// Renders the partner configuration section: the typed common fields
/// first with labels, then every remaining field generically.
pub fn render_partner_config(key: &PartnerKey, config: Option<&PartnerConfig>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(64));
    let _ = writeln!(out, " PARTNER CONFIGURATION");
    let _ = writeln!(out, "{}", "=".repeat(64));

    let Some(config) = config else {
        let _ = writeln!(out, "   Status: NOT FOUND");
        let _ = writeln!(out, "   Partner ID:      {}", key.partner_id);
        let _ = writeln!(out, "   Application ID:  {}", key.application_id);
        let _ = writeln!(out, "   Brand ID:        {}", key.brand_id);
        let _ = writeln!(out, "   Location ID:     {}", key.location_id);
        return out;
    };

    let _ = writeln!(out, "   Partner ID:      {}", config.partner_id);
    let _ = writeln!(out, "   Application ID:  {}", config.application_id);
    let _ = writeln!(out, "   Brand ID:        {}", config.brand_id);
    let _ = writeln!(out, "   Location ID:     {}", config.location_id);
    if let Some(status) = &config.status {
        let _ = writeln!(out, "   Status:          {status}");
    }
    if let Some(menu_id) = &config.menu_id {
        let _ = writeln!(out, "   Menu ID:         {menu_id}");
    }
    for (field, value) in &config.extra {
        let _ = writeln!(out, "   {field}:  {value}");
    }

    out
}

// =============================================================================
// Unit Tests
// =============================================================================
