//! # Tax Back-Out
//!
//! The pure numeric primitive of the engine: given a tax-inclusive
//! discounted gross and the rates applied to it, recover the exclusive
//! amount and each rate's tax share.
//!
//! ## The Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Tax-inclusive pricing means the stored price already CONTAINS tax:    │
//! │                                                                         │
//! │      discounted_gross = exclusive × (1 + R)      R = Σ rate_j          │
//! │                                                                         │
//! │  so the engine inverts it:                                             │
//! │                                                                         │
//! │      exclusive = discounted_gross / (1 + R)                            │
//! │      tax_j     = exclusive × rate_j              (per-rate share)      │
//! │      net       = discounted_gross − Σ tax_j                            │
//! │                                                                         │
//! │  Conservation law (holds by construction, tested below):               │
//! │      Σ tax_j + net = discounted_gross                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rates are additive, never compounding. No rounding happens here;
//! callers round only at display time.

use rust_decimal::Decimal;

use crate::error::{VerifyError, VerifyResult};
use crate::types::RateLine;

// =============================================================================
// Back-Out Result
// =============================================================================

/// Result of backing tax out of one tax-inclusive amount.
#[derive(Debug, Clone, PartialEq)]
pub struct BackOut {
    /// The amount with all tax removed: `discounted_gross / (1 + R)`.
    pub exclusive: Decimal,

    /// Per-rate tax shares, preserving the input rate order.
    pub taxes: Vec<(String, Decimal)>,

    /// `discounted_gross` minus all tax shares. Computed by subtraction so
    /// the conservation law holds exactly, with no division residue.
    pub net: Decimal,
}

impl BackOut {
    /// Sum of all per-rate tax shares.
    pub fn tax_total(&self) -> Decimal {
        self.taxes.iter().map(|(_, t)| *t).sum()
    }
}

// =============================================================================
// Back-Out Function
// =============================================================================

/// Backs exclusive amount and per-rate tax out of a tax-inclusive gross.
///
/// ## Errors
/// `InvalidRate` when any rate is negative or the aggregated rate would
/// make the `1 + R` divisor non-positive. (`order_id`/`line_id` context is
/// attached by the caller through [`back_out_line`].)
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use veritax_core::backout::back_out;
/// use veritax_core::types::RateLine;
///
/// let rates = vec![RateLine { tax_id: "vat".to_string(), rate: Decimal::new(10, 2) }];
/// let result = back_out(Decimal::new(1795, 2), &rates).unwrap(); // 17.95 @ 10%
///
/// // 17.95 / 1.1 = 16.31818..., tax = 1.63181...
/// assert_eq!(result.exclusive.round_dp(5).to_string(), "16.31818");
/// assert_eq!(result.taxes[0].1.round_dp(5).to_string(), "1.63182");
/// ```
pub fn back_out(discounted_gross: Decimal, rates: &[RateLine]) -> VerifyResult<BackOut> {
    let mut rate_sum = Decimal::ZERO;
    for rate in rates {
        if rate.rate < Decimal::ZERO {
            return Err(invalid_rate(rate.rate));
        }
        rate_sum += rate.rate;
    }

    let divisor = Decimal::ONE + rate_sum;
    if divisor <= Decimal::ZERO {
        return Err(invalid_rate(rate_sum));
    }

    let exclusive = discounted_gross / divisor;

    let taxes: Vec<(String, Decimal)> = rates
        .iter()
        .map(|r| (r.tax_id.clone(), exclusive * r.rate))
        .collect();

    let tax_total: Decimal = taxes.iter().map(|(_, t)| *t).sum();
    let net = discounted_gross - tax_total;

    Ok(BackOut { exclusive, taxes, net })
}

/// [`back_out`] with order/line context attached to any rate error.
pub fn back_out_line(
    discounted_gross: Decimal,
    rates: &[RateLine],
    order_id: &str,
    line_id: &str,
) -> VerifyResult<BackOut> {
    back_out(discounted_gross, rates).map_err(|err| match err {
        VerifyError::InvalidRate { rate, .. } => VerifyError::InvalidRate {
            order_id: order_id.to_string(),
            line_id: line_id.to_string(),
            rate,
        },
        other => other,
    })
}

fn invalid_rate(rate: Decimal) -> VerifyError {
    VerifyError::InvalidRate {
        order_id: String::new(),
        line_id: String::new(),
        rate,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rate(id: &str, r: Decimal) -> RateLine {
        RateLine { tax_id: id.to_string(), rate: r }
    }

    #[test]
    fn test_single_rate_back_out() {
        // 18.30000 at 10%: exclusive 16.63636, tax 1.66364 (5 dp)
        let result = back_out(dec!(18.3), &[rate("vat", dec!(0.10))]).unwrap();
        assert_eq!(result.exclusive.round_dp(5), dec!(16.63636));
        assert_eq!(result.taxes[0].1.round_dp(5), dec!(1.66364));
    }

    #[test]
    fn test_conservation_law() {
        // Σ tax + net = discounted_gross, exactly
        let result = back_out(
            dec!(42.37),
            &[rate("vat", dec!(0.14)), rate("levy", dec!(0.05))],
        )
        .unwrap();
        assert_eq!(result.tax_total() + result.net, dec!(42.37));
    }

    #[test]
    fn test_multi_rate_decomposition_matches_aggregate() {
        // Splitting R across rates must not change the exclusive amount
        let combined = back_out(dec!(100), &[rate("all", dec!(0.15))]).unwrap();
        let split = back_out(
            dec!(100),
            &[rate("vat", dec!(0.10)), rate("levy", dec!(0.05))],
        )
        .unwrap();
        assert_eq!(combined.exclusive, split.exclusive);
        assert!((combined.tax_total() - split.tax_total()).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_per_rate_shares_are_proportional() {
        let result = back_out(
            dec!(100),
            &[rate("vat", dec!(0.10)), rate("levy", dec!(0.05))],
        )
        .unwrap();
        // vat share is twice the levy share (up to the last internal digit)
        let diff = result.taxes[0].1 - result.taxes[1].1 * dec!(2);
        assert!(diff.abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_zero_rate_set_is_identity() {
        // Back-out at R = 0 returns the input untouched
        let result = back_out(dec!(17.95), &[]).unwrap();
        assert_eq!(result.exclusive, dec!(17.95));
        assert_eq!(result.net, dec!(17.95));
        assert!(result.taxes.is_empty());
    }

    #[test]
    fn test_idempotent_on_own_exclusive_output() {
        // Treating the output as already-exclusive with R = 0 changes nothing
        let first = back_out(dec!(18.3), &[rate("vat", dec!(0.10))]).unwrap();
        let again = back_out(first.exclusive, &[]).unwrap();
        assert_eq!(again.exclusive, first.exclusive);
    }

    #[test]
    fn test_zero_gross() {
        let result = back_out(Decimal::ZERO, &[rate("vat", dec!(0.10))]).unwrap();
        assert_eq!(result.exclusive, Decimal::ZERO);
        assert_eq!(result.taxes[0].1, Decimal::ZERO);
        assert_eq!(result.net, Decimal::ZERO);
    }

    #[test]
    fn test_negative_rate_rejected() {
        let err = back_out(dec!(10), &[rate("vat", dec!(-0.10))]).unwrap_err();
        assert!(matches!(err, VerifyError::InvalidRate { .. }));
    }

    #[test]
    fn test_line_context_attached() {
        let err = back_out_line(dec!(10), &[rate("vat", dec!(-0.10))], "ord-9", "l3")
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("ord-9"));
        assert!(msg.contains("l3"));
    }
}
