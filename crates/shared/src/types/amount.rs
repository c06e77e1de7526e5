//! Amount comparison helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal`; comparisons that gate the
//! balance invariant go through the fixed epsilon below because stored
//! totals may be accumulated from line sums computed upstream.

use rust_decimal::Decimal;

/// Tolerance for debit/credit balance comparisons: 1e-4.
///
/// Wide enough to absorb accumulation noise in upstream line sums, narrow
/// enough that a genuinely missing cent is still rejected.
pub const BALANCE_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Returns true if two amounts are equal within [`BALANCE_EPSILON`].
#[must_use]
pub fn amounts_equal(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= BALANCE_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_epsilon_value() {
        assert_eq!(BALANCE_EPSILON, dec!(0.0001));
    }

    #[rstest]
    #[case(dec!(100), dec!(100), true)]
    #[case(dec!(100.00005), dec!(100), true)]
    #[case(dec!(100.0001), dec!(100), true)]
    #[case(dec!(100.0002), dec!(100), false)]
    #[case(dec!(150), dec!(140), false)]
    #[case(dec!(0), dec!(0), true)]
    fn test_amounts_equal(#[case] a: Decimal, #[case] b: Decimal, #[case] expected: bool) {
        assert_eq!(amounts_equal(a, b), expected);
        assert_eq!(amounts_equal(b, a), expected);
    }
}
