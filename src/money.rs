//! Helpers for the single-currency decimal amounts used throughout billing.

/// Round `amount` to two fractional digits, the precision of the logical
/// DECIMAL(10,2) money columns.
pub fn round_dp2(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod money_tests {
    use super::round_dp2;

    #[test]
    fn rounds_to_two_fractional_digits() {
        assert_eq!(round_dp2(50_000.006), 50_000.01);
        assert_eq!(round_dp2(50_000.004), 50_000.0);
    }

    #[test]
    fn leaves_whole_amounts_unchanged() {
        assert_eq!(round_dp2(80_000.0), 80_000.0);
    }
}
