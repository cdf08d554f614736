//! Arbitrary-precision decimal helpers shared by the spatial index.
//!
//! All patch center coordinates are `BigDecimal` to avoid accumulating
//! float drift when comparing centers for grid alignment. Grid
//! index arithmetic divides with half-up rounding at a fixed scale; only
//! the circle-offset precomputation (offset-space, tiny magnitudes) is
//! allowed to use doubles.

use bigdecimal::{BigDecimal, RoundingMode};

/// Fractional digits kept after a half-up rounded division, matching the
/// reference implementation's fixed scale.
pub const DECIMAL_SCALE: i64 = 6;

/// `a / b`, rounded half-up to [`DECIMAL_SCALE`] fractional digits.
pub fn half_up_div(a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
    (a / b).with_scale_round(DECIMAL_SCALE, RoundingMode::HalfUp)
}

/// Round a decimal quantity to the nearest integer, half-up, returned as an
/// `i64`. Used to convert a grid-aligned decimal offset into an array index.
pub fn half_up_round_to_i64(value: &BigDecimal) -> i64 {
    let rounded = value.with_scale_round(0, RoundingMode::HalfUp);
    rounded
        .to_string()
        .parse::<i64>()
        .expect("scale-0 BigDecimal must parse as an integer")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn half_up_div_rounds_at_sixth_digit() {
        let a = BigDecimal::from_str("1").unwrap();
        let b = BigDecimal::from_str("3").unwrap();
        assert_eq!(half_up_div(&a, &b).to_string(), "0.333333");
    }

    #[test]
    fn half_up_round_ties_away_from_zero_on_positive() {
        let v = BigDecimal::from_str("2.5").unwrap();
        assert_eq!(half_up_round_to_i64(&v), 3);
    }

    #[test]
    fn half_up_round_handles_negative() {
        let v = BigDecimal::from_str("-2.5").unwrap();
        assert_eq!(half_up_round_to_i64(&v), -3);
    }
}
