use bigdecimal::BigDecimal;
use num_bigint::BigInt;

/// Rounds to two decimal places, ties away from zero. Implemented on the
/// raw mantissa because `BigDecimal`'s own rounding resolves ties to even.
pub fn round2(value: &BigDecimal) -> BigDecimal {
    let (mantissa, scale) = value.as_bigint_and_exponent();
    if scale <= 2 {
        // Fewer than two fractional digits: padding only, nothing to round.
        return value.with_scale(2);
    }

    let mut divisor = BigInt::from(1);
    for _ in 2..scale {
        divisor = divisor * BigInt::from(10);
    }

    let mut cents = &mantissa / &divisor;
    let remainder = &mantissa % &divisor;
    let distance = if remainder < BigInt::from(0) {
        -remainder
    } else {
        remainder
    };

    if &distance + &distance >= divisor {
        cents += if mantissa < BigInt::from(0) {
            BigInt::from(-1)
        } else {
            BigInt::from(1)
        };
    }

    BigDecimal::new(cents, 2)
}

/// Canonical two-decimal string form, e.g. "120.50".
pub fn to_fixed2(value: &BigDecimal) -> String {
    round2(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn pads_short_scales() {
        assert_eq!(round2(&dec("120")).to_string(), "120.00");
        assert_eq!(round2(&dec("120.5")).to_string(), "120.50");
        assert_eq!(round2(&dec("119.00")).to_string(), "119.00");
    }

    #[test]
    fn rounds_half_up() {
        assert_eq!(round2(&dec("119.005")).to_string(), "119.01");
        assert_eq!(round2(&dec("119.004")).to_string(), "119.00");
        assert_eq!(round2(&dec("119.0049999")).to_string(), "119.00");
        assert_eq!(round2(&dec("0.995")).to_string(), "1.00");
    }

    #[test]
    fn rounds_negative_ties_away_from_zero() {
        assert_eq!(round2(&dec("-1.005")).to_string(), "-1.01");
        assert_eq!(round2(&dec("-1.004")).to_string(), "-1.00");
        assert_eq!(round2(&dec("-98.50")).to_string(), "-98.50");
    }

    #[test]
    fn formats_fixed_two_decimals() {
        assert_eq!(to_fixed2(&dec("10")), "10.00");
        assert_eq!(to_fixed2(&dec("10.0")), "10.00");
        assert_eq!(to_fixed2(&dec("120.50")), "120.50");
        assert_eq!(to_fixed2(&dec("-120.5")), "-120.50");
    }
}
