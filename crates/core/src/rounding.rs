//! Precision-aware quantity rounding and comparison.
//!
//! Stock quantities are plain `f64`s measured against a per-product rounding
//! precision (the unit of measure's smallest representable step, e.g. `0.01`
//! for goods counted in hundredths). Two quantities are considered equal when
//! they agree after rounding to that precision, even when they are not
//! bit-identical. Exact float equality is never the right comparison for
//! ledger-derived quantities.

use std::cmp::Ordering;

/// Round `value` to the nearest multiple of `precision`, half away from zero.
///
/// Before rounding, the normalized value is nudged outward by one unit in the
/// last place to compensate for IEEE-754 representation error: `2.675 / 0.01`
/// is stored as `267.49999…`, which would otherwise round down.
///
/// `precision` must be positive; product records validate this on
/// construction.
pub fn round(value: f64, precision: f64) -> f64 {
    debug_assert!(precision > 0.0, "rounding precision must be positive");
    if value == 0.0 {
        return 0.0;
    }

    let normalized = value / precision;
    // One ulp of the normalized magnitude.
    let epsilon = normalized.abs() * f64::EPSILON;
    let nudged = normalized + normalized.signum() * epsilon;
    nudged.round() * precision
}

/// Whether `value` rounds to zero at the given precision.
pub fn is_zero(value: f64, precision: f64) -> bool {
    round(value, precision).abs() < precision
}

/// Compare two quantities at the given precision.
///
/// Returns `Ordering::Equal` when the rounded values differ by less than the
/// precision itself, otherwise the sign of the (rounded) difference.
pub fn compare(a: f64, b: f64, precision: f64) -> Ordering {
    let delta = round(a, precision) - round(b, precision);
    if is_zero(delta, precision) {
        Ordering::Equal
    } else if delta < 0.0 {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn rounds_to_the_precision_step() {
        assert_close(round(1.234, 0.01), 1.23);
        assert_close(round(1.236, 0.01), 1.24);
        assert_close(round(17.0, 1.0), 17.0);
        assert_close(round(0.0, 0.01), 0.0);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_close(round(2.5, 1.0), 3.0);
        assert_close(round(-2.5, 1.0), -3.0);
        assert_close(round(0.125, 0.05), 0.15);
    }

    #[test]
    fn compensates_for_representation_error() {
        // 2.675 / 0.01 is stored as 267.49999…; the nudge keeps it half-up.
        assert_close(round(2.675, 0.01), 2.68);
        assert_close(round(-2.675, 0.01), -2.68);
    }

    #[test]
    fn detects_zero_within_precision() {
        assert!(is_zero(0.0, 0.01));
        assert!(is_zero(0.004, 0.01));
        assert!(is_zero(-0.004, 0.01));
        assert!(!is_zero(0.006, 0.01));
        assert!(!is_zero(0.004, 0.001));
    }

    #[test]
    fn equal_within_uom_rounding() {
        // A thousandth of a unit is invisible at a hundredth-precision UoM…
        assert_eq!(compare(10.001, 10.000, 0.01), Ordering::Equal);
        // …but very visible at a ten-thousandth-precision one.
        assert_eq!(compare(10.001, 10.000, 0.0001), Ordering::Greater);
        assert_eq!(compare(10.000, 10.001, 0.0001), Ordering::Less);
    }

    #[test]
    fn compares_signed_differences() {
        assert_eq!(compare(9.98, 10.0, 0.01), Ordering::Less);
        assert_eq!(compare(10.02, 10.0, 0.01), Ordering::Greater);
        assert_eq!(compare(-3.0, 3.0, 0.01), Ordering::Less);
        assert_eq!(compare(0.0, 0.0, 0.01), Ordering::Equal);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: rounding is idempotent — a rounded value is its own
        /// rounding at the same precision.
        #[test]
        fn rounding_is_idempotent(
            value in -1_000_000.0f64..1_000_000.0,
            precision in prop::sample::select(vec![1.0, 0.1, 0.01, 0.001])
        ) {
            let once = round(value, precision);
            let twice = round(once, precision);
            prop_assert_eq!(once, twice);
        }

        /// Property: comparison is reflexive and antisymmetric at any
        /// precision.
        #[test]
        fn comparison_is_consistent(
            a in -1_000_000.0f64..1_000_000.0,
            b in -1_000_000.0f64..1_000_000.0,
            precision in prop::sample::select(vec![1.0, 0.1, 0.01, 0.001])
        ) {
            prop_assert_eq!(compare(a, a, precision), Ordering::Equal);
            prop_assert_eq!(compare(a, b, precision), compare(b, a, precision).reverse());
        }

        /// Property: values on the precision grid compare exactly like the
        /// integers that index them.
        #[test]
        fn grid_values_compare_like_integers(
            k in -100_000i64..100_000,
            m in -100_000i64..100_000,
            precision in prop::sample::select(vec![1.0, 0.1, 0.01, 0.001])
        ) {
            let a = k as f64 * precision;
            let b = m as f64 * precision;
            prop_assert_eq!(compare(a, b, precision), k.cmp(&m));
        }
    }
}
