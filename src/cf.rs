//! Certainty-factor algebra.
//!
//! A certainty factor (CF) is a signed confidence in `[-1, 1]`: `+1` is
//! certainly true, `-1` certainly false, `0` unknown. Independent evidence for
//! the same proposition is combined with [`cf_or`], conjunctions with
//! [`cf_and`].

/// Certainly true.
pub const TRUE: f64 = 1.0;
/// Certainly false.
pub const FALSE: f64 = -1.0;
/// No evidence either way.
pub const UNKNOWN: f64 = 0.0;
/// A CF above this counts as true; below `CUTOFF - 1` as false.
pub const CUTOFF: f64 = 0.2;

/// Combine two independent pieces of evidence about the same proposition.
///
/// Both positive: `a + b - ab`. Both negative: `a + b + ab`. Mixed (or zero)
/// signs: `(a + b) / (1 - min(|a|, |b|))`. The mixed branch is singular when
/// one side is certainly true and the other certainly false; that total
/// contradiction yields [`UNKNOWN`]. Rounding at the edges is clamped back
/// into range.
pub fn cf_or(a: f64, b: f64) -> f64 {
    if a > 0.0 && b > 0.0 {
        return a + b - a * b;
    }
    if a < 0.0 && b < 0.0 {
        return a + b + a * b;
    }
    let denominator = 1.0 - a.abs().min(b.abs());
    if denominator <= f64::EPSILON {
        return UNKNOWN;
    }
    clamp((a + b) / denominator)
}

/// A conjunction is only as strong as its weakest condition.
pub fn cf_and(a: f64, b: f64) -> f64 {
    a.min(b)
}

/// Whether `x` is a legal certainty factor.
pub fn is_valid(x: f64) -> bool {
    (FALSE..=TRUE).contains(&x)
}

/// Whether `x` is strong enough to be treated as true.
pub fn is_true(x: f64) -> bool {
    is_valid(x) && x > CUTOFF
}

/// Whether `x` is strong enough to be treated as false.
pub fn is_false(x: f64) -> bool {
    is_valid(x) && x < CUTOFF - 1.0
}

/// Force `x` into `[-1, 1]`.
pub fn clamp(x: f64) -> f64 {
    x.clamp(FALSE, TRUE)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [f64; 9] = [-1.0, -0.9, -0.5, -0.1, 0.0, 0.1, 0.5, 0.9, 1.0];

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn or_both_positive() {
        // 0.6 + 0.5 - 0.3
        assert!(close(cf_or(0.6, 0.5), 0.8));
    }

    #[test]
    fn or_both_negative() {
        // -0.6 - 0.5 + 0.3
        assert!(close(cf_or(-0.6, -0.5), -0.8));
    }

    #[test]
    fn or_mixed_signs() {
        // (0.8 - 0.4) / (1 - 0.4)
        assert!(close(cf_or(0.8, -0.4), 0.4 / 0.6));
    }

    #[test]
    fn or_total_contradiction_is_unknown() {
        assert_eq!(cf_or(1.0, -1.0), UNKNOWN);
        assert_eq!(cf_or(-1.0, 1.0), UNKNOWN);
    }

    #[test]
    fn or_is_commutative() {
        for &a in &SAMPLES {
            for &b in &SAMPLES {
                assert!(close(cf_or(a, b), cf_or(b, a)), "cf_or({a}, {b})");
            }
        }
    }

    #[test]
    fn or_with_unknown_is_identity() {
        for &a in &SAMPLES {
            assert!(close(cf_or(a, UNKNOWN), a), "cf_or({a}, 0)");
        }
    }

    #[test]
    fn or_stays_in_range() {
        for &a in &SAMPLES {
            for &b in &SAMPLES {
                assert!(is_valid(cf_or(a, b)), "cf_or({a}, {b}) = {}", cf_or(a, b));
            }
        }
    }

    #[test]
    fn and_is_min() {
        assert_eq!(cf_and(0.3, 0.7), 0.3);
        assert_eq!(cf_and(-0.2, 0.9), -0.2);
        assert_eq!(cf_and(TRUE, 0.5), 0.5);
    }

    #[test]
    fn thresholds() {
        assert!(is_true(0.21));
        assert!(!is_true(0.2));
        assert!(!is_true(1.5));
        assert!(is_false(-0.81));
        assert!(!is_false(-0.8));
        assert!(!is_false(-1.5));
        assert!(!is_true(UNKNOWN) && !is_false(UNKNOWN));
    }
}
