//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Limit a value to the range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    value.max(min).min(max)
}

/// Arcsine of a ratio which may drift just outside of [-1, 1] through rounding.
pub fn safe_asin<T>(ratio: T) -> T
where
    T: Float,
{
    clamp(ratio, -T::one(), T::one()).asin()
}

/// Wrap an angle into (-180, 180].
///
/// Units: degrees
pub fn wrap_deg(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    if a > 180.0 {
        a - 360.0
    } else {
        a
    }
}

/// The angle one or more whole turns away from `angle` which lies closest to `reference`.
///
/// Units: radians
pub fn nearest_turn(angle: f64, reference: f64) -> f64 {
    let turn = 2.0 * std::f64::consts::PI;
    angle + turn * ((reference - angle) / turn).round()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(1.5f64, -1.0, 1.0), 1.0);
        assert_eq!(clamp(-3f64, -1.0, 1.0), -1.0);
        assert_eq!(clamp(0.25f32, -1.0, 1.0), 0.25);
    }

    #[test]
    fn test_safe_asin() {
        assert_eq!(safe_asin(1.0000000001f64), std::f64::consts::FRAC_PI_2);
        assert_eq!(safe_asin(-2f64), -std::f64::consts::FRAC_PI_2);
        assert!((safe_asin(0.5f64) - 0.5f64.asin()).abs() < 1e-15);
    }

    #[test]
    fn test_wrap_deg() {
        assert_eq!(wrap_deg(0.2), 0.2);
        assert_eq!(wrap_deg(180.0), 180.0);
        assert_eq!(wrap_deg(-180.0), 180.0);
        assert!((wrap_deg(-359.8) - 0.2).abs() < 1e-9);
        assert!((wrap_deg(190.0) - -170.0).abs() < 1e-9);
    }

    #[test]
    fn test_nearest_turn() {
        let pi = std::f64::consts::PI;
        assert_eq!(nearest_turn(0.5, 0.4), 0.5);
        assert!((nearest_turn(-0.9 * pi, 0.95 * pi) - 1.1 * pi).abs() < 1e-12);
        assert!((nearest_turn(0.1, 4.0 * pi) - (0.1 + 4.0 * pi)).abs() < 1e-12);
    }
}
