//! Injectable shaping curves
//!
//! The model keeps its two scalar mappings pluggable: the distance
//! normalization that turns a raw gather distance into a bounded proportion,
//! and the altitude curve that turns abstract level units into elevation
//! units. Both defaults are monotonic; replacements should be too.

use std::f64::consts::PI;

/// A scalar shaping function owned by the model.
pub type Curve = Box<dyn Fn(f64) -> f64 + Send + Sync>;

/// Circumference proportion of a chord distance on a sphere.
///
/// Maps a straight-line distance `d` between two surface points to the
/// fraction of the great circle their arc subtends: `asin(d / 2r) / PI`.
/// Monotonic in `d`, bounded to [0, 0.5]; distances beyond the diameter
/// (off-sphere queries) saturate at 0.5.
pub fn circum_proportion(radius: f64) -> Curve {
    Box::new(move |distance| {
        let half = (distance / (2.0 * radius)).clamp(0.0, 1.0);
        half.asin() / PI
    })
}

/// Default altitude curve: a tanh ramp from 0 toward `max_altitude`.
///
/// `levels` sets the scale; at `level == levels` the curve reaches ~76% of
/// the ceiling. Monotonic, saturating, and sign-preserving.
pub fn altitude_curve(max_altitude: f64, levels: f64) -> Curve {
    Box::new(move |level| max_altitude * (level / levels).tanh())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circum_proportion_bounds() {
        let circum = circum_proportion(1000.0);
        assert_eq!(circum(0.0), 0.0);
        assert!((circum(2000.0) - 0.5).abs() < 1e-12);
        // Beyond the diameter saturates rather than going NaN.
        assert!((circum(5000.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_circum_proportion_monotonic() {
        let circum = circum_proportion(1000.0);
        let mut prev = -1.0;
        for step in 0..=200 {
            let d = step as f64 * 10.0;
            let p = circum(d);
            assert!(p >= prev, "not monotonic at distance {}", d);
            prev = p;
        }
    }

    #[test]
    fn test_altitude_curve_monotonic_and_bounded() {
        let curve = altitude_curve(500.0, 100.0);
        assert_eq!(curve(0.0), 0.0);
        let mut prev = f64::MIN;
        for step in -50..=50 {
            let level = step as f64 * 20.0;
            let alt = curve(level);
            assert!(alt > prev, "not strictly increasing at level {}", level);
            assert!(alt.abs() <= 500.0);
            prev = alt;
        }
    }
}
