//! Mathematical utility functions for DSP.
//!
//! All functions are allocation-free and suitable for `no_std`.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//!
//! # Numerical Hygiene
//!
//! - [`flush_underflow`] - Zero out values below the smallest normal `f32`
//! - [`principal_arg`] - Wrap a phase into \[-π, π\]
//!
//! # Interpolation
//!
//! - [`linear_interpolate`] - Two-point interpolation with the delay-line boundary rule
//! - [`lagrange_interpolate`] - Four-point Lagrange interpolation
//!
//! # Modulation Mapping
//!
//! | Function | Input | Output |
//! |----------|-------|--------|
//! | [`bipolar_to_unipolar`] | \[-1, 1\] | \[0, 1\] |
//! | [`unipolar_to_bipolar`] | \[0, 1\] | \[-1, 1\] |
//! | [`bipolar_modulation`] | \[-1, 1\] | \[min, max\], centred |
//! | [`unipolar_modulation_from_min`] | \[0, 1\] | \[min, max\], from min |

use core::f64::consts::{LN_10, PI, TAU};
use libm::{exp, floor, log};

/// Smallest positive normal single-precision value.
///
/// Feedback state that decays below this magnitude is forced to zero.
pub const SMALLEST_POSITIVE_NORMAL: f64 = 1.175_494_351e-38;

/// Floor returned by dB conversions of silent signals.
pub const MIN_DB: f64 = -96.0;

/// Highest cutoff any modulated filter is allowed to reach.
pub const MAX_FILTER_FREQUENCY: f64 = 20480.0;

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use kinetone_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 1e-12);
/// assert!((db_to_linear(-6.0206) - 0.5).abs() < 1e-4);
/// ```
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    exp(db * LN_10 / 20.0)
}

/// Convert linear gain to decibels, floored at [`MIN_DB`].
///
/// # Example
/// ```rust
/// use kinetone_core::linear_to_db;
///
/// assert!(linear_to_db(1.0).abs() < 1e-12);
/// assert_eq!(linear_to_db(0.0), -96.0);
/// ```
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        return MIN_DB;
    }
    (20.0 * log(linear) / LN_10).max(MIN_DB)
}

/// Flush values in the subnormal-risk range to zero.
///
/// Any value with `0 < |x| < 1.175494351e-38` becomes exactly `0.0`. Applied after
/// every recursive computation whose state feeds back into itself.
///
/// # Example
/// ```rust
/// use kinetone_core::flush_underflow;
///
/// assert_eq!(flush_underflow(1e-40), 0.0);
/// assert_eq!(flush_underflow(-1e-40), 0.0);
/// assert_eq!(flush_underflow(0.25), 0.25);
/// ```
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_underflow(x: f64) -> f64 {
    if x != 0.0 && x.abs() < SMALLEST_POSITIVE_NORMAL {
        0.0
    } else {
        x
    }
}

/// Wrap a phase value into the range \[-π, π\].
///
/// # Example
/// ```rust
/// use kinetone_core::principal_arg;
/// use core::f64::consts::PI;
///
/// assert!((principal_arg(3.0 * PI).abs() - PI).abs() < 1e-9);
/// assert!((principal_arg(0.5) - 0.5).abs() < 1e-12);
/// assert!((principal_arg(-0.5) + 0.5).abs() < 1e-12);
/// ```
#[inline]
pub fn principal_arg(phase: f64) -> f64 {
    if phase >= 0.0 {
        (phase + PI) % TAU - PI
    } else {
        (phase - PI) % -TAU + PI
    }
}

/// Linear interpolation between `y1` (at 0) and `y2` (at 1).
///
/// A fraction of exactly 1.0 or more returns `y2` unmodified, so a read that lands on
/// the older neighbour returns it bit-exact.
#[inline]
pub fn linear_interpolate(y1: f64, y2: f64, fraction: f64) -> f64 {
    if fraction >= 1.0 {
        return y2;
    }
    fraction * y2 + (1.0 - fraction) * y1
}

/// Four-point Lagrange interpolation.
///
/// `y` holds samples at positions -1, 0, 1 and 2; `x` is the fractional position in
/// \[0, 1) between `y[1]` and `y[2]`.
#[inline]
pub fn lagrange_interpolate(y: [f64; 4], x: f64) -> f64 {
    let xm1 = x + 1.0;
    let x1 = x - 1.0;
    let x2 = x - 2.0;

    -y[0] * x * x1 * x2 / 6.0 + y[1] * xm1 * x1 * x2 / 2.0 - y[2] * xm1 * x * x2 / 2.0
        + y[3] * xm1 * x * x1 / 6.0
}

/// Map a bipolar value in \[-1, 1\] onto \[0, 1\].
#[inline]
pub fn bipolar_to_unipolar(value: f64) -> f64 {
    0.5 * value + 0.5
}

/// Map a unipolar value in \[0, 1\] onto \[-1, 1\].
#[inline]
pub fn unipolar_to_bipolar(value: f64) -> f64 {
    2.0 * value - 1.0
}

/// Sweep `[min, max]` around its midpoint with a bipolar modulator.
///
/// The modulator is clamped to \[-1, 1\] first.
#[inline]
pub fn bipolar_modulation(modulator: f64, min: f64, max: f64) -> f64 {
    let modulator = modulator.clamp(-1.0, 1.0);
    let half_range = (max - min) / 2.0;
    let midpoint = half_range + min;
    modulator * half_range + midpoint
}

/// Sweep `[min, max]` upward from `min` with a unipolar modulator.
///
/// The modulator is clamped to \[0, 1\] first.
#[inline]
pub fn unipolar_modulation_from_min(modulator: f64, min: f64, max: f64) -> f64 {
    let modulator = modulator.clamp(0.0, 1.0);
    modulator * (max - min) + min
}

/// Convert milliseconds to samples at the given sample rate.
#[inline]
pub fn ms_to_samples(ms: f64, sample_rate: f64) -> f64 {
    ms * sample_rate / 1000.0
}

/// Round a length up to the next power of two (minimum 1).
#[inline]
pub fn next_power_of_two(length: usize) -> usize {
    length.max(1).next_power_of_two()
}

/// Split a non-negative value into its integer and fractional parts.
#[inline]
pub(crate) fn split_fraction(value: f64) -> (usize, f64) {
    let whole = floor(value);
    (whole as usize, value - whole)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_roundtrip() {
        for db in [-60.0, -12.0, -3.0, 0.0, 6.0, 12.0] {
            let back = linear_to_db(db_to_linear(db));
            assert!((back - db).abs() < 1e-9, "{db} dB came back as {back}");
        }
    }

    #[test]
    fn test_linear_to_db_floor() {
        assert_eq!(linear_to_db(0.0), MIN_DB);
        assert_eq!(linear_to_db(-1.0), MIN_DB);
        assert_eq!(linear_to_db(1e-12), MIN_DB);
    }

    #[test]
    fn test_flush_underflow() {
        assert_eq!(flush_underflow(1.0), 1.0);
        assert_eq!(flush_underflow(-0.5), -0.5);
        assert_eq!(flush_underflow(1e-30), 1e-30);
        assert_eq!(flush_underflow(1e-39), 0.0);
        assert_eq!(flush_underflow(-1e-39), 0.0);
        assert_eq!(flush_underflow(0.0), 0.0);
    }

    #[test]
    fn test_principal_arg_range() {
        let mut phase = -20.0;
        while phase < 20.0 {
            let wrapped = principal_arg(phase);
            assert!((-PI..=PI).contains(&wrapped), "{phase} wrapped to {wrapped}");
            let turns = (phase - wrapped) / TAU;
            assert!((turns - turns.round()).abs() < 1e-9);
            phase += 0.37;
        }
    }

    #[test]
    fn test_linear_interpolate_boundary() {
        assert_eq!(linear_interpolate(1.0, 3.0, 0.0), 1.0);
        assert_eq!(linear_interpolate(1.0, 3.0, 0.5), 2.0);
        assert_eq!(linear_interpolate(1.0, 3.0, 1.0), 3.0);
    }

    #[test]
    fn test_lagrange_exact_on_cubic() {
        let f = |x: f64| 0.5 * x * x * x - x * x + 2.0 * x - 1.0;
        let y = [f(-1.0), f(0.0), f(1.0), f(2.0)];
        for x in [0.0, 0.25, 0.5, 0.9] {
            assert!((lagrange_interpolate(y, x) - f(x)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_modulation_mapping() {
        assert_eq!(bipolar_modulation(-1.0, 100.0, 200.0), 100.0);
        assert_eq!(bipolar_modulation(0.0, 100.0, 200.0), 150.0);
        assert_eq!(bipolar_modulation(5.0, 100.0, 200.0), 200.0);
        assert_eq!(unipolar_modulation_from_min(0.0, 10.0, 20.0), 10.0);
        assert_eq!(unipolar_modulation_from_min(0.5, 10.0, 20.0), 15.0);
        assert_eq!(bipolar_to_unipolar(unipolar_to_bipolar(0.3)), 0.3);
    }

    #[test]
    fn test_next_power_of_two() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(2401), 4096);
        assert_eq!(next_power_of_two(4096), 4096);
    }
}
