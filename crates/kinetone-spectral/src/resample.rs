//! Frame resampling for pitch shifting.
//!
//! Stretches or squeezes one time-domain frame onto an output frame of a different
//! length, optionally weighting each output sample by a synthesis window and a gain.
//! Resampling a frame of `N` samples onto `N / alpha` samples raises every frequency
//! in it by `alpha`.

use kinetone_core::{lagrange_interpolate, linear_interpolate};

/// Interpolation kernel used between input samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Interpolation {
    /// Two-point linear.
    #[default]
    Linear,
    /// Four-point Lagrange, falling back to linear at the frame edges.
    Lagrange4,
}

/// Resample `input` onto `output`.
///
/// Output sample `i` reads the input at position `i * input.len() / output.len()`,
/// then is scaled by `scalar` and, when given, by `window[i]`. Returns `false` (output
/// untouched) when either frame is empty or the window is shorter than the output.
///
/// ```rust
/// use kinetone_spectral::{Interpolation, resample_frame};
///
/// let input = [0.0, 1.0, 2.0, 3.0];
/// let mut output = [0.0; 8];
/// assert!(resample_frame(&input, &mut output, Interpolation::Linear, 1.0, None));
/// assert_eq!(output[1], 0.5);
/// assert_eq!(output[7], 3.0);
/// ```
pub fn resample_frame(
    input: &[f64],
    output: &mut [f64],
    interpolation: Interpolation,
    scalar: f64,
    window: Option<&[f64]>,
) -> bool {
    let in_len = input.len();
    let out_len = output.len();
    if in_len == 0 || out_len == 0 {
        return false;
    }
    if window.is_some_and(|w| w.len() < out_len) {
        return false;
    }

    let increment = in_len as f64 / out_len as f64;
    for (i, out) in output.iter_mut().enumerate() {
        let position = i as f64 * increment;
        let x1 = position as usize;
        let fraction = position - x1 as f64;

        let value = match interpolation {
            Interpolation::Lagrange4 if x1 >= 1 && x1 + 2 < in_len => lagrange_interpolate(
                [input[x1 - 1], input[x1], input[x1 + 1], input[x1 + 2]],
                fraction,
            ),
            _ if x1 + 1 < in_len => linear_interpolate(input[x1], input[x1 + 1], fraction),
            _ => input[x1.min(in_len - 1)],
        };

        let gain = window.map_or(scalar, |w| scalar * w[i]);
        *out = gain * value;
    }
    true
}
