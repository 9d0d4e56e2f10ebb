//! Analysis windows with overlap-add gain correction.
//!
//! All windows are periodic (`cos(2*pi*n/N)`), so a Hann window at 75% overlap sums to
//! a constant and the vocoder reconstructs its input exactly.

use std::f64::consts::TAU;

/// Window applied to each analysis frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindowType {
    /// All ones, with overlap gain correction.
    Rectangular,
    /// Raised cosine.
    #[default]
    Hann,
    /// Hamming window.
    Hamming,
    /// Four-term Blackman-Harris (better sidelobe suppression).
    BlackmanHarris,
    /// All ones, corrected by the frame length only. Used for fast convolution where
    /// frames do not overlap.
    None,
}

impl WindowType {
    /// Window value at `n` of a periodic window of `length`.
    pub fn value(self, n: usize, length: usize) -> f64 {
        let x = TAU * n as f64 / length as f64;
        match self {
            Self::Rectangular | Self::None => 1.0,
            Self::Hann => 0.5 * (1.0 - x.cos()),
            Self::Hamming => 0.54 - 0.46 * x.cos(),
            Self::BlackmanHarris => {
                0.35875 - 0.48829 * x.cos() + 0.14128 * (2.0 * x).cos()
                    - 0.01168 * (3.0 * x).cos()
            }
        }
    }

    /// Stable lower-case name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rectangular => "rectangular",
            Self::Hann => "hann",
            Self::Hamming => "hamming",
            Self::BlackmanHarris => "blackman_harris",
            Self::None => "none",
        }
    }
}

/// Overlap fraction for a frame of `length` advanced by `hop_size`.
///
/// A hop of zero is treated as no overlap.
pub fn overlap(length: usize, hop_size: usize) -> f64 {
    if hop_size == 0 || length == 0 {
        0.0
    } else {
        1.0 - hop_size as f64 / length as f64
    }
}

/// Build a window and its overlap-add gain correction.
///
/// The correction is `(1 - overlap) / sum(w)` for windowed types and `1 / sum(w)` for
/// [`WindowType::None`]. Multiplying an unnormalized inverse FFT by it restores unity
/// gain after overlap-add.
///
/// ```rust
/// use kinetone_spectral::{WindowType, make_window};
///
/// let (w, correction) = make_window(1024, 256, WindowType::Hann);
/// assert_eq!(w.len(), 1024);
/// assert!((correction - 1.0 / 2048.0).abs() < 1e-12);
/// ```
pub fn make_window(length: usize, hop_size: usize, window: WindowType) -> (Vec<f64>, f64) {
    let coefficients: Vec<f64> = (0..length).map(|n| window.value(n, length)).collect();
    let sum: f64 = coefficients.iter().sum();
    if sum <= 0.0 {
        return (coefficients, 0.0);
    }

    let correction = match window {
        WindowType::None => 1.0 / sum,
        _ => (1.0 - overlap(length, hop_size)) / sum,
    };
    (coefficients, correction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_periodic() {
        let (w, _) = make_window(8, 2, WindowType::Hann);
        assert_eq!(w[0], 0.0);
        assert!((w[4] - 1.0).abs() < 1e-12);
        // Periodic: w[1] == w[7]
        assert!((w[1] - w[7]).abs() < 1e-12);
    }

    #[test]
    fn test_hann_overlap_sums_to_constant() {
        let n = 64;
        let hop = 16;
        let (w, correction) = make_window(n, hop, WindowType::Hann);
        for i in 0..hop {
            let sum: f64 = (0..n / hop).map(|k| w[i + k * hop]).sum();
            // unnormalized IFFT scales by N; N * sum * correction must be 1
            assert!(
                (n as f64 * sum * correction - 1.0).abs() < 1e-12,
                "offset {i}: {sum}"
            );
        }
    }

    #[test]
    fn test_none_window_correction() {
        let (w, correction) = make_window(512, 256, WindowType::None);
        assert!(w.iter().all(|&x| x == 1.0));
        assert!((correction - 1.0 / 512.0).abs() < 1e-15);
    }

    #[test]
    fn test_rectangular_uses_overlap() {
        let (_, correction) = make_window(512, 256, WindowType::Rectangular);
        assert!((correction - 0.5 / 512.0).abs() < 1e-15);
    }

    #[test]
    fn test_zero_hop_is_no_overlap() {
        assert_eq!(overlap(1024, 0), 0.0);
        assert_eq!(overlap(1024, 256), 0.75);
    }

    #[test]
    fn test_blackman_harris_edges() {
        let w = WindowType::BlackmanHarris;
        assert!(w.value(0, 1024) < 1e-4);
        assert!((w.value(512, 1024) - 1.0).abs() < 1e-4);
    }
}
