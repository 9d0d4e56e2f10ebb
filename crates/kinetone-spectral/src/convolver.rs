//! Overlap-add block convolution.
//!
//! A [`FastConvolver`] with impulse length `L` runs a [`PhaseVocoder`] of `2L` points
//! in overlap-add-only mode with no window. Every `L` input samples the block is
//! zero-extended to `2L`, transformed, multiplied bin by bin with the cached impulse
//! spectrum and overlap-added, which is linear convolution with `L` samples of
//! inherent delay.
//!
//! ```rust
//! use kinetone_spectral::FastConvolver;
//!
//! let mut convolver = FastConvolver::new(64).unwrap();
//! let mut ir = vec![0.0; 64];
//! ir[0] = 1.0;
//! convolver.set_impulse_response(&ir).unwrap();
//!
//! let output: Vec<f64> = (0..256).map(|n| convolver.process(n as f64)).collect();
//! assert!((output[64 + 10] - 10.0).abs() < 1e-9);
//! ```

use kinetone_core::DspError;
use rustfft::num_complex::Complex64;

use crate::fft::FastFft;
use crate::vocoder::PhaseVocoder;
use crate::window::WindowType;

/// FFT convolution of a stream with a fixed impulse response.
#[derive(Debug)]
pub struct FastConvolver {
    vocoder: PhaseVocoder,
    ir_fft: FastFft,
    ir_spectrum: Vec<Complex64>,
    ir_length: usize,
    input_count: usize,
}

impl FastConvolver {
    /// Create a convolver for impulse responses of up to `ir_length` samples.
    ///
    /// The impulse starts as silence; call [`FastConvolver::set_impulse_response`].
    ///
    /// # Errors
    ///
    /// [`DspError::InvalidLength`] unless `ir_length` is a non-zero power of two.
    pub fn new(ir_length: usize) -> Result<Self, DspError> {
        DspError::require_power_of_two("impulse response length", ir_length)?;
        let frame_length = ir_length * 2;
        let mut vocoder = PhaseVocoder::new(frame_length, ir_length, WindowType::None)?;
        vocoder.set_overlap_add_only(true);

        Ok(Self {
            vocoder,
            ir_fft: FastFft::new(frame_length, WindowType::None)?,
            ir_spectrum: vec![Complex64::default(); frame_length],
            ir_length,
            input_count: 0,
        })
    }

    /// Resize for a new impulse length, clearing the impulse and all state. A no-op
    /// when the length is unchanged.
    ///
    /// # Errors
    ///
    /// [`DspError::InvalidLength`] unless `ir_length` is a non-zero power of two.
    pub fn initialize(&mut self, ir_length: usize) -> Result<(), DspError> {
        if ir_length == self.ir_length {
            return Ok(());
        }
        *self = Self::new(ir_length)?;
        Ok(())
    }

    /// Clear the signal path, keeping the impulse.
    pub fn reset(&mut self) {
        self.vocoder.reset();
        self.input_count = 0;
    }

    /// Impulse response capacity in samples.
    pub fn ir_length(&self) -> usize {
        self.ir_length
    }

    /// Group delay added on top of the impulse response itself.
    pub fn latency_samples(&self) -> usize {
        self.ir_length
    }

    /// Load an impulse response, zero-extended to the transform length.
    ///
    /// # Errors
    ///
    /// [`DspError::LengthMismatch`] when `ir` is longer than [`FastConvolver::ir_length`].
    pub fn set_impulse_response(&mut self, ir: &[f64]) -> Result<(), DspError> {
        if ir.len() > self.ir_length {
            return Err(DspError::LengthMismatch {
                expected: self.ir_length,
                actual: ir.len(),
            });
        }
        let spectrum = self.ir_fft.transform(ir)?;
        self.ir_spectrum.copy_from_slice(spectrum);
        Ok(())
    }

    /// Convolve one sample.
    pub fn process(&mut self, input: f64) -> f64 {
        if self.input_count == self.ir_length {
            if let Some(mut frame) = self.vocoder.add_zero_pad(self.ir_length) {
                for (bin, filter) in frame.spectrum_mut().iter_mut().zip(&self.ir_spectrum) {
                    *bin *= *filter;
                }
                frame.synthesize();
            }
            self.input_count = 0;
        }

        let (output, _) = self.vocoder.process_sample(input);
        self.input_count += 1;
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_lengths() {
        assert!(FastConvolver::new(100).is_err());
        let mut convolver = FastConvolver::new(16).unwrap();
        assert!(matches!(
            convolver.set_impulse_response(&[0.0; 17]),
            Err(DspError::LengthMismatch {
                expected: 16,
                actual: 17
            })
        ));
    }

    #[test]
    fn test_short_ir_matches_direct_convolution() {
        let ir = [0.5, -0.25, 0.125];
        let mut convolver = FastConvolver::new(8).unwrap();
        convolver.set_impulse_response(&ir).unwrap();

        let input: Vec<f64> = (0..64).map(|n| ((n * 7) % 5) as f64 - 2.0).collect();
        let output: Vec<f64> = input.iter().map(|&x| convolver.process(x)).collect();

        for n in 8..64 {
            let expected: f64 = ir
                .iter()
                .enumerate()
                .filter(|&(k, _)| n - 8 >= k)
                .map(|(k, &h)| h * input[n - 8 - k])
                .sum();
            assert!(
                (output[n] - expected).abs() < 1e-9,
                "n={n}: {} vs {expected}",
                output[n]
            );
        }
    }

    #[test]
    fn test_initialize_same_length_keeps_ir() {
        let mut convolver = FastConvolver::new(8).unwrap();
        convolver.set_impulse_response(&[1.0]).unwrap();
        convolver.initialize(8).unwrap();
        assert!((convolver.ir_spectrum[3].re - 1.0).abs() < 1e-12);
        convolver.initialize(16).unwrap();
        assert_eq!(convolver.ir_length(), 16);
        assert_eq!(convolver.ir_spectrum[3].norm(), 0.0);
    }
}
