//! FFT wrapper over `rustfft` with preallocated scratch.
//!
//! [`Fft`] owns forward and inverse plans for a single power-of-two length. Transforms
//! run in place with no allocation. The inverse is unnormalized; callers scale the
//! result themselves (the vocoder folds `1/N` into its window gain correction).
//!
//! [`FastFft`] adds a window and a real-input staging buffer, used where a complete
//! real frame is transformed at configuration time (impulse response spectra).

use std::sync::Arc;

use kinetone_core::DspError;
use rustfft::FftPlanner;
use rustfft::num_complex::Complex64;

use crate::window::{WindowType, make_window};

/// In-place forward/inverse complex FFT of a fixed power-of-two length.
pub struct Fft {
    forward: Arc<dyn rustfft::Fft<f64>>,
    inverse: Arc<dyn rustfft::Fft<f64>>,
    scratch: Vec<Complex64>,
    buffer: Vec<Complex64>,
    length: usize,
}

impl core::fmt::Debug for Fft {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Fft").field("length", &self.length).finish()
    }
}

impl Fft {
    /// Plan transforms of `length` points.
    ///
    /// # Errors
    ///
    /// [`DspError::InvalidLength`] unless `length` is a non-zero power of two.
    pub fn new(length: usize) -> Result<Self, DspError> {
        DspError::require_power_of_two("fft length", length)?;

        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(length);
        let inverse = planner.plan_fft_inverse(length);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        Ok(Self {
            forward,
            inverse,
            scratch: vec![Complex64::default(); scratch_len],
            buffer: vec![Complex64::default(); length],
            length,
        })
    }

    /// Transform length.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Always false; a zero-length plan cannot be built.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Forward transform in place. `buffer` must hold exactly [`Fft::len`] points.
    pub fn forward(&mut self, buffer: &mut [Complex64]) {
        debug_assert_eq!(buffer.len(), self.length);
        self.forward.process_with_scratch(buffer, &mut self.scratch);
    }

    /// Unnormalized inverse transform in place.
    pub fn inverse(&mut self, buffer: &mut [Complex64]) {
        debug_assert_eq!(buffer.len(), self.length);
        self.inverse.process_with_scratch(buffer, &mut self.scratch);
    }

    /// Transform a real frame, zero-padding short input. Input beyond the transform
    /// length is ignored.
    pub fn forward_real(&mut self, input: &[f64]) -> &[Complex64] {
        for (i, bin) in self.buffer.iter_mut().enumerate() {
            *bin = Complex64::new(input.get(i).copied().unwrap_or(0.0), 0.0);
        }
        self.forward
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
        &self.buffer
    }
}

/// Windowed real-frame FFT.
#[derive(Debug)]
pub struct FastFft {
    fft: Fft,
    window: Vec<f64>,
    window_type: WindowType,
    frame: Vec<Complex64>,
}

impl FastFft {
    /// Create a transform of `frame_length` points with `window` applied to the input.
    ///
    /// # Errors
    ///
    /// [`DspError::InvalidLength`] unless `frame_length` is a non-zero power of two.
    pub fn new(frame_length: usize, window: WindowType) -> Result<Self, DspError> {
        let fft = Fft::new(frame_length)?;
        let (window_coeffs, _) = make_window(frame_length, 0, window);
        Ok(Self {
            fft,
            window: window_coeffs,
            window_type: window,
            frame: vec![Complex64::default(); frame_length],
        })
    }

    /// Frame length.
    pub fn frame_length(&self) -> usize {
        self.fft.len()
    }

    /// Window applied before the forward transform.
    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    /// Window and transform `input`.
    ///
    /// # Errors
    ///
    /// [`DspError::LengthMismatch`] when `input` is longer than the frame. Shorter
    /// input is zero-extended.
    pub fn transform(&mut self, input: &[f64]) -> Result<&[Complex64], DspError> {
        if input.len() > self.frame.len() {
            return Err(DspError::LengthMismatch {
                expected: self.frame.len(),
                actual: input.len(),
            });
        }
        for (i, (bin, &w)) in self.frame.iter_mut().zip(&self.window).enumerate() {
            *bin = Complex64::new(input.get(i).copied().unwrap_or(0.0) * w, 0.0);
        }
        self.fft.forward(&mut self.frame);
        Ok(&self.frame)
    }

    /// Unnormalized inverse transform of `spectrum`.
    ///
    /// # Errors
    ///
    /// [`DspError::LengthMismatch`] unless `spectrum` has exactly one bin per frame
    /// sample.
    pub fn inverse_transform(&mut self, spectrum: &[Complex64]) -> Result<&[Complex64], DspError> {
        if spectrum.len() != self.frame.len() {
            return Err(DspError::LengthMismatch {
                expected: self.frame.len(),
                actual: spectrum.len(),
            });
        }
        self.frame.copy_from_slice(spectrum);
        self.fft.inverse(&mut self.frame);
        Ok(&self.frame)
    }
}
