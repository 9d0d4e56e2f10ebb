//! Short-time Fourier analysis/resynthesis engine.
//!
//! [`PhaseVocoder`] keeps a circular input ring of one frame and a circular output ring
//! of four frames. Every `hop_size` samples (once the first full frame has arrived) it
//! windows the newest frame and runs the forward FFT. The caller then receives a
//! [`PendingFrame`] through which the spectrum can be edited before synthesis:
//!
//! ```text
//!  process_sample(x) ──► Accumulating ──(counter == N)──► AwaitingInverseFft
//!                                                             │ inverse_fft()
//!                                                             ▼
//!                            Accumulating ◄── synthesize ── AwaitingOverlapAdd
//! ```
//!
//! Synthesis adds `correction * re(ifft)` into the output ring starting at the next
//! sample to be read, so a frame completed at input sample `n` begins playing at
//! sample `n + 1` and the end-to-end latency is exactly one frame.
//!
//! Dropping a [`PendingFrame`] without consuming it synthesizes the unmodified frame,
//! so output is never silently lost.
//!
//! # Example
//!
//! ```rust
//! use kinetone_spectral::{PhaseVocoder, WindowType};
//!
//! let mut vocoder = PhaseVocoder::new(1024, 256, WindowType::Hann).unwrap();
//! for n in 0..4096 {
//!     let x = (n as f64 * 0.05).sin();
//!     let (_y, frame) = vocoder.process_sample(x);
//!     if let Some(mut frame) = frame {
//!         // Kill everything above bin 64, then resynthesize
//!         for (k, bin) in frame.spectrum_mut().iter_mut().enumerate() {
//!             if k > 64 && k < 1024 - 64 {
//!                 *bin = Default::default();
//!             }
//!         }
//!         frame.synthesize();
//!     }
//! }
//! ```

use kinetone_core::DspError;
use rustfft::num_complex::Complex64;

use crate::fft::Fft;
use crate::window::{WindowType, make_window, overlap};

/// Output ring length as a multiple of the frame length.
const OUTPUT_RING_FRAMES: usize = 4;

/// Where the vocoder is in its analysis/synthesis cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrameState {
    /// Collecting input; no frame outstanding.
    #[default]
    Accumulating,
    /// A forward FFT fired; the spectrum may be edited.
    AwaitingInverseFft,
    /// The inverse FFT ran; the frame waits to be overlap-added.
    AwaitingOverlapAdd,
}

/// STFT engine with an explicit synthesis step.
#[derive(Debug)]
pub struct PhaseVocoder {
    frame_length: usize,
    hop_size: usize,
    window_type: WindowType,
    window: Vec<f64>,
    window_hop_correction: f64,
    overlap: f64,
    overlap_add_only: bool,

    fft: Fft,
    spectrum: Vec<Complex64>,
    ifft_frame: Vec<Complex64>,

    input_buffer: Vec<f64>,
    output_buffer: Vec<f64>,
    input_write_index: usize,
    input_read_index: usize,
    output_read_index: usize,
    frame_sample_counter: usize,
    state: FrameState,
}

impl PhaseVocoder {
    /// Create a vocoder with `frame_length` (power of two) frames advanced by
    /// `hop_size` samples.
    ///
    /// # Errors
    ///
    /// [`DspError::InvalidLength`] for a bad frame length, [`DspError::InvalidParameter`]
    /// for a hop of zero or longer than the frame.
    pub fn new(frame_length: usize, hop_size: usize, window: WindowType) -> Result<Self, DspError> {
        Self::validate(frame_length, hop_size)?;
        let mut vocoder = Self {
            frame_length,
            hop_size,
            window_type: window,
            window: Vec::new(),
            window_hop_correction: 0.0,
            overlap: 0.0,
            overlap_add_only: false,
            fft: Fft::new(frame_length)?,
            spectrum: Vec::new(),
            ifft_frame: Vec::new(),
            input_buffer: Vec::new(),
            output_buffer: Vec::new(),
            input_write_index: 0,
            input_read_index: 0,
            output_read_index: 0,
            frame_sample_counter: 0,
            state: FrameState::Accumulating,
        };
        vocoder.allocate();
        Ok(vocoder)
    }

    /// Reconfigure, reallocating every buffer and clearing all state.
    ///
    /// # Errors
    ///
    /// Same conditions as [`PhaseVocoder::new`]; on error the vocoder is unchanged.
    pub fn initialize(
        &mut self,
        frame_length: usize,
        hop_size: usize,
        window: WindowType,
    ) -> Result<(), DspError> {
        Self::validate(frame_length, hop_size)?;
        if frame_length != self.frame_length {
            self.fft = Fft::new(frame_length)?;
        }
        self.frame_length = frame_length;
        self.hop_size = hop_size;
        self.window_type = window;
        self.allocate();
        Ok(())
    }

    fn validate(frame_length: usize, hop_size: usize) -> Result<(), DspError> {
        DspError::require_power_of_two("vocoder frame length", frame_length)?;
        if hop_size == 0 || hop_size > frame_length {
            return Err(DspError::invalid_parameter(
                "hop_size",
                hop_size as f64,
                "must be between 1 and the frame length",
            ));
        }
        Ok(())
    }

    fn allocate(&mut self) {
        let n = self.frame_length;
        let (window, correction) = make_window(n, self.hop_size, self.window_type);
        self.window = window;
        self.window_hop_correction = correction;
        self.overlap = overlap(n, self.hop_size);
        self.spectrum = vec![Complex64::default(); n];
        self.ifft_frame = vec![Complex64::default(); n];
        self.input_buffer = vec![0.0; n];
        self.output_buffer = vec![0.0; n * OUTPUT_RING_FRAMES];
        self.reset();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            frame_length = n,
            hop_size = self.hop_size,
            window = self.window_type.name(),
            overlap_add_only = self.overlap_add_only,
            "phase vocoder initialized"
        );
    }

    /// Clear buffers and indices without reallocating.
    pub fn reset(&mut self) {
        self.input_buffer.fill(0.0);
        self.output_buffer.fill(0.0);
        self.spectrum.fill(Complex64::default());
        self.ifft_frame.fill(Complex64::default());
        self.input_write_index = 0;
        self.input_read_index = 0;
        self.output_read_index = 0;
        self.frame_sample_counter = 0;
        self.state = FrameState::Accumulating;
    }

    /// In overlap-add-only mode the counter restarts from zero after each frame and the
    /// input read position stays put: frames are disjoint blocks (fast convolution).
    pub fn set_overlap_add_only(&mut self, enable: bool) {
        self.overlap_add_only = enable;
    }

    /// Whether overlap-add-only mode is active.
    pub fn overlap_add_only(&self) -> bool {
        self.overlap_add_only
    }

    /// Frame length in samples.
    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    /// Hop between analysis frames in samples.
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Overlap fraction, `1 - hop / frame_length`.
    pub fn overlap(&self) -> f64 {
        self.overlap
    }

    /// Window in use.
    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    /// Gain applied to the inverse FFT during [`PendingFrame::synthesize`].
    pub fn window_hop_correction(&self) -> f64 {
        self.window_hop_correction
    }

    /// Input-to-output delay of an unmodified frame.
    pub fn latency_samples(&self) -> usize {
        self.frame_length
    }

    /// Current analysis/synthesis state.
    pub fn frame_state(&self) -> FrameState {
        self.state
    }

    /// Push one sample and pop one output sample.
    ///
    /// When this sample completes a frame the returned [`PendingFrame`] carries its
    /// spectrum. The output sample is taken before the new frame is synthesized.
    pub fn process_sample(&mut self, input: f64) -> (f64, Option<PendingFrame<'_>>) {
        let fired = self.push_input(input);

        let output = self.output_buffer[self.output_read_index];
        self.output_buffer[self.output_read_index] = 0.0;
        self.output_read_index = (self.output_read_index + 1) % self.output_buffer.len();

        let frame = if fired {
            Some(PendingFrame { vocoder: self })
        } else {
            None
        };
        (output, frame)
    }

    /// Push `count` zeros into the input ring without reading output.
    ///
    /// If more than one frame fires, all but the last are synthesized unmodified.
    pub fn add_zero_pad(&mut self, count: usize) -> Option<PendingFrame<'_>> {
        let mut fired = false;
        for _ in 0..count {
            fired |= self.push_input(0.0);
        }
        if fired {
            Some(PendingFrame { vocoder: self })
        } else {
            None
        }
    }

    fn push_input(&mut self, input: f64) -> bool {
        self.input_buffer[self.input_write_index] = input;
        self.input_write_index = (self.input_write_index + 1) % self.frame_length;

        self.frame_sample_counter += 1;
        if self.frame_sample_counter < self.frame_length {
            return false;
        }

        if self.state != FrameState::Accumulating {
            self.synthesize_pending();
        }
        self.do_fft();
        self.frame_sample_counter = if self.overlap_add_only {
            0
        } else {
            self.frame_length - self.hop_size
        };
        true
    }

    fn do_fft(&mut self) {
        let n = self.frame_length;
        for i in 0..n {
            let sample = self.input_buffer[(self.input_read_index + i) % n];
            self.spectrum[i] = Complex64::new(sample * self.window[i], 0.0);
        }
        if !self.overlap_add_only {
            self.input_read_index = (self.input_read_index + self.hop_size) % n;
        }
        self.fft.forward(&mut self.spectrum);
        self.state = FrameState::AwaitingInverseFft;
    }

    fn do_inverse_fft(&mut self) {
        self.ifft_frame.copy_from_slice(&self.spectrum);
        self.fft.inverse(&mut self.ifft_frame);
        self.state = FrameState::AwaitingOverlapAdd;
    }

    fn synthesize_pending(&mut self) {
        if self.state == FrameState::AwaitingInverseFft {
            self.do_inverse_fft();
        }
        let ring = self.output_buffer.len();
        for (i, bin) in self.ifft_frame.iter().enumerate() {
            self.output_buffer[(self.output_read_index + i) % ring] +=
                self.window_hop_correction * bin.re;
        }
        self.state = FrameState::Accumulating;
    }

    fn overlap_add_frame(&mut self, frame: &[f64]) {
        let ring = self.output_buffer.len();
        debug_assert!(frame.len() <= ring, "overlap-add frame longer than the output ring");
        for (i, &sample) in frame.iter().take(ring).enumerate() {
            self.output_buffer[(self.output_read_index + i) % ring] += sample;
        }
        self.state = FrameState::Accumulating;
    }
}

/// A fired analysis frame awaiting synthesis.
///
/// Holds the vocoder mutably; no more samples can be pushed until the frame is
/// synthesized or dropped.
#[derive(Debug)]
pub struct PendingFrame<'a> {
    vocoder: &'a mut PhaseVocoder,
}

impl PendingFrame<'_> {
    /// Frame length (number of spectrum bins).
    pub fn frame_length(&self) -> usize {
        self.vocoder.frame_length
    }

    /// Current state: [`FrameState::AwaitingInverseFft`] until
    /// [`PendingFrame::inverse_fft`] runs.
    pub fn state(&self) -> FrameState {
        self.vocoder.state
    }

    /// Forward FFT of the windowed frame, all `N` bins.
    pub fn spectrum(&self) -> &[Complex64] {
        &self.vocoder.spectrum
    }

    /// Mutable spectrum. Edits made after [`PendingFrame::inverse_fft`] have no effect
    /// on this frame's synthesis.
    pub fn spectrum_mut(&mut self) -> &mut [Complex64] {
        &mut self.vocoder.spectrum
    }

    /// Run the unnormalized inverse FFT of the (possibly edited) spectrum and return
    /// the time-domain frame. Only the first call transforms.
    pub fn inverse_fft(&mut self) -> &[Complex64] {
        if self.vocoder.state == FrameState::AwaitingInverseFft {
            self.vocoder.do_inverse_fft();
        }
        &self.vocoder.ifft_frame
    }

    /// Inverse transform if needed, then overlap-add the gain-corrected real part.
    pub fn synthesize(self) {
        self.vocoder.synthesize_pending();
    }

    /// Overlap-add a caller-built frame verbatim (no gain correction) instead of the
    /// inverse FFT. The frame may be any length up to four frames.
    pub fn overlap_add_with(self, frame: &[f64]) {
        self.vocoder.overlap_add_frame(frame);
    }
}

impl Drop for PendingFrame<'_> {
    fn drop(&mut self) {
        if self.vocoder.state != FrameState::Accumulating {
            self.vocoder.synthesize_pending();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    #[test]
    fn test_rejects_bad_configuration() {
        assert!(PhaseVocoder::new(1000, 250, WindowType::Hann).is_err());
        assert!(PhaseVocoder::new(1024, 0, WindowType::Hann).is_err());
        assert!(PhaseVocoder::new(1024, 2048, WindowType::Hann).is_err());
        assert!(PhaseVocoder::new(1024, 1024, WindowType::Hann).is_ok());
    }

    #[test]
    fn test_fires_on_hop_after_first_frame() {
        let mut vocoder = PhaseVocoder::new(16, 4, WindowType::Hann).unwrap();
        let mut fired_at = Vec::new();
        for n in 0..32 {
            let (_, frame) = vocoder.process_sample(0.0);
            if frame.is_some() {
                fired_at.push(n);
            }
        }
        assert_eq!(fired_at, vec![15, 19, 23, 27, 31]);
        assert!((vocoder.overlap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_dropped_frame_is_synthesized() {
        let mut vocoder = PhaseVocoder::new(16, 4, WindowType::Hann).unwrap();
        for _ in 0..16 {
            let _ = vocoder.process_sample(1.0);
        }
        assert_eq!(vocoder.frame_state(), FrameState::Accumulating);
        assert!(vocoder.output_buffer.iter().any(|&x| x != 0.0));
    }

    #[test]
    fn test_state_transitions() {
        let mut vocoder = PhaseVocoder::new(8, 8, WindowType::None).unwrap();
        for _ in 0..7 {
            let (_, frame) = vocoder.process_sample(1.0);
            assert!(frame.is_none());
        }
        let (_, frame) = vocoder.process_sample(1.0);
        let mut frame = frame.unwrap();
        assert_eq!(frame.state(), FrameState::AwaitingInverseFft);
        // DC of eight ones
        assert!((frame.spectrum()[0].re - 8.0).abs() < 1e-12);
        frame.inverse_fft();
        assert_eq!(frame.state(), FrameState::AwaitingOverlapAdd);
        frame.synthesize();
        assert_eq!(vocoder.frame_state(), FrameState::Accumulating);
    }

    #[test]
    fn test_spectral_edit_reaches_output() {
        let mut vocoder = PhaseVocoder::new(8, 8, WindowType::None).unwrap();
        for _ in 0..7 {
            let _ = vocoder.process_sample(1.0);
        }
        let (_, frame) = vocoder.process_sample(1.0);
        let mut frame = frame.unwrap();
        frame.spectrum_mut().fill(Complex64::default());
        frame.synthesize();
        for _ in 0..8 {
            let (y, _) = vocoder.process_sample(0.0);
            assert_eq!(y, 0.0);
        }
    }

    #[test]
    fn test_unity_reconstruction_with_latency() {
        let n = 64;
        let mut vocoder = PhaseVocoder::new(n, n / 4, WindowType::Hann).unwrap();
        let input: Vec<f64> = (0..1024).map(|i| (TAU * i as f64 / 37.0).sin()).collect();
        let mut output = Vec::with_capacity(input.len());
        for &x in &input {
            let (y, _) = vocoder.process_sample(x);
            output.push(y);
        }
        for i in 2 * n..input.len() {
            assert!(
                (output[i] - input[i - n]).abs() < 1e-9,
                "sample {i}: {} vs {}",
                output[i],
                input[i - n]
            );
        }
    }

    #[test]
    fn test_overlap_add_with_custom_frame() {
        let mut vocoder = PhaseVocoder::new(8, 8, WindowType::None).unwrap();
        for _ in 0..7 {
            let _ = vocoder.process_sample(0.0);
        }
        let (_, frame) = vocoder.process_sample(0.0);
        frame.unwrap().overlap_add_with(&[0.5, 0.25]);
        assert_eq!(vocoder.process_sample(0.0).0, 0.5);
        assert_eq!(vocoder.process_sample(0.0).0, 0.25);
        assert_eq!(vocoder.process_sample(0.0).0, 0.0);
    }

    #[test]
    fn test_zero_pad_fires_in_overlap_add_only_mode() {
        let mut vocoder = PhaseVocoder::new(8, 4, WindowType::None).unwrap();
        vocoder.set_overlap_add_only(true);
        for _ in 0..4 {
            let (_, frame) = vocoder.process_sample(1.0);
            assert!(frame.is_none());
        }
        let frame = vocoder.add_zero_pad(4);
        assert!(frame.is_some());
        drop(frame);
        assert_eq!(vocoder.frame_sample_counter, 0);
    }
}
