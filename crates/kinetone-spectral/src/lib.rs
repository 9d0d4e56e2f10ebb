//! Kinetone Spectral - FFT-domain processing
//!
//! This crate provides the block-based half of the kinetone DSP core:
//!
//! - [`window`] - Periodic analysis windows with overlap-add gain correction
//! - [`fft`] - In-place FFT wrapper and windowed real-frame transform
//! - [`vocoder`] - Phase vocoder with an explicit, borrow-checked synthesis step
//! - [`convolver`] - Overlap-add fast convolution on the vocoder
//! - [`psm`] - Peak-locked pitch shifter
//! - [`resample`] - Frame resampling with linear or Lagrange interpolation
//!
//! ## Synthesis Step
//!
//! When the vocoder completes an analysis frame, [`PhaseVocoder::process_sample`]
//! returns a [`PendingFrame`] alongside the output sample. The frame mutably borrows
//! the vocoder, so the spectrum can be edited and resynthesized, but no further input
//! can be pushed until the frame is consumed or dropped:
//!
//! ```rust
//! use kinetone_spectral::{PhaseVocoder, WindowType};
//!
//! let mut vocoder = PhaseVocoder::new(512, 128, WindowType::Hann).unwrap();
//! let mut frames = 0;
//! for n in 0..2048 {
//!     let (_y, frame) = vocoder.process_sample((n as f64 * 0.01).sin());
//!     if let Some(mut frame) = frame {
//!         frame.spectrum_mut()[0] = Default::default(); // remove DC
//!         frame.synthesize();
//!         frames += 1;
//!     }
//! }
//! assert_eq!(frames, 13);
//! ```
//!
//! ## Real-time Notes
//!
//! Every buffer is sized at construction. [`PsmVocoder::set_pitch_shift`] is the one
//! configuration call that reallocates, and only when the resampled frame length
//! changes.

pub mod convolver;
pub mod fft;
pub mod psm;
pub mod resample;
pub mod vocoder;
pub mod window;

// Re-export main types
pub use convolver::FastConvolver;
pub use fft::{FastFft, Fft};
pub use kinetone_core::principal_arg;
pub use psm::{
    BinData, MAX_PITCH_SHIFT_SEMITONES, PSM_FRAME_LENGTH, PsmVocoder, PsmVocoderParameters,
};
pub use resample::{Interpolation, resample_frame};
pub use rustfft::num_complex::Complex64;
pub use vocoder::{FrameState, PendingFrame, PhaseVocoder};
pub use window::{WindowType, make_window, overlap};
