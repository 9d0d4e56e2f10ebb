//! File I/O layer for kinetone.
//!
//! This crate provides:
//!
//! - **Buffers**: [`AudioBuffer`], planar `f64` audio with one or two channels
//! - **WAV file I/O**: [`read_wav`] and [`write_wav`] for 16/24-bit PCM and 32-bit float
//! - **Offline processing**: [`ProcessingEngine`] renders a buffer through a chain of
//!   effects, with optional latency compensation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kinetone_io::{ProcessingEngine, RenderOptions, read_wav, write_wav};
//! use kinetone_effects::PhaseShifter;
//!
//! let (input, spec) = read_wav("input.wav")?;
//!
//! let sample_rate = f64::from(spec.sample_rate);
//! let mut engine = ProcessingEngine::new(sample_rate);
//! engine.add_effect(Box::new(PhaseShifter::new(sample_rate)));
//! let output = engine.render(&input, &RenderOptions::default(), |_| {});
//!
//! write_wav("output.wav", &output, spec)?;
//! # Ok::<(), kinetone_io::Error>(())
//! ```

mod buffer;
mod engine;
mod wav;

pub use buffer::AudioBuffer;
pub use engine::{ProcessingEngine, RenderOptions};
pub use wav::{WavFormat, WavInfo, WavSpec, read_wav, read_wav_info, write_wav};

/// Error types for audio file operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Only mono and stereo audio is handled.
    #[error("Unsupported channel count: {0} (expected 1 or 2)")]
    UnsupportedChannels(u16),

    /// The bit depth cannot be read or written.
    #[error("Unsupported bit depth: {0} (expected 16, 24 or 32)")]
    UnsupportedBitDepth(u16),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
