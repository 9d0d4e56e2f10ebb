//! Kinetone Effects - Audio effect implementations
//!
//! This crate builds complete effects on the kinetone-core primitives:
//!
//! - [`Filter`] - Any of the 29 biquad algorithms behind a parameter table
//! - [`AudioDelay`] - Stereo feedback delay with ping-pong cross feedback
//! - [`ModulatedDelay`] - Flanger, chorus and vibrato on one LFO-swept delay
//! - [`PhaseShifter`] - Six-stage all-pass phaser with delay-free feedback
//! - [`EnvelopeFollower`] - Level-controlled resonant low-pass
//! - [`PitchShifter`] - Peak-locked phase vocoder pitch shifter (`std`)
//! - [`ConvolutionEffect`] - FFT convolution with a synthetic room tail (`std`)
//!
//! [`EffectRegistry`] creates any of them by id, and every effect implements
//! [`ParameterInfo`](kinetone_core::ParameterInfo) so hosts and presets can drive it by
//! index or name.
//!
//! ## Example
//!
//! ```rust
//! use kinetone_core::{Effect, EffectExt};
//! use kinetone_effects::{AudioDelay, ModDelayAlgorithm, ModulatedDelay, PhaseShifter};
//!
//! let phaser = PhaseShifter::new(48000.0);
//! let chorus = ModulatedDelay::new(48000.0, ModDelayAlgorithm::Chorus);
//! let delay = AudioDelay::with_sample_rate(48000.0);
//!
//! let mut chain = phaser.chain(chorus).chain(delay);
//! let output = chain.process(0.5);
//! assert!(output.is_finite());
//! ```
//!
//! ## Features
//!
//! - `std` (default): enables the spectral effects through kinetone-spectral
//! - `tracing`: debug events for buffer allocation and impulse generation

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod delay;
pub mod envelope_follower;
pub mod filter;
pub mod modulated_delay;
pub mod phaser;
pub mod registry;

#[cfg(feature = "std")]
pub mod convolution;
#[cfg(feature = "std")]
pub mod pitch_shift;

// Re-export main types at crate root
pub use delay::{
    AudioDelay, AudioDelayParameters, DEFAULT_BUFFER_MS, DelayAlgorithm, DelayUpdateType,
};
pub use envelope_follower::{EnvelopeFollower, EnvelopeFollowerParameters};
pub use filter::Filter;
pub use modulated_delay::{ModDelayAlgorithm, ModulatedDelay, ModulatedDelayParameters};
pub use phaser::{PHASER_STAGES, PhaseShifter, PhaseShifterParameters};
pub use registry::{
    BoxedEffect, EffectCategory, EffectDescriptor, EffectRegistry, EffectWithParams,
};

#[cfg(feature = "std")]
pub use convolution::{CONVOLUTION_IR_LENGTH, ConvolutionEffect};
#[cfg(feature = "std")]
pub use pitch_shift::PitchShifter;
