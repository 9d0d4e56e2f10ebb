//! Kinetone Core - filter design and DSP primitives
//!
//! This crate provides the sample-level building blocks the rest of the workspace is
//! made of, designed for real-time processing with no allocation in the audio path.
//!
//! # Core Abstractions
//!
//! ## Filters
//!
//! - [`calculate_coefficients`] - Closed-form design for 29 [`FilterAlgorithm`]s
//! - [`Biquad`] - Second-order IIR engine with four [`BiquadTopology`] variants
//! - [`AudioFilter`] - Biquad plus its design parameters, with boundary validation
//! - [`CombFilter`] - Feedback comb with optional loop damping
//! - [`DelayApf`] - Delay-line all-pass
//!
//! ## Delay Lines
//!
//! - [`CircularBuffer`] - Power-of-two ring buffer with integer and fractional reads
//!
//! ## Modulation & Detection
//!
//! - [`Lfo`] - Triangle/sine/saw oscillator with quadrature outputs
//! - [`AudioDetector`] - Peak/MS/RMS envelope detector, linear or dB
//!
//! ## Effect System
//!
//! - [`Effect`] - Object-safe trait for processing units
//! - [`EffectExt`] / [`Chain`] - Static effect chaining
//! - [`ParameterInfo`] - Index-based parameter introspection
//!
//! ## Utilities
//!
//! - [`db_to_linear`], [`linear_to_db`], [`flush_underflow`], [`principal_arg`]
//! - [`linear_interpolate`], [`lagrange_interpolate`]
//! - [`bipolar_modulation`], [`unipolar_modulation_from_min`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! kinetone-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use kinetone_core::{AudioFilter, Effect, FilterAlgorithm, FilterParameters};
//!
//! let mut filter = AudioFilter::new(48000.0);
//! filter.set_parameters(FilterParameters::new(FilterAlgorithm::ButterHpf2, 80.0));
//!
//! let input = [0.5; 64];
//! let mut output = [0.0; 64];
//! filter.process_block(&input, &mut output);
//! assert!(output[63] < output[0]);
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: buffers are sized at construction or reset, never in `process`
//! - **No dependencies on std**: `libm` for math, `alloc` for buffers
//! - **Fallible configuration, infallible processing**: [`DspError`] at the boundary

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod allpass;
pub mod audio_filter;
pub mod biquad;
pub mod comb;
pub mod delay;
pub mod effect;
pub mod envelope;
pub mod error;
pub mod filter_design;
pub mod lfo;
pub mod math;
pub mod param_info;

// Re-export main types at crate root
pub use allpass::{DelayApf, DelayApfParameters};
pub use audio_filter::{AudioFilter, MIN_FILTER_FREQUENCY};
pub use biquad::{Biquad, BiquadCoefficients, BiquadTopology};
pub use comb::{CombFilter, CombFilterParameters};
pub use delay::{CircularBuffer, DelaySample};
pub use effect::{Chain, Effect, EffectExt};
pub use envelope::{AudioDetector, AudioDetectorParameters, DetectMode};
pub use error::DspError;
pub use filter_design::{
    DEFAULT_Q, FilterAlgorithm, FilterParameters, UnknownAlgorithm, calculate_coefficients,
    magnitude_response, magnitude_response_db,
};
pub use lfo::{Lfo, LfoWaveform, OscillatorParameters, SignalGenData};
pub use math::{
    MAX_FILTER_FREQUENCY, MIN_DB, SMALLEST_POSITIVE_NORMAL, bipolar_modulation,
    bipolar_to_unipolar, db_to_linear, flush_underflow, lagrange_interpolate, linear_interpolate,
    linear_to_db, ms_to_samples, next_power_of_two, principal_arg, unipolar_modulation_from_min,
    unipolar_to_bipolar,
};
pub use param_info::{ParamDescriptor, ParamUnit, ParameterInfo};
