//! Low Frequency Oscillator for modulation effects.
//!
//! [`Lfo`] renders a [`SignalGenData`] per sample: the waveform, its inversion, and the
//! same waveform a quarter cycle ahead (and its inversion). Quadrature outputs drive
//! stereo phasers and dual-voice chorus.

use core::f64::consts::TAU;
use libm::sin;

use crate::math::unipolar_to_bipolar;

/// LFO waveform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LfoWaveform {
    /// Symmetric triangle; +1 at the start of the cycle.
    #[default]
    Triangle,
    /// Sine.
    Sin,
    /// Rising saw.
    Saw,
}

/// Oscillator configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorParameters {
    /// Waveform.
    pub waveform: LfoWaveform,
    /// Frequency in Hz.
    pub frequency_hz: f64,
}

impl Default for OscillatorParameters {
    fn default() -> Self {
        Self {
            waveform: LfoWaveform::Triangle,
            frequency_hz: 0.0,
        }
    }
}

/// One rendered LFO sample in four phases. All values are bipolar, \[-1, 1\].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SignalGenData {
    /// The waveform.
    pub normal: f64,
    /// `-normal`.
    pub inverted: f64,
    /// The waveform a quarter cycle ahead.
    pub quad_phase_pos: f64,
    /// `-quad_phase_pos`.
    pub quad_phase_neg: f64,
}

/// Modulo-counter oscillator.
///
/// # Example
///
/// ```rust
/// use kinetone_core::{Lfo, LfoWaveform, OscillatorParameters};
///
/// let mut lfo = Lfo::new(48000.0);
/// lfo.set_parameters(OscillatorParameters { waveform: LfoWaveform::Sin, frequency_hz: 2.0 });
///
/// let out = lfo.render();
/// assert_eq!(out.normal, 0.0);
/// assert!((out.quad_phase_pos - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct Lfo {
    params: OscillatorParameters,
    mod_counter: f64,
    phase_inc: f64,
    sample_rate: f64,
}

impl Lfo {
    /// Create a stopped oscillator (0 Hz triangle).
    pub fn new(sample_rate: f64) -> Self {
        let mut lfo = Self {
            params: OscillatorParameters::default(),
            mod_counter: 0.0,
            phase_inc: 0.0,
            sample_rate,
        };
        lfo.reset(sample_rate);
        lfo
    }

    /// Restart the cycle and recompute the increment for `sample_rate`.
    pub fn reset(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.phase_inc = self.params.frequency_hz / sample_rate;
        self.mod_counter = 0.0;
    }

    /// Copy of the current parameters.
    pub fn parameters(&self) -> OscillatorParameters {
        self.params
    }

    /// Apply new parameters. The cycle position is kept.
    pub fn set_parameters(&mut self, params: OscillatorParameters) {
        if params.frequency_hz != self.params.frequency_hz {
            self.phase_inc = params.frequency_hz / self.sample_rate;
        }
        self.params = params;
    }

    /// Current position in the cycle, \[0, 1).
    pub fn phase(&self) -> f64 {
        self.mod_counter
    }

    /// Render one sample and advance.
    pub fn render(&mut self) -> SignalGenData {
        self.mod_counter = wrap_modulo(self.mod_counter);
        let quad_counter = wrap_modulo(self.mod_counter + 0.25);

        let normal = self.waveform_at(self.mod_counter);
        let quad_phase_pos = self.waveform_at(quad_counter);

        self.mod_counter += self.phase_inc;

        SignalGenData {
            normal,
            inverted: -normal,
            quad_phase_pos,
            quad_phase_neg: -quad_phase_pos,
        }
    }

    fn waveform_at(&self, counter: f64) -> f64 {
        match self.params.waveform {
            LfoWaveform::Sin => sin(counter * TAU),
            LfoWaveform::Triangle => 2.0 * unipolar_to_bipolar(counter).abs() - 1.0,
            LfoWaveform::Saw => unipolar_to_bipolar(counter),
        }
    }
}

#[inline]
fn wrap_modulo(counter: f64) -> f64 {
    if counter >= 1.0 {
        counter - 1.0
    } else if counter < 0.0 {
        counter + 1.0
    } else {
        counter
    }
}
