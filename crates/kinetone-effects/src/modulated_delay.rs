//! LFO-modulated delay: flanger, chorus and vibrato.
//!
//! One [`Lfo`] sweeps the delay time of an [`AudioDelay`] every sample (every frame in
//! stereo). The algorithm picks the sweep range, shape and mix:
//!
//! | Algorithm | Delay sweep | Mapping | LFO | Dry | Wet |
//! |-----------|-------------|---------|-----|-----|-----|
//! | Flanger | 0.1-7.1 ms | unipolar from minimum | triangle | -3 dB | -3 dB |
//! | Chorus | 10-40 ms | bipolar around centre | triangle | 0 dB | -3 dB |
//! | Vibrato | 0-7 ms | bipolar around centre | sine | -96 dB | 0 dB |
//!
//! The depth parameter scales the LFO before the mapping, so zero depth parks a
//! flanger or chorus at the centre of its range.

use kinetone_core::{
    Effect, Lfo, LfoWaveform, MIN_DB, OscillatorParameters, ParamDescriptor, ParamUnit,
    ParameterInfo, bipolar_modulation, bipolar_to_unipolar, unipolar_modulation_from_min,
};

use crate::delay::{AudioDelay, AudioDelayParameters};

/// Delay buffer length for every modulated algorithm.
const BUFFER_MS: f64 = 100.0;

/// Sweep shape of a [`ModulatedDelay`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModDelayAlgorithm {
    /// Short unipolar sweep, mixed with the dry signal.
    #[default]
    Flanger,
    /// Long bipolar sweep, mixed with the dry signal.
    Chorus,
    /// Short bipolar sine sweep, wet only.
    Vibrato,
}

impl ModDelayAlgorithm {
    /// Minimum delay and sweep width in milliseconds.
    pub const fn delay_range_ms(self) -> (f64, f64) {
        match self {
            Self::Flanger => (0.1, 7.0),
            Self::Chorus => (10.0, 30.0),
            Self::Vibrato => (0.0, 7.0),
        }
    }

    /// Dry and wet levels in dB.
    pub const fn mix_levels_db(self) -> (f64, f64) {
        match self {
            Self::Flanger => (-3.0, -3.0),
            Self::Chorus => (0.0, -3.0),
            Self::Vibrato => (MIN_DB, 0.0),
        }
    }

    const fn waveform(self) -> LfoWaveform {
        match self {
            Self::Vibrato => LfoWaveform::Sin,
            Self::Flanger | Self::Chorus => LfoWaveform::Triangle,
        }
    }
}

/// Modulated delay configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModulatedDelayParameters {
    /// Sweep shape.
    pub algorithm: ModDelayAlgorithm,
    /// LFO rate in Hz.
    pub lfo_rate_hz: f64,
    /// Sweep depth in percent.
    pub lfo_depth_pct: f64,
    /// Delay feedback in percent.
    pub feedback_pct: f64,
}

impl Default for ModulatedDelayParameters {
    fn default() -> Self {
        Self {
            algorithm: ModDelayAlgorithm::Flanger,
            lfo_rate_hz: 0.2,
            lfo_depth_pct: 50.0,
            feedback_pct: 0.0,
        }
    }
}

const PARAMS: [ParamDescriptor; 3] = [
    ParamDescriptor::new("Rate", "rate", ParamUnit::Hertz, 0.02, 20.0, 0.2),
    ParamDescriptor::percent("Depth", "depth", 0.0, 100.0, 50.0),
    ParamDescriptor::percent("Feedback", "feedback", 0.0, 99.0, 0.0),
];

/// Flanger, chorus or vibrato.
///
/// ## Parameter Indices (`ParameterInfo`)
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Rate | 0.02–20 Hz | 0.2 |
/// | 1 | Depth | 0–100% | 50.0 |
/// | 2 | Feedback | 0–99% | 0.0 |
///
/// The algorithm is fixed per instance through the parameter struct; the registry
/// exposes each one under its own id.
///
/// # Example
///
/// ```rust
/// use kinetone_core::Effect;
/// use kinetone_effects::{ModDelayAlgorithm, ModulatedDelay};
///
/// let mut chorus = ModulatedDelay::new(48000.0, ModDelayAlgorithm::Chorus);
/// let output = chorus.process(0.5);
/// // Chorus keeps the dry signal at unity
/// assert!((output - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct ModulatedDelay {
    params: ModulatedDelayParameters,
    delay: AudioDelay,
    lfo: Lfo,
}

impl ModulatedDelay {
    /// Create a modulated delay with default rate and depth.
    pub fn new(sample_rate: f64, algorithm: ModDelayAlgorithm) -> Self {
        let mut delay = AudioDelay::new();
        delay.allocate(sample_rate, BUFFER_MS);

        let mut effect = Self {
            params: ModulatedDelayParameters::default(),
            delay,
            lfo: Lfo::new(sample_rate),
        };
        effect.apply_algorithm(algorithm);
        effect.set_parameters(ModulatedDelayParameters {
            algorithm,
            ..ModulatedDelayParameters::default()
        });
        effect
    }

    /// Clear the delay lines and restart the LFO.
    pub fn reset(&mut self, sample_rate: f64) {
        self.delay.reset(sample_rate);
        self.lfo.reset(sample_rate);
    }

    /// Copy of the current parameters.
    pub fn parameters(&self) -> ModulatedDelayParameters {
        self.params
    }

    /// Apply new parameters. Changing the algorithm resets the dry/wet levels.
    pub fn set_parameters(&mut self, params: ModulatedDelayParameters) {
        if params.algorithm != self.params.algorithm {
            self.apply_algorithm(params.algorithm);
        }
        self.params = params;

        self.lfo.set_parameters(OscillatorParameters {
            waveform: params.algorithm.waveform(),
            frequency_hz: params.lfo_rate_hz,
        });

        let mut delay_params = self.delay.parameters();
        delay_params.feedback_pct = params.feedback_pct;
        self.delay.set_parameters(delay_params);
    }

    /// The underlying delay.
    pub fn delay(&self) -> &AudioDelay {
        &self.delay
    }

    /// Process one mono sample.
    #[inline]
    pub fn process(&mut self, xn: f64) -> f64 {
        self.modulate();
        self.delay.process(xn)
    }

    /// Process one frame; both channels share the sweep.
    pub fn process_frame(&mut self, input: &[f64], output: &mut [f64]) -> bool {
        if input.is_empty() || output.is_empty() {
            return false;
        }
        self.modulate();
        self.delay.process_frame(input, output)
    }

    fn apply_algorithm(&mut self, algorithm: ModDelayAlgorithm) {
        let (dry_level_db, wet_level_db) = algorithm.mix_levels_db();
        self.delay.set_parameters(AudioDelayParameters {
            dry_level_db,
            wet_level_db,
            ..self.delay.parameters()
        });
    }

    fn modulate(&mut self) {
        let lfo = self.lfo.render().normal * (self.params.lfo_depth_pct / 100.0);
        let (min_ms, width_ms) = self.params.algorithm.delay_range_ms();
        let max_ms = min_ms + width_ms;

        let delay_ms = match self.params.algorithm {
            ModDelayAlgorithm::Flanger => {
                unipolar_modulation_from_min(bipolar_to_unipolar(lfo), min_ms, max_ms)
            }
            ModDelayAlgorithm::Chorus | ModDelayAlgorithm::Vibrato => {
                bipolar_modulation(lfo, min_ms, max_ms)
            }
        };
        self.delay.set_delay_times_ms(delay_ms, delay_ms);
    }

    fn update(&mut self, f: impl FnOnce(&mut ModulatedDelayParameters)) {
        let mut params = self.params;
        f(&mut params);
        self.set_parameters(params);
    }
}

impl Effect for ModulatedDelay {
    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        ModulatedDelay::process(self, input)
    }

    fn process_frame(&mut self, input: &[f64], output: &mut [f64]) -> bool {
        ModulatedDelay::process_frame(self, input, output)
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        ModulatedDelay::reset(self, sample_rate);
    }

    fn reset(&mut self) {
        let sample_rate = self.delay.sample_rate();
        ModulatedDelay::reset(self, sample_rate);
    }
}

impl ParameterInfo for ModulatedDelay {
    fn param_count(&self) -> usize {
        PARAMS.len()
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        PARAMS.get(index).copied()
    }

    fn get_param(&self, index: usize) -> f64 {
        match index {
            0 => self.params.lfo_rate_hz,
            1 => self.params.lfo_depth_pct,
            2 => self.params.feedback_pct,
            _ => 0.0,
        }
    }

    fn set_param(&mut self, index: usize, value: f64) {
        let Some(desc) = PARAMS.get(index) else {
            return;
        };
        let value = desc.clamp(value);
        match index {
            0 => self.update(|p| p.lfo_rate_hz = value),
            1 => self.update(|p| p.lfo_depth_pct = value),
            2 => self.update(|p| p.feedback_pct = value),
            _ => {}
        }
    }
}
