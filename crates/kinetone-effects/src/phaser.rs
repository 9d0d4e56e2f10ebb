//! Six-stage phaser with delay-free global feedback.
//!
//! Six first-order all-pass filters run in series, each sweeping its own band:
//!
//! | Stage | Band (Hz) |
//! |-------|-----------|
//! | 1 | 16-1600 |
//! | 2 | 33-3300 |
//! | 3 | 48-4800 |
//! | 4 | 98-9800 |
//! | 5 | 160-16000 |
//! | 6 | 260-20480 |
//!
//! The last stage feeds back into the first with no unit delay, `u = x - K*apf6`. Every
//! Direct-form biquad output splits into `y = G*x + S`, where `G` is the instantaneous
//! gain and `S` depends only on state. Chaining the six stages gives `apf6 =
//! gamma6*u + S` with
//!
//! ```text
//! gamma1 = G6, gamma2 = G5*gamma1, ..., gamma6 = G1*gamma5
//! S = gamma5*S1 + gamma4*S2 + gamma3*S3 + gamma2*S4 + gamma1*S5 + S6
//! u = alpha0 * (x - K*S),  alpha0 = 1 / (1 + K*gamma6)
//! ```
//!
//! and the cascade is driven with `u`. The output is `0.125*x + 1.25*apf6`. The loop is
//! stable for every intensity below 100%.

use kinetone_core::{
    AudioFilter, Effect, FilterAlgorithm, FilterParameters, Lfo, LfoWaveform,
    OscillatorParameters, ParamDescriptor, ParamUnit, ParameterInfo, bipolar_modulation,
};

/// Number of all-pass stages.
pub const PHASER_STAGES: usize = 6;

const APF_MIN_FREQUENCIES: [f64; PHASER_STAGES] = [16.0, 33.0, 48.0, 98.0, 160.0, 260.0];
const APF_MAX_FREQUENCIES: [f64; PHASER_STAGES] =
    [1600.0, 3300.0, 4800.0, 9800.0, 16000.0, 20480.0];

/// Phaser configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseShifterParameters {
    /// LFO rate in Hz.
    pub lfo_rate_hz: f64,
    /// Sweep depth in percent.
    pub lfo_depth_pct: f64,
    /// Global feedback in percent.
    pub intensity_pct: f64,
    /// Sweep with the quadrature LFO output.
    pub quad_phase_lfo: bool,
}

impl Default for PhaseShifterParameters {
    fn default() -> Self {
        Self {
            lfo_rate_hz: 0.2,
            lfo_depth_pct: 50.0,
            intensity_pct: 75.0,
            quad_phase_lfo: false,
        }
    }
}

const PARAMS: [ParamDescriptor; 4] = [
    ParamDescriptor::new("Rate", "rate", ParamUnit::Hertz, 0.02, 20.0, 0.2),
    ParamDescriptor::percent("Depth", "depth", 0.0, 100.0, 50.0),
    ParamDescriptor::percent("Intensity", "intensity", 0.0, 95.0, 75.0),
    ParamDescriptor::toggle("Quad Phase", "quad", false),
];

/// LFO-swept all-pass phaser.
///
/// ## Parameter Indices (`ParameterInfo`)
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Rate | 0.02–20 Hz | 0.2 |
/// | 1 | Depth | 0–100% | 50.0 |
/// | 2 | Intensity | 0–95% | 75.0 |
/// | 3 | Quad Phase | Off/On | Off |
///
/// # Example
///
/// ```rust
/// use kinetone_core::Effect;
/// use kinetone_effects::{PhaseShifter, PhaseShifterParameters};
///
/// let mut phaser = PhaseShifter::new(48000.0);
/// phaser.set_parameters(PhaseShifterParameters {
///     lfo_rate_hz: 0.5,
///     lfo_depth_pct: 80.0,
///     intensity_pct: 90.0,
///     quad_phase_lfo: false,
/// });
///
/// let output = phaser.process(0.5);
/// assert!(output.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct PhaseShifter {
    params: PhaseShifterParameters,
    apf: [AudioFilter; PHASER_STAGES],
    lfo: Lfo,
}

impl PhaseShifter {
    /// Create a phaser with default settings.
    pub fn new(sample_rate: f64) -> Self {
        let apf = core::array::from_fn(|stage| {
            let mut filter = AudioFilter::new(sample_rate);
            filter.set_parameters(FilterParameters::new(
                FilterAlgorithm::Apf1,
                APF_MIN_FREQUENCIES[stage],
            ));
            filter
        });
        let mut phaser = Self {
            params: PhaseShifterParameters::default(),
            apf,
            lfo: Lfo::new(sample_rate),
        };
        phaser.set_parameters(PhaseShifterParameters::default());
        phaser
    }

    /// Clear the filters and restart the LFO at `sample_rate`.
    pub fn reset(&mut self, sample_rate: f64) {
        for apf in &mut self.apf {
            apf.reset(sample_rate);
        }
        self.lfo.reset(sample_rate);
    }

    /// Copy of the current parameters.
    pub fn parameters(&self) -> PhaseShifterParameters {
        self.params
    }

    /// Apply new parameters.
    pub fn set_parameters(&mut self, params: PhaseShifterParameters) {
        self.params = params;
        self.lfo.set_parameters(OscillatorParameters {
            waveform: LfoWaveform::Triangle,
            frequency_hz: params.lfo_rate_hz,
        });
    }

    /// Current cutoff of every stage.
    pub fn stage_cutoffs(&self) -> [f64; PHASER_STAGES] {
        core::array::from_fn(|stage| self.apf[stage].parameters().fc)
    }

    /// Process one sample.
    pub fn process(&mut self, xn: f64) -> f64 {
        let lfo = self.lfo.render();
        let lfo_value = if self.params.quad_phase_lfo {
            lfo.quad_phase_pos
        } else {
            lfo.normal
        };
        let modulator = lfo_value * (self.params.lfo_depth_pct / 100.0);

        for (stage, apf) in self.apf.iter_mut().enumerate() {
            let mut params = apf.parameters();
            params.fc = bipolar_modulation(
                modulator,
                APF_MIN_FREQUENCIES[stage],
                APF_MAX_FREQUENCIES[stage],
            );
            apf.set_parameters(params);
        }

        // gamma[k] is the product of the last k+1 stage gains
        let mut gamma = [0.0; PHASER_STAGES];
        let mut product = 1.0;
        for (k, apf) in self.apf.iter().rev().enumerate() {
            product *= apf.gain_value();
            gamma[k] = product;
        }

        // Each stage's S is scaled by the gains of every stage after it
        let mut storage = self.apf[PHASER_STAGES - 1].storage_value();
        for stage in 0..PHASER_STAGES - 1 {
            storage += gamma[PHASER_STAGES - 2 - stage] * self.apf[stage].storage_value();
        }

        let k = self.params.intensity_pct / 100.0;
        let alpha0 = 1.0 / (1.0 + k * gamma[PHASER_STAGES - 1]);
        let u = alpha0 * (xn - k * storage);

        let wet = self.apf.iter_mut().fold(u, |signal, apf| apf.process(signal));
        0.125 * xn + 1.25 * wet
    }

    fn update(&mut self, f: impl FnOnce(&mut PhaseShifterParameters)) {
        let mut params = self.params;
        f(&mut params);
        self.set_parameters(params);
    }
}

impl Effect for PhaseShifter {
    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        PhaseShifter::process(self, input)
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        PhaseShifter::reset(self, sample_rate);
    }

    fn reset(&mut self) {
        for apf in &mut self.apf {
            Effect::reset(apf);
        }
        let sample_rate = self.apf[0].sample_rate();
        self.lfo.reset(sample_rate);
    }
}

impl ParameterInfo for PhaseShifter {
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
            2 => self.params.intensity_pct,
            3 => f64::from(u8::from(self.params.quad_phase_lfo)),
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
            2 => self.update(|p| p.intensity_pct = value),
            3 => self.update(|p| p.quad_phase_lfo = value >= 0.5),
            _ => {}
        }
    }
}
