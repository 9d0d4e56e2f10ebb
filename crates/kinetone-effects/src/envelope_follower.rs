//! Envelope-following filter (auto-wah).
//!
//! An RMS detector reports the input level in dB. Whenever the level exceeds the
//! threshold, the linear excess times the sensitivity sweeps a resonant low-pass from
//! its base cutoff toward 20480 Hz:
//!
//! ```text
//! delta = 10^(level/20) - 10^(threshold/20)
//! fc    = fc_base + clamp(delta * sensitivity, 0, 1) * (20480 - fc_base)   when delta > 0
//! ```

use kinetone_core::{
    AudioDetector, AudioDetectorParameters, AudioFilter, DetectMode, Effect, FilterAlgorithm,
    FilterParameters, MAX_FILTER_FREQUENCY, ParamDescriptor, ParamUnit, ParameterInfo,
    db_to_linear, unipolar_modulation_from_min,
};

/// Envelope follower configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeFollowerParameters {
    /// Cutoff with no signal above threshold, in Hz.
    pub fc: f64,
    /// Filter resonance.
    pub q: f64,
    /// Detector attack in milliseconds.
    pub attack_time_ms: f64,
    /// Detector release in milliseconds.
    pub release_time_ms: f64,
    /// Level above which the cutoff moves, in dB.
    pub threshold_db: f64,
    /// Sweep amount per unit of linear excess.
    pub sensitivity: f64,
}

impl Default for EnvelopeFollowerParameters {
    fn default() -> Self {
        Self {
            fc: 800.0,
            q: 4.0,
            attack_time_ms: 10.0,
            release_time_ms: 50.0,
            threshold_db: -20.0,
            sensitivity: 1.0,
        }
    }
}

const PARAMS: [ParamDescriptor; 6] = [
    ParamDescriptor::frequency("Cutoff", "fc", 20.0, 5000.0, 800.0),
    ParamDescriptor::new("Resonance", "q", ParamUnit::None, 0.5, 20.0, 4.0),
    ParamDescriptor::time_ms("Attack", "attack", 0.0, 500.0, 10.0),
    ParamDescriptor::time_ms("Release", "release", 0.0, 2000.0, 50.0),
    ParamDescriptor::gain_db("Threshold", "threshold", -60.0, 0.0, -20.0),
    ParamDescriptor::new("Sensitivity", "sensitivity", ParamUnit::None, 0.25, 10.0, 1.0),
];

/// Level-controlled resonant low-pass.
///
/// ## Parameter Indices (`ParameterInfo`)
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Cutoff | 20–5000 Hz | 800.0 |
/// | 1 | Resonance | 0.5–20 | 4.0 |
/// | 2 | Attack | 0–500 ms | 10.0 |
/// | 3 | Release | 0–2000 ms | 50.0 |
/// | 4 | Threshold | -60–0 dB | -20.0 |
/// | 5 | Sensitivity | 0.25–10 | 1.0 |
///
/// # Example
///
/// ```rust
/// use kinetone_core::Effect;
/// use kinetone_effects::EnvelopeFollower;
///
/// let mut wah = EnvelopeFollower::new(48000.0);
/// for n in 0..4800 {
///     wah.process((n as f64 * 0.05).sin());
/// }
/// assert!(wah.cutoff() > 800.0);
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    params: EnvelopeFollowerParameters,
    threshold: f64,
    filter: AudioFilter,
    detector: AudioDetector,
}

impl EnvelopeFollower {
    /// Create an envelope follower with default settings.
    pub fn new(sample_rate: f64) -> Self {
        let mut detector = AudioDetector::new(sample_rate);
        detector.set_parameters(AudioDetectorParameters {
            detect_mode: DetectMode::Rms,
            detect_db: true,
            clamp_to_unity_max: false,
            ..AudioDetectorParameters::default()
        });

        let mut follower = Self {
            params: EnvelopeFollowerParameters::default(),
            threshold: 0.0,
            filter: AudioFilter::new(sample_rate),
            detector,
        };
        follower.set_parameters(EnvelopeFollowerParameters::default());
        follower
    }

    /// Clear the filter and detector at `sample_rate`.
    pub fn reset(&mut self, sample_rate: f64) {
        self.filter.reset(sample_rate);
        self.detector.reset(sample_rate);
    }

    /// Copy of the current parameters.
    pub fn parameters(&self) -> EnvelopeFollowerParameters {
        self.params
    }

    /// Apply new parameters.
    pub fn set_parameters(&mut self, params: EnvelopeFollowerParameters) {
        self.params = params;
        self.threshold = db_to_linear(params.threshold_db);
        self.filter.set_parameters(
            FilterParameters::new(FilterAlgorithm::Lpf2, params.fc).with_q(params.q),
        );
        self.detector.set_attack_time(params.attack_time_ms, false);
        self.detector.set_release_time(params.release_time_ms, false);
    }

    /// Cutoff in use for the most recent sample.
    pub fn cutoff(&self) -> f64 {
        self.filter.parameters().fc
    }

    /// Process one sample.
    pub fn process(&mut self, xn: f64) -> f64 {
        let level = db_to_linear(self.detector.process(xn));
        let delta = level - self.threshold;

        let mut filter_params = self.filter.parameters();
        filter_params.fc = if delta > 0.0 {
            unipolar_modulation_from_min(
                delta * self.params.sensitivity,
                self.params.fc,
                MAX_FILTER_FREQUENCY,
            )
        } else {
            self.params.fc
        };
        self.filter.set_parameters(filter_params);
        self.filter.process(xn)
    }

    fn update(&mut self, f: impl FnOnce(&mut EnvelopeFollowerParameters)) {
        let mut params = self.params;
        f(&mut params);
        self.set_parameters(params);
    }
}

impl Effect for EnvelopeFollower {
    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        EnvelopeFollower::process(self, input)
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        EnvelopeFollower::reset(self, sample_rate);
    }

    fn reset(&mut self) {
        let sample_rate = self.filter.sample_rate();
        EnvelopeFollower::reset(self, sample_rate);
    }
}

impl ParameterInfo for EnvelopeFollower {
    fn param_count(&self) -> usize {
        PARAMS.len()
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        PARAMS.get(index).copied()
    }

    fn get_param(&self, index: usize) -> f64 {
        let p = &self.params;
        match index {
            0 => p.fc,
            1 => p.q,
            2 => p.attack_time_ms,
            3 => p.release_time_ms,
            4 => p.threshold_db,
            5 => p.sensitivity,
            _ => 0.0,
        }
    }

    fn set_param(&mut self, index: usize, value: f64) {
        let Some(desc) = PARAMS.get(index) else {
            return;
        };
        let value = desc.clamp(value);
        match index {
            0 => self.update(|p| p.fc = value),
            1 => self.update(|p| p.q = value),
            2 => self.update(|p| p.attack_time_ms = value),
            3 => self.update(|p| p.release_time_ms = value),
            4 => self.update(|p| p.threshold_db = value),
            5 => self.update(|p| p.sensitivity = value),
            _ => {}
        }
    }
}
