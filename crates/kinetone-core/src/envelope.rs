//! Analog-modelled envelope detector.
//!
//! [`AudioDetector`] tracks the level of a signal with separate attack and release
//! times. The input is rectified (and squared for mean-square and RMS modes), then a
//! one-pole smoother moves the envelope toward it:
//!
//! ```text
//! env[n] = coeff * (env[n-1] - in) + in
//! coeff  = exp(ln(0.368) / (time_ms * fs * 0.001))
//! ```
//!
//! `ln(0.368)` makes the time constant the point where an analog RC detector reaches
//! 63.2% of a step. The output can be linear or dB (floored at -96 dB).

use libm::{exp, sqrt};

use crate::math::{MIN_DB, flush_underflow, linear_to_db};

/// ln(0.368), the analog time-constant target.
const TC_LOG: f64 = -0.999_672_340_813_206_1;

/// What the detector measures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetectMode {
    /// Rectified peak.
    #[default]
    Peak,
    /// Mean square.
    MeanSquare,
    /// Root mean square.
    Rms,
}

/// Detector configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioDetectorParameters {
    /// Attack time in milliseconds.
    pub attack_time_ms: f64,
    /// Release time in milliseconds.
    pub release_time_ms: f64,
    /// Detection mode.
    pub detect_mode: DetectMode,
    /// Report the envelope in dB instead of linear.
    pub detect_db: bool,
    /// Clamp the envelope to 1.0 (0 dBFS).
    pub clamp_to_unity_max: bool,
}

impl Default for AudioDetectorParameters {
    fn default() -> Self {
        Self {
            attack_time_ms: 0.0,
            release_time_ms: 0.0,
            detect_mode: DetectMode::Peak,
            detect_db: false,
            clamp_to_unity_max: true,
        }
    }
}

/// Attack/release envelope detector.
///
/// # Example
///
/// ```rust
/// use kinetone_core::{AudioDetector, AudioDetectorParameters, DetectMode};
///
/// let mut detector = AudioDetector::new(48000.0);
/// detector.set_parameters(AudioDetectorParameters {
///     attack_time_ms: 5.0,
///     release_time_ms: 50.0,
///     detect_mode: DetectMode::Rms,
///     ..Default::default()
/// });
///
/// let mut level = 0.0;
/// for _ in 0..4800 {
///     level = detector.process(0.5);
/// }
/// assert!((level - 0.5).abs() < 0.01);
/// ```
#[derive(Debug, Clone)]
pub struct AudioDetector {
    params: AudioDetectorParameters,
    attack_coeff: f64,
    release_coeff: f64,
    last_envelope: f64,
    sample_rate: f64,
}

impl AudioDetector {
    /// Create a detector with zero attack and release (instantaneous).
    pub fn new(sample_rate: f64) -> Self {
        let mut detector = Self {
            params: AudioDetectorParameters::default(),
            attack_coeff: 0.0,
            release_coeff: 0.0,
            last_envelope: 0.0,
            sample_rate,
        };
        detector.reset(sample_rate);
        detector
    }

    /// Clear the envelope and recompute both coefficients for `sample_rate`.
    pub fn reset(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.last_envelope = 0.0;
        self.set_attack_time(self.params.attack_time_ms, true);
        self.set_release_time(self.params.release_time_ms, true);
    }

    /// Copy of the current parameters.
    pub fn parameters(&self) -> AudioDetectorParameters {
        self.params
    }

    /// Apply new parameters. Coefficients are recomputed only for changed times.
    pub fn set_parameters(&mut self, params: AudioDetectorParameters) {
        self.params.detect_mode = params.detect_mode;
        self.params.detect_db = params.detect_db;
        self.params.clamp_to_unity_max = params.clamp_to_unity_max;
        self.set_attack_time(params.attack_time_ms, false);
        self.set_release_time(params.release_time_ms, false);
    }

    /// Set the attack time. Skipped when unchanged unless `force` is set.
    pub fn set_attack_time(&mut self, attack_ms: f64, force: bool) {
        if !force && attack_ms == self.params.attack_time_ms {
            return;
        }
        self.params.attack_time_ms = attack_ms;
        self.attack_coeff = time_coefficient(attack_ms, self.sample_rate);
    }

    /// Set the release time. Skipped when unchanged unless `force` is set.
    pub fn set_release_time(&mut self, release_ms: f64, force: bool) {
        if !force && release_ms == self.params.release_time_ms {
            return;
        }
        self.params.release_time_ms = release_ms;
        self.release_coeff = time_coefficient(release_ms, self.sample_rate);
    }

    /// Feed one sample and return the envelope (linear or dB).
    #[inline]
    pub fn process(&mut self, xn: f64) -> f64 {
        let mut input = xn.abs();
        if self.params.detect_mode != DetectMode::Peak {
            input *= input;
        }

        let coeff = if input > self.last_envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        let mut envelope = flush_underflow(coeff * (self.last_envelope - input) + input);

        if self.params.clamp_to_unity_max {
            envelope = envelope.min(1.0);
        }
        envelope = envelope.max(0.0);
        self.last_envelope = envelope;

        if self.params.detect_mode == DetectMode::Rms {
            envelope = sqrt(envelope);
        }

        if !self.params.detect_db {
            return envelope;
        }
        if envelope <= 0.0 {
            return MIN_DB;
        }
        linear_to_db(envelope)
    }

    /// Last stored envelope (mean square for MS/RMS modes), without processing.
    pub fn last_envelope(&self) -> f64 {
        self.last_envelope
    }
}

/// One-pole coefficient for an analog time constant. Zero time is instantaneous.
fn time_coefficient(time_ms: f64, sample_rate: f64) -> f64 {
    let samples = time_ms * sample_rate * 0.001;
    if samples <= 0.0 {
        return 0.0;
    }
    exp(TC_LOG / samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector(mode: DetectMode, attack: f64, release: f64) -> AudioDetector {
        let mut d = AudioDetector::new(48000.0);
        d.set_parameters(AudioDetectorParameters {
            attack_time_ms: attack,
            release_time_ms: release,
            detect_mode: mode,
            ..Default::default()
        });
        d
    }

    #[test]
    fn test_attack_time_constant() {
        // after one attack time the envelope sits at 63.2% of a step
        let mut d = detector(DetectMode::Peak, 10.0, 100.0);
        let mut env = 0.0;
        for _ in 0..480 {
            env = d.process(1.0);
        }
        assert!((env - 0.632).abs() < 0.01, "envelope after 10 ms: {env}");
    }

    #[test]
    fn test_converges_monotonically() {
        let mut d = detector(DetectMode::Rms, 2.0, 20.0);
        let mut last = 0.0;
        for _ in 0..4800 {
            let env = d.process(0.7);
            assert!(env >= last, "{env} < {last}");
            last = env;
        }
        assert!((last - 0.7).abs() < 1e-3, "settled at {last}");
    }

    #[test]
    fn test_release() {
        let mut d = detector(DetectMode::Peak, 0.0, 5.0);
        d.process(1.0);
        let mut env = 1.0;
        for _ in 0..2400 {
            env = d.process(0.0);
        }
        assert!(env < 1e-3, "envelope after release: {env}");
    }

    #[test]
    fn test_clamped_to_unity() {
        let mut d = detector(DetectMode::MeanSquare, 0.0, 0.0);
        for x in [2.0, -3.5, 10.0] {
            let env = d.process(x);
            assert!(env <= 1.0, "clamped detector returned {env}");
        }
        let mut params = d.parameters();
        params.clamp_to_unity_max = false;
        d.set_parameters(params);
        assert_eq!(d.process(2.0), 4.0);
    }

    #[test]
    fn test_db_output() {
        let mut d = detector(DetectMode::Peak, 0.0, 0.0);
        let mut params = d.parameters();
        params.detect_db = true;
        d.set_parameters(params);
        assert_eq!(d.process(0.0), MIN_DB);
        let db = d.process(0.5);
        assert!((db + 6.0206).abs() < 1e-3, "{db}");
    }

    #[test]
    fn test_set_attack_skips_unchanged() {
        let mut d = detector(DetectMode::Peak, 10.0, 10.0);
        let coeff = d.attack_coeff;
        d.sample_rate = 96000.0;
        d.set_attack_time(10.0, false);
        assert_eq!(d.attack_coeff, coeff);
        d.set_attack_time(10.0, true);
        assert!(d.attack_coeff > coeff);
    }

    #[test]
    fn test_reset_clears_envelope() {
        let mut d = detector(DetectMode::Peak, 1.0, 1.0);
        d.process(0.9);
        d.reset(44100.0);
        assert_eq!(d.last_envelope(), 0.0);
    }
}
