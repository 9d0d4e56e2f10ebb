//! A biquad that owns its design parameters.
//!
//! [`AudioFilter`] pairs a [`Biquad`] with the [`FilterParameters`] it was designed
//! from. Coefficients are recalculated only when a parameter actually changes, and the
//! output applies the `c0`/`d0` blend so shelving and parametric designs work
//! unchanged.
//!
//! Two setters guard the configuration boundary:
//!
//! - [`AudioFilter::set_parameters`] never fails. Non-positive Q becomes 0.707, NaN
//!   fields keep their previous value and fc is clamped into `[1e-3, 0.4999 * fs]`.
//! - [`AudioFilter::try_set_parameters`] rejects the same values with
//!   [`DspError::InvalidParameter`] and leaves the filter untouched.

use crate::biquad::{Biquad, BiquadCoefficients, BiquadTopology};
use crate::effect::Effect;
use crate::error::DspError;
use crate::filter_design::{DEFAULT_Q, FilterParameters, calculate_coefficients};

/// Lowest accepted cutoff in Hz.
pub const MIN_FILTER_FREQUENCY: f64 = 1e-3;

/// Highest accepted cutoff as a fraction of the sample rate.
const MAX_FC_RATIO: f64 = 0.4999;

/// Second-order filter with change-detected coefficient design.
///
/// # Example
///
/// ```rust
/// use kinetone_core::{AudioFilter, FilterAlgorithm, FilterParameters};
///
/// let mut filter = AudioFilter::new(48000.0);
/// filter.set_parameters(FilterParameters::new(FilterAlgorithm::LowShelf, 200.0).with_boost_cut(6.0));
///
/// let mut y = 0.0;
/// for _ in 0..48000 {
///     y = filter.process(1.0);
/// }
/// // +6 dB at DC
/// assert!((y - 1.995).abs() < 0.01);
/// ```
#[derive(Debug, Clone)]
pub struct AudioFilter {
    biquad: Biquad,
    params: FilterParameters,
    coeffs: BiquadCoefficients,
    sample_rate: f64,
}

impl AudioFilter {
    /// Create a filter with default parameters (first-order LPF at 100 Hz).
    pub fn new(sample_rate: f64) -> Self {
        let params = FilterParameters::default();
        let coeffs = calculate_coefficients(&params, sample_rate);
        let mut biquad = Biquad::new(BiquadTopology::Direct);
        biquad.set_coefficients(coeffs);
        Self {
            biquad,
            params,
            coeffs,
            sample_rate,
        }
    }

    /// Clear the biquad state and redesign for `sample_rate`.
    pub fn reset(&mut self, sample_rate: f64) {
        self.biquad.reset();
        self.sample_rate = sample_rate;
        self.params.fc = self.clamp_fc(self.params.fc);
        self.recalculate();
    }

    /// Current sample rate.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Copy of the current design parameters.
    pub fn parameters(&self) -> FilterParameters {
        self.params
    }

    /// Current coefficients.
    pub fn coefficients(&self) -> BiquadCoefficients {
        self.coeffs
    }

    /// Apply new design parameters, clamping what cannot be realised.
    pub fn set_parameters(&mut self, params: FilterParameters) {
        let mut next = self.params;
        next.algorithm = params.algorithm;

        if !params.fc.is_nan() {
            next.fc = self.clamp_fc(params.fc);
        }
        if !params.q.is_nan() {
            next.q = if params.q <= 0.0 {
                #[cfg(feature = "tracing")]
                tracing::warn!(q = params.q, "non-positive Q replaced with {DEFAULT_Q}");
                DEFAULT_Q
            } else {
                params.q
            };
        }
        if params.boost_cut_db.is_finite() {
            next.boost_cut_db = params.boost_cut_db;
        }

        if next != self.params {
            self.params = next;
            self.recalculate();
        }
    }

    /// Apply new design parameters, rejecting anything that cannot be realised.
    ///
    /// # Errors
    ///
    /// [`DspError::InvalidParameter`] for non-finite values, `fc <= 0`,
    /// `fc >= fs / 2` or `q <= 0`. The filter is unchanged on error.
    pub fn try_set_parameters(&mut self, params: FilterParameters) -> Result<(), DspError> {
        let nyquist = self.sample_rate / 2.0;
        if !params.fc.is_finite() || params.fc <= 0.0 {
            return Err(DspError::invalid_parameter("fc", params.fc, "must be positive"));
        }
        if params.fc >= nyquist {
            return Err(DspError::invalid_parameter(
                "fc",
                params.fc,
                "must be below the Nyquist frequency",
            ));
        }
        if !params.q.is_finite() || params.q <= 0.0 {
            return Err(DspError::invalid_parameter("q", params.q, "must be positive"));
        }
        if !params.boost_cut_db.is_finite() {
            return Err(DspError::invalid_parameter(
                "boost_cut_db",
                params.boost_cut_db,
                "must be finite",
            ));
        }
        self.set_parameters(params);
        Ok(())
    }

    /// Switch the biquad topology. Clears the filter state.
    pub fn set_topology(&mut self, topology: BiquadTopology) {
        self.biquad.set_topology(topology);
    }

    /// Active topology.
    pub fn topology(&self) -> BiquadTopology {
        self.biquad.topology()
    }

    /// Filter one sample: `d0 * x + c0 * biquad(x)`.
    #[inline]
    pub fn process(&mut self, xn: f64) -> f64 {
        self.coeffs.d0 * xn + self.coeffs.c0 * self.biquad.process(xn)
    }

    /// Biquad storage component (see [`Biquad::storage_value`]).
    pub fn storage_value(&self) -> f64 {
        self.biquad.storage_value()
    }

    /// Biquad instantaneous gain (see [`Biquad::gain_value`]).
    pub fn gain_value(&self) -> f64 {
        self.biquad.gain_value()
    }

    fn clamp_fc(&self, fc: f64) -> f64 {
        let max = self.sample_rate * MAX_FC_RATIO;
        // A zero, negative or NaN rate leaves no realisable band above the floor
        let max = if max > MIN_FILTER_FREQUENCY {
            max
        } else {
            MIN_FILTER_FREQUENCY
        };
        let clamped = fc.clamp(MIN_FILTER_FREQUENCY, max);
        #[cfg(feature = "tracing")]
        if clamped != fc {
            tracing::warn!(fc, clamped, "filter cutoff clamped into the realisable range");
        }
        clamped
    }

    fn recalculate(&mut self) {
        self.coeffs = calculate_coefficients(&self.params, self.sample_rate);
        self.biquad.set_coefficients(self.coeffs);

        #[cfg(feature = "tracing")]
        tracing::trace!(
            algorithm = self.params.algorithm.name(),
            fc = self.params.fc,
            q = self.params.q,
            boost_cut_db = self.params.boost_cut_db,
            "filter coefficients recalculated"
        );
    }
}

impl Effect for AudioFilter {
    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        AudioFilter::process(self, input)
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        AudioFilter::reset(self, sample_rate);
    }

    fn reset(&mut self) {
        self.biquad.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter_design::FilterAlgorithm;

    #[test]
    fn test_non_positive_q_replaced() {
        let mut filter = AudioFilter::new(48000.0);
        filter.set_parameters(FilterParameters::new(FilterAlgorithm::Lpf2, 1000.0).with_q(0.0));
        assert_eq!(filter.parameters().q, DEFAULT_Q);
        filter.set_parameters(FilterParameters::new(FilterAlgorithm::Lpf2, 1000.0).with_q(-3.0));
        assert_eq!(filter.parameters().q, DEFAULT_Q);
    }

    #[test]
    fn test_fc_clamped() {
        let mut filter = AudioFilter::new(48000.0);
        filter.set_parameters(FilterParameters::new(FilterAlgorithm::ButterLpf2, 30000.0));
        let fc = filter.parameters().fc;
        assert!(fc < 24000.0, "fc not clamped: {fc}");
        assert!(filter.coefficients().is_finite());

        filter.set_parameters(FilterParameters::new(FilterAlgorithm::ButterLpf2, -5.0));
        assert_eq!(filter.parameters().fc, MIN_FILTER_FREQUENCY);
    }

    #[test]
    fn test_degenerate_sample_rate_does_not_panic() {
        for sample_rate in [0.0, -48000.0, f64::NAN] {
            let mut filter = AudioFilter::new(sample_rate);
            filter.set_parameters(FilterParameters::new(FilterAlgorithm::Lpf2, 1000.0));
            assert_eq!(filter.parameters().fc, MIN_FILTER_FREQUENCY);

            filter.reset(sample_rate);
            Effect::set_sample_rate(&mut filter, sample_rate);
            assert_eq!(filter.parameters().fc, MIN_FILTER_FREQUENCY);
        }

        // recovers once a real rate arrives
        let mut filter = AudioFilter::new(0.0);
        filter.reset(48000.0);
        filter.set_parameters(FilterParameters::new(FilterAlgorithm::Lpf2, 1000.0));
        assert_eq!(filter.parameters().fc, 1000.0);
        assert!(filter.coefficients().is_finite());
    }

    #[test]
    fn test_nan_keeps_previous() {
        let mut filter = AudioFilter::new(48000.0);
        filter.set_parameters(FilterParameters::new(FilterAlgorithm::Hpf2, 500.0).with_q(2.0));
        filter.set_parameters(FilterParameters {
            algorithm: FilterAlgorithm::Hpf2,
            fc: f64::NAN,
            q: f64::NAN,
            boost_cut_db: f64::NAN,
        });
        let p = filter.parameters();
        assert_eq!(p.fc, 500.0);
        assert_eq!(p.q, 2.0);
        assert_eq!(p.boost_cut_db, 0.0);
    }

    #[test]
    fn test_try_set_rejects() {
        let mut filter = AudioFilter::new(48000.0);
        let before = filter.parameters();

        let bad = [
            FilterParameters::new(FilterAlgorithm::Lpf2, 0.0),
            FilterParameters::new(FilterAlgorithm::Lpf2, 24000.0),
            FilterParameters::new(FilterAlgorithm::Lpf2, f64::INFINITY),
            FilterParameters::new(FilterAlgorithm::Lpf2, 1000.0).with_q(0.0),
            FilterParameters::new(FilterAlgorithm::LowShelf, 1000.0).with_boost_cut(f64::NAN),
        ];
        for params in bad {
            let err = filter.try_set_parameters(params);
            assert!(
                matches!(err, Err(DspError::InvalidParameter { .. })),
                "{params:?} accepted"
            );
            assert_eq!(filter.parameters(), before);
        }

        let good = FilterParameters::new(FilterAlgorithm::Lpf2, 1000.0).with_q(3.0);
        assert_eq!(filter.try_set_parameters(good), Ok(()));
        assert_eq!(filter.parameters(), good);
    }

    #[test]
    fn test_recalculates_only_on_change() {
        let mut filter = AudioFilter::new(48000.0);
        let params = FilterParameters::new(FilterAlgorithm::ButterLpf2, 1000.0);
        filter.set_parameters(params);
        let first = filter.coefficients();
        filter.set_parameters(params);
        assert_eq!(filter.coefficients(), first);

        filter.set_parameters(params.with_q(2.0));
        // Butterworth ignores Q, but the change is still picked up
        assert_eq!(filter.parameters().q, 2.0);
    }

    #[test]
    fn test_shelf_blend_applied() {
        let mut filter = AudioFilter::new(48000.0);
        filter.set_parameters(
            FilterParameters::new(FilterAlgorithm::HiShelf, 1000.0).with_boost_cut(-6.0),
        );
        let c = filter.coefficients();
        assert_eq!(c.d0, 1.0);
        assert!(c.c0 < 0.0);

        // DC passes untouched through a high shelf
        let mut y = 0.0;
        for _ in 0..4800 {
            y = filter.process(1.0);
        }
        assert!((y - 1.0).abs() < 1e-6, "DC through high shelf: {y}");
    }

    #[test]
    fn test_reset_new_rate_redesigns() {
        let mut filter = AudioFilter::new(48000.0);
        filter.set_parameters(FilterParameters::new(FilterAlgorithm::ButterLpf2, 20000.0));
        let at_48k = filter.coefficients();
        filter.reset(96000.0);
        assert_eq!(filter.sample_rate(), 96000.0);
        assert_ne!(filter.coefficients(), at_48k);
    }

    #[test]
    fn test_storage_gain_forwarded() {
        let mut filter = AudioFilter::new(48000.0);
        filter.set_parameters(FilterParameters::new(FilterAlgorithm::Apf1, 800.0));
        filter.process(0.5);
        assert_eq!(filter.gain_value(), filter.coefficients().a0);
        assert!(filter.storage_value() != 0.0);
    }
}
