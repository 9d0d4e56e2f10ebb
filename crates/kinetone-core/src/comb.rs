//! Feedback comb filter.
//!
//! A delay line whose output is fed back into its input with gain
//! `g = 10^(-3 * delay / rt60)`, so a recirculating impulse decays by 60 dB in `rt60`.
//! An optional one-pole low-pass in the loop damps high frequencies on every pass.

use libm::pow;

use crate::delay::CircularBuffer;
use crate::error::DspError;
use crate::math::{flush_underflow, ms_to_samples};

/// Comb filter configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombFilterParameters {
    /// Loop delay in milliseconds.
    pub delay_ms: f64,
    /// Time for the loop to decay by 60 dB, in milliseconds.
    pub rt60_ms: f64,
    /// Insert the damping low-pass in the loop.
    pub enable_lpf: bool,
    /// Damping amount, 0 (none) to 1.
    pub lpf_g: f64,
}

impl Default for CombFilterParameters {
    fn default() -> Self {
        Self {
            delay_ms: 0.0,
            rt60_ms: 0.0,
            enable_lpf: false,
            lpf_g: 0.0,
        }
    }
}

/// Feedback comb filter on a [`CircularBuffer`].
///
/// # Example
///
/// ```rust
/// use kinetone_core::{CombFilter, CombFilterParameters};
///
/// let mut comb = CombFilter::new(48000.0, 100.0).unwrap();
/// comb.set_parameters(CombFilterParameters {
///     delay_ms: 10.0,
///     rt60_ms: 500.0,
///     ..Default::default()
/// });
///
/// comb.process(1.0);
/// let mut echo = 0.0;
/// for _ in 0..480 {
///     echo = comb.process(0.0);
/// }
/// assert_eq!(echo, 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct CombFilter {
    params: CombFilterParameters,
    buffer: CircularBuffer<f64>,
    buffer_length_ms: f64,
    sample_rate: f64,
    samples_per_ms: f64,
    delay_in_samples: f64,
    comb_g: f64,
    lpf_state: f64,
}

impl CombFilter {
    /// Create a comb filter able to delay up to `max_delay_ms`.
    ///
    /// # Errors
    ///
    /// [`DspError::InvalidLength`] when the buffer would be empty.
    pub fn new(sample_rate: f64, max_delay_ms: f64) -> Result<Self, DspError> {
        let mut comb = Self {
            params: CombFilterParameters::default(),
            buffer: CircularBuffer::new(1)?,
            buffer_length_ms: 0.0,
            sample_rate,
            samples_per_ms: sample_rate / 1000.0,
            delay_in_samples: 0.0,
            comb_g: 0.0,
            lpf_state: 0.0,
        };
        comb.create_delay_buffer(sample_rate, max_delay_ms)?;
        Ok(comb)
    }

    /// Reallocate the delay line for `buffer_length_ms` at `sample_rate`.
    ///
    /// # Errors
    ///
    /// [`DspError::InvalidLength`] when the buffer would be empty.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn create_delay_buffer(
        &mut self,
        sample_rate: f64,
        buffer_length_ms: f64,
    ) -> Result<(), DspError> {
        self.sample_rate = sample_rate;
        self.samples_per_ms = sample_rate / 1000.0;
        self.buffer_length_ms = buffer_length_ms;
        let length = (self.samples_per_ms * buffer_length_ms.max(0.0)) as usize + 1;
        self.buffer.create(length)?;
        self.update_coefficients();
        Ok(())
    }

    /// Clear state. A new sample rate reallocates the delay line.
    ///
    /// # Errors
    ///
    /// Propagates [`CombFilter::create_delay_buffer`] failures.
    pub fn reset(&mut self, sample_rate: f64) -> Result<(), DspError> {
        self.lpf_state = 0.0;
        if sample_rate == self.sample_rate {
            self.buffer.flush();
            Ok(())
        } else {
            self.create_delay_buffer(sample_rate, self.buffer_length_ms)
        }
    }

    /// Copy of the current parameters.
    pub fn parameters(&self) -> CombFilterParameters {
        self.params
    }

    /// Apply new parameters and recompute the loop gain.
    pub fn set_parameters(&mut self, params: CombFilterParameters) {
        self.params = params;
        self.update_coefficients();
    }

    /// Loop gain `g`.
    pub fn comb_g(&self) -> f64 {
        self.comb_g
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, xn: f64) -> f64 {
        let yn = self.buffer.read_fractional(self.delay_in_samples - 1.0);

        let input = if self.params.enable_lpf {
            let g2 = self.params.lpf_g * (1.0 - self.comb_g);
            let filtered = flush_underflow(yn + g2 * self.lpf_state);
            self.lpf_state = filtered;
            xn + self.comb_g * filtered
        } else {
            xn + self.comb_g * yn
        };

        self.buffer.write(flush_underflow(input));
        yn
    }

    fn update_coefficients(&mut self) {
        let max_delay = (self.buffer.len() - 1) as f64;
        self.delay_in_samples = ms_to_samples(self.params.delay_ms, self.sample_rate)
            .clamp(1.0, max_delay.max(1.0));
        self.comb_g = if self.params.rt60_ms > 0.0 {
            pow(10.0, -3.0 * self.params.delay_ms / self.params.rt60_ms)
        } else {
            0.0
        };
    }
}
