//! Delay-line all-pass filter.
//!
//! ```text
//! w[n] = x[n] + g * d[n]
//! y[n] = d[n] - g * w[n]
//! ```
//!
//! where `d[n]` is the delay line output. The magnitude response is flat; the phase
//! smears transients, which is what reverb diffusion stages want. An optional one-pole
//! low-pass on `d[n]` darkens the recirculation.

use crate::delay::CircularBuffer;
use crate::error::DspError;
use crate::math::{flush_underflow, ms_to_samples};

/// Delay all-pass configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DelayApfParameters {
    /// Delay in milliseconds.
    pub delay_ms: f64,
    /// All-pass coefficient, stable for |g| < 1.
    pub apf_g: f64,
    /// Low-pass the delayed sample.
    pub enable_lpf: bool,
    /// Low-pass coefficient, 0 (none) to 1.
    pub lpf_g: f64,
}

/// All-pass filter built on a [`CircularBuffer`].
#[derive(Debug, Clone)]
pub struct DelayApf {
    params: DelayApfParameters,
    buffer: CircularBuffer<f64>,
    buffer_length_ms: f64,
    sample_rate: f64,
    delay_in_samples: f64,
    lpf_state: f64,
}

impl DelayApf {
    /// Create an all-pass able to delay up to `max_delay_ms`.
    ///
    /// # Errors
    ///
    /// [`DspError::InvalidLength`] when the buffer would be empty.
    pub fn new(sample_rate: f64, max_delay_ms: f64) -> Result<Self, DspError> {
        let mut apf = Self {
            params: DelayApfParameters::default(),
            buffer: CircularBuffer::new(1)?,
            buffer_length_ms: 0.0,
            sample_rate,
            delay_in_samples: 1.0,
            lpf_state: 0.0,
        };
        apf.create_delay_buffer(sample_rate, max_delay_ms)?;
        Ok(apf)
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
        self.buffer_length_ms = buffer_length_ms;
        let length = ms_to_samples(buffer_length_ms.max(0.0), sample_rate) as usize + 1;
        self.buffer.create(length)?;
        self.update_delay();
        Ok(())
    }

    /// Clear state. A new sample rate reallocates the delay line.
    ///
    /// # Errors
    ///
    /// Propagates [`DelayApf::create_delay_buffer`] failures.
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
    pub fn parameters(&self) -> DelayApfParameters {
        self.params
    }

    /// Apply new parameters. `apf_g` is clamped into (-1, 1).
    pub fn set_parameters(&mut self, params: DelayApfParameters) {
        self.params = DelayApfParameters {
            apf_g: params.apf_g.clamp(-0.999, 0.999),
            ..params
        };
        self.update_delay();
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, xn: f64) -> f64 {
        let mut delayed = self.buffer.read_fractional(self.delay_in_samples - 1.0);

        if self.params.enable_lpf {
            delayed = flush_underflow(
                delayed * (1.0 - self.params.lpf_g) + self.params.lpf_g * self.lpf_state,
            );
            self.lpf_state = delayed;
        }

        let g = self.params.apf_g;
        let wn = flush_underflow(xn + g * delayed);
        let yn = delayed - g * wn;

        self.buffer.write(wn);
        yn
    }

    fn update_delay(&mut self) {
        let max_delay = (self.buffer.len() - 1) as f64;
        self.delay_in_samples =
            ms_to_samples(self.params.delay_ms, self.sample_rate).clamp(1.0, max_delay.max(1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apf(delay_ms: f64, g: f64) -> DelayApf {
        let mut a = DelayApf::new(48000.0, 50.0).unwrap();
        a.set_parameters(DelayApfParameters {
            delay_ms,
            apf_g: g,
            ..Default::default()
        });
        a
    }

    #[test]
    fn test_impulse_response() {
        let mut a = apf(1.0, 0.5);
        // y[0] = -g
        assert_eq!(a.process(1.0), -0.5);
        for _ in 1..48 {
            assert_eq!(a.process(0.0), 0.0);
        }
        // y[D] = 1 - g^2
        assert!((a.process(0.0) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_energy_preserved() {
        let mut a = apf(0.5, 0.7);
        let mut energy = 0.0;
        let y0 = a.process(1.0);
        energy += y0 * y0;
        for _ in 0..48000 {
            let y = a.process(0.0);
            energy += y * y;
        }
        assert!((energy - 1.0).abs() < 1e-6, "all-pass energy {energy}");
    }

    #[test]
    fn test_g_clamped() {
        let a = apf(1.0, 3.0);
        assert!(a.parameters().apf_g < 1.0);
    }

    #[test]
    fn test_reset_new_rate_reallocates() {
        let mut a = apf(1.0, 0.5);
        a.reset(96000.0).unwrap();
        assert_eq!(a.buffer.len(), 8192);
    }
}
