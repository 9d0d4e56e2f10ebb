//! Stereo feedback delay with normal and ping-pong routing.
//!
//! Each channel owns a [`CircularBuffer`]. The delayed sample is read before the
//! write for the current sample, the line is fed `x + feedback * delayed`, and the
//! output mixes dry and wet levels given in dB:
//!
//! ```text
//! y[n] = dry * x[n] + wet * d[n]
//! d[n] = line[n - D]
//! line[n] = x[n] + fb * d[n]
//! ```
//!
//! In ping-pong mode the stereo path writes the left channel's feedback sum into the
//! right line and the right channel's into the left, so repeats alternate sides.

use kinetone_core::{
    CircularBuffer, DspError, Effect, ParamDescriptor, ParameterInfo, db_to_linear,
    flush_underflow, ms_to_samples,
};

/// Default delay buffer length.
pub const DEFAULT_BUFFER_MS: f64 = 2000.0;

/// Channel routing of the feedback path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DelayAlgorithm {
    /// Each channel feeds back into itself.
    #[default]
    Normal,
    /// Feedback crosses between channels.
    PingPong,
}

/// How the right channel's delay time is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DelayUpdateType {
    /// Left and right times are set independently.
    #[default]
    LeftAndRight,
    /// Right time is `delay_ratio_pct` percent of the left time.
    LeftPlusRatio,
}

/// Audio delay configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioDelayParameters {
    /// Feedback routing.
    pub algorithm: DelayAlgorithm,
    /// Delayed signal level in dB.
    pub wet_level_db: f64,
    /// Input signal level in dB.
    pub dry_level_db: f64,
    /// Feedback amount in percent.
    pub feedback_pct: f64,
    /// Right channel time source.
    pub update_type: DelayUpdateType,
    /// Left delay in milliseconds.
    pub left_delay_ms: f64,
    /// Right delay in milliseconds (with [`DelayUpdateType::LeftAndRight`]).
    pub right_delay_ms: f64,
    /// Right/left ratio in percent (with [`DelayUpdateType::LeftPlusRatio`]).
    pub delay_ratio_pct: f64,
}

impl Default for AudioDelayParameters {
    fn default() -> Self {
        Self {
            algorithm: DelayAlgorithm::Normal,
            wet_level_db: -3.0,
            dry_level_db: -3.0,
            feedback_pct: 0.0,
            update_type: DelayUpdateType::LeftAndRight,
            left_delay_ms: 250.0,
            right_delay_ms: 250.0,
            delay_ratio_pct: 100.0,
        }
    }
}

const PARAMS: [ParamDescriptor; 8] = [
    ParamDescriptor::choice("Algorithm", "algorithm", 2, 0),
    ParamDescriptor::gain_db("Wet Level", "wet", -60.0, 12.0, -3.0),
    ParamDescriptor::gain_db("Dry Level", "dry", -60.0, 12.0, -3.0),
    ParamDescriptor::percent("Feedback", "feedback", 0.0, 99.0, 0.0),
    ParamDescriptor::choice("Update Type", "update_type", 2, 0),
    ParamDescriptor::time_ms("Left Delay", "left_ms", 0.0, DEFAULT_BUFFER_MS, 250.0),
    ParamDescriptor::time_ms("Right Delay", "right_ms", 0.0, DEFAULT_BUFFER_MS, 250.0),
    ParamDescriptor::percent("Delay Ratio", "ratio", 0.0, 100.0, 100.0),
];

/// Two-channel feedback delay.
///
/// ## Parameter Indices (`ParameterInfo`)
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Algorithm | 0 normal, 1 ping-pong | 0 |
/// | 1 | Wet Level | -60–12 dB | -3.0 |
/// | 2 | Dry Level | -60–12 dB | -3.0 |
/// | 3 | Feedback | 0–99% | 0.0 |
/// | 4 | Update Type | 0 left and right, 1 left plus ratio | 0 |
/// | 5 | Left Delay | 0–2000 ms | 250.0 |
/// | 6 | Right Delay | 0–2000 ms | 250.0 |
/// | 7 | Delay Ratio | 0–100% | 100.0 |
///
/// Delays shorter than one sample are read at one sample; longer than the buffer,
/// at the buffer length.
///
/// # Example
///
/// ```rust
/// use kinetone_effects::{AudioDelay, AudioDelayParameters, DelayAlgorithm};
///
/// let mut delay = AudioDelay::new();
/// delay.reset(48000.0);
/// delay.set_parameters(AudioDelayParameters {
///     algorithm: DelayAlgorithm::PingPong,
///     feedback_pct: 50.0,
///     left_delay_ms: 100.0,
///     right_delay_ms: 150.0,
///     ..Default::default()
/// });
///
/// let mut output = [0.0; 2];
/// assert!(delay.process_frame(&[0.5, 0.5], &mut output));
/// ```
#[derive(Debug, Clone)]
pub struct AudioDelay {
    params: AudioDelayParameters,
    sample_rate: f64,
    buffer_length_ms: f64,
    delay_samples_left: f64,
    delay_samples_right: f64,
    wet_mix: f64,
    dry_mix: f64,
    feedback: f64,
    delay_buffer_left: CircularBuffer<f64>,
    delay_buffer_right: CircularBuffer<f64>,
}

impl Default for AudioDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioDelay {
    /// Create an unallocated delay. Call [`AudioDelay::reset`] or
    /// [`AudioDelay::create_delay_buffers`] before processing.
    pub fn new() -> Self {
        let mut delay = Self {
            params: AudioDelayParameters::default(),
            sample_rate: 0.0,
            buffer_length_ms: DEFAULT_BUFFER_MS,
            delay_samples_left: 1.0,
            delay_samples_right: 1.0,
            wet_mix: 0.0,
            dry_mix: 0.0,
            feedback: 0.0,
            delay_buffer_left: CircularBuffer::default(),
            delay_buffer_right: CircularBuffer::default(),
        };
        delay.set_parameters(AudioDelayParameters::default());
        delay
    }

    /// Create a delay with [`DEFAULT_BUFFER_MS`] of buffer at `sample_rate`.
    pub fn with_sample_rate(sample_rate: f64) -> Self {
        let mut delay = Self::new();
        delay.reset(sample_rate);
        delay
    }

    /// Flush the lines when `sample_rate` is unchanged, otherwise reallocate them.
    pub fn reset(&mut self, sample_rate: f64) {
        if sample_rate == self.sample_rate {
            self.delay_buffer_left.flush();
            self.delay_buffer_right.flush();
            return;
        }
        self.allocate(sample_rate, self.buffer_length_ms);
    }

    /// Reallocate both lines to hold `buffer_length_ms` at `sample_rate`.
    ///
    /// # Errors
    ///
    /// [`DspError::InvalidParameter`] when `buffer_length_ms` is not a positive finite
    /// value; the delay is unchanged.
    pub fn create_delay_buffers(
        &mut self,
        sample_rate: f64,
        buffer_length_ms: f64,
    ) -> Result<(), DspError> {
        if !buffer_length_ms.is_finite() || buffer_length_ms <= 0.0 {
            return Err(DspError::invalid_parameter(
                "buffer_length_ms",
                buffer_length_ms,
                "must be positive",
            ));
        }
        self.allocate(sample_rate, buffer_length_ms);
        Ok(())
    }

    /// Copy of the current parameters.
    pub fn parameters(&self) -> AudioDelayParameters {
        self.params
    }

    /// Apply new parameters. Levels and times take effect on the next sample.
    pub fn set_parameters(&mut self, params: AudioDelayParameters) {
        self.params = params;
        self.wet_mix = db_to_linear(params.wet_level_db);
        self.dry_mix = db_to_linear(params.dry_level_db);
        self.feedback = params.feedback_pct / 100.0;
        self.update_delay_times();
    }

    /// Set both delay times without touching levels or feedback.
    pub fn set_delay_times_ms(&mut self, left_delay_ms: f64, right_delay_ms: f64) {
        self.params.left_delay_ms = left_delay_ms;
        self.params.right_delay_ms = right_delay_ms;
        self.update_delay_times();
    }

    /// Current sample rate (0 before the first reset).
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Buffer capacity in milliseconds.
    pub fn buffer_length_ms(&self) -> f64 {
        self.buffer_length_ms
    }

    /// Effective left and right delays in samples.
    pub fn delay_samples(&self) -> (f64, f64) {
        (self.delay_samples_left, self.delay_samples_right)
    }

    /// Process one mono sample through the left line.
    #[inline]
    pub fn process(&mut self, xn: f64) -> f64 {
        let delayed = self
            .delay_buffer_left
            .read_fractional(self.delay_samples_left - 1.0);
        self.delay_buffer_left
            .write(flush_underflow(xn + self.feedback * delayed));
        self.dry_mix * xn + self.wet_mix * delayed
    }

    /// Process one frame.
    ///
    /// Returns false when either slice is empty. A single output channel runs the mono
    /// path on channel 0. With two or more outputs, channels 0 and 1 run through both
    /// lines (a mono input feeds both) and any further outputs are silenced.
    pub fn process_frame(&mut self, input: &[f64], output: &mut [f64]) -> bool {
        if input.is_empty() || output.is_empty() {
            return false;
        }
        let xn_left = input[0];
        if output.len() == 1 {
            output[0] = self.process(xn_left);
            return true;
        }
        let xn_right = input.get(1).copied().unwrap_or(xn_left);

        let yn_left = self
            .delay_buffer_left
            .read_fractional(self.delay_samples_left - 1.0);
        let yn_right = self
            .delay_buffer_right
            .read_fractional(self.delay_samples_right - 1.0);

        let dn_left = flush_underflow(xn_left + self.feedback * yn_left);
        let dn_right = flush_underflow(xn_right + self.feedback * yn_right);

        match self.params.algorithm {
            DelayAlgorithm::Normal => {
                self.delay_buffer_left.write(dn_left);
                self.delay_buffer_right.write(dn_right);
            }
            DelayAlgorithm::PingPong => {
                self.delay_buffer_left.write(dn_right);
                self.delay_buffer_right.write(dn_left);
            }
        }

        output[0] = self.dry_mix * xn_left + self.wet_mix * yn_left;
        output[1] = self.dry_mix * xn_right + self.wet_mix * yn_right;
        output[2..].fill(0.0);
        true
    }

    pub(crate) fn allocate(&mut self, sample_rate: f64, buffer_length_ms: f64) {
        self.sample_rate = sample_rate;
        self.buffer_length_ms = buffer_length_ms;
        let length = ms_to_samples(buffer_length_ms, sample_rate).max(0.0) as usize + 1;
        self.delay_buffer_left.resize(length);
        self.delay_buffer_right.resize(length);
        self.update_delay_times();
    }

    fn update_delay_times(&mut self) {
        let params = &self.params;
        let left = ms_to_samples(params.left_delay_ms, self.sample_rate);
        let right = match params.update_type {
            DelayUpdateType::LeftAndRight => ms_to_samples(params.right_delay_ms, self.sample_rate),
            DelayUpdateType::LeftPlusRatio => {
                left * (params.delay_ratio_pct / 100.0).clamp(0.0, 1.0)
            }
        };
        let max_delay = (self.delay_buffer_left.len() - 1) as f64;
        self.delay_samples_left = left.min(max_delay).max(1.0);
        self.delay_samples_right = right.min(max_delay).max(1.0);
    }

    fn update(&mut self, f: impl FnOnce(&mut AudioDelayParameters)) {
        let mut params = self.params;
        f(&mut params);
        self.set_parameters(params);
    }
}

impl Effect for AudioDelay {
    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        AudioDelay::process(self, input)
    }

    fn process_frame(&mut self, input: &[f64], output: &mut [f64]) -> bool {
        AudioDelay::process_frame(self, input, output)
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        AudioDelay::reset(self, sample_rate);
    }

    fn reset(&mut self) {
        self.delay_buffer_left.flush();
        self.delay_buffer_right.flush();
    }
}

impl ParameterInfo for AudioDelay {
    fn param_count(&self) -> usize {
        PARAMS.len()
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        PARAMS.get(index).copied()
    }

    fn get_param(&self, index: usize) -> f64 {
        let p = &self.params;
        match index {
            0 => f64::from(u8::from(p.algorithm == DelayAlgorithm::PingPong)),
            1 => p.wet_level_db,
            2 => p.dry_level_db,
            3 => p.feedback_pct,
            4 => f64::from(u8::from(p.update_type == DelayUpdateType::LeftPlusRatio)),
            5 => p.left_delay_ms,
            6 => p.right_delay_ms,
            7 => p.delay_ratio_pct,
            _ => 0.0,
        }
    }

    fn set_param(&mut self, index: usize, value: f64) {
        let Some(desc) = PARAMS.get(index) else {
            return;
        };
        let value = desc.clamp(value);
        match index {
            0 => {
                self.update(|p| {
                    p.algorithm = if value >= 1.0 {
                        DelayAlgorithm::PingPong
                    } else {
                        DelayAlgorithm::Normal
                    };
                });
            }
            1 => self.update(|p| p.wet_level_db = value),
            2 => self.update(|p| p.dry_level_db = value),
            3 => self.update(|p| p.feedback_pct = value),
            4 => {
                self.update(|p| {
                    p.update_type = if value >= 1.0 {
                        DelayUpdateType::LeftPlusRatio
                    } else {
                        DelayUpdateType::LeftAndRight
                    };
                });
            }
            5 => self.update(|p| p.left_delay_ms = value),
            6 => self.update(|p| p.right_delay_ms = value),
            7 => self.update(|p| p.delay_ratio_pct = value),
            _ => {}
        }
    }
}
