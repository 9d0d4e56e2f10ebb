//! Convolution effect on the overlap-add fast convolver.
//!
//! By default the impulse response is a synthetic room tail: deterministic white noise
//! shaped by an exponential envelope that reaches -60 dB after the decay time, then
//! normalised to unit energy. [`ConvolutionEffect::set_impulse_response`] loads a
//! measured impulse instead.
//!
//! The convolver adds one block of latency, so the dry path runs through a delay line
//! of the same length and both paths stay aligned.

use kinetone_core::{CircularBuffer, DspError, Effect, ParamDescriptor, ParameterInfo};
use kinetone_spectral::FastConvolver;

/// Impulse response capacity in samples.
pub const CONVOLUTION_IR_LENGTH: usize = 4096;

const PARAMS: [ParamDescriptor; 2] = [
    ParamDescriptor::time_ms("Decay", "decay", 5.0, 85.0, 40.0),
    ParamDescriptor::percent("Mix", "mix", 0.0, 100.0, 35.0),
];

/// Fixed-latency convolution with a wet/dry mix.
///
/// ## Parameter Indices (`ParameterInfo`)
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Decay | 5–85 ms | 40.0 |
/// | 1 | Mix | 0–100% | 35.0 |
///
/// Setting the decay regenerates the synthetic impulse and replaces any custom one.
///
/// # Example
///
/// ```rust
/// use kinetone_core::Effect;
/// use kinetone_effects::ConvolutionEffect;
///
/// let mut verb = ConvolutionEffect::new(48000.0).unwrap();
/// assert_eq!(verb.latency_samples(), 4096);
///
/// let output = verb.process(0.5);
/// assert!(output.is_finite());
/// ```
#[derive(Debug)]
pub struct ConvolutionEffect {
    convolver: FastConvolver,
    dry_delay: CircularBuffer<f64>,
    ir: Vec<f64>,
    sample_rate: f64,
    decay_ms: f64,
    mix: f64,
}

impl ConvolutionEffect {
    /// Create a convolution effect with a 4096-sample impulse.
    ///
    /// # Errors
    ///
    /// Propagates [`FastConvolver::new`] failures.
    pub fn new(sample_rate: f64) -> Result<Self, DspError> {
        Self::with_ir_length(sample_rate, CONVOLUTION_IR_LENGTH)
    }

    /// Create a convolution effect for impulses of up to `ir_length` samples.
    ///
    /// # Errors
    ///
    /// [`DspError::InvalidLength`] unless `ir_length` is a non-zero power of two.
    pub fn with_ir_length(sample_rate: f64, ir_length: usize) -> Result<Self, DspError> {
        let convolver = FastConvolver::new(ir_length)?;
        let dry_delay = CircularBuffer::new(ir_length + 1)?;

        let mut effect = Self {
            convolver,
            dry_delay,
            ir: vec![0.0; ir_length],
            sample_rate,
            decay_ms: PARAMS[0].default,
            mix: PARAMS[1].default / 100.0,
        };
        effect.load_synthetic_ir()?;
        Ok(effect)
    }

    /// Load a custom impulse response, zero-extended to the capacity.
    ///
    /// # Errors
    ///
    /// [`DspError::LengthMismatch`] when `ir` is longer than the capacity.
    pub fn set_impulse_response(&mut self, ir: &[f64]) -> Result<(), DspError> {
        self.convolver.set_impulse_response(ir)?;
        self.ir.fill(0.0);
        self.ir[..ir.len()].copy_from_slice(ir);
        Ok(())
    }

    /// The impulse response in use.
    pub fn impulse_response(&self) -> &[f64] {
        &self.ir
    }

    /// Set the synthetic tail's decay time and regenerate it.
    pub fn set_decay_ms(&mut self, decay_ms: f64) {
        self.decay_ms = PARAMS[0].clamp(decay_ms);
        self.regenerate();
    }

    /// Set the wet share, 0.0 to 1.0.
    pub fn set_mix(&mut self, mix: f64) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    fn regenerate(&mut self) {
        // The buffer always matches the convolver capacity.
        if let Err(_err) = self.load_synthetic_ir() {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_err, "synthetic impulse rejected");
        }
    }

    fn load_synthetic_ir(&mut self) -> Result<(), DspError> {
        let decay_samples = (self.decay_ms * self.sample_rate / 1000.0).max(1.0);
        let mut state = 0x9e37_79b9_u32;
        let mut energy = 0.0;
        for (n, tap) in self.ir.iter_mut().enumerate() {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let noise = f64::from(state as i32) / f64::from(i32::MAX);
            // -60 dB at the decay time
            let envelope = libm::pow(10.0, -3.0 * n as f64 / decay_samples);
            *tap = noise * envelope;
            energy += *tap * *tap;
        }
        if energy > 0.0 {
            let norm = 1.0 / libm::sqrt(energy);
            for tap in &mut self.ir {
                *tap *= norm;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(decay_ms = self.decay_ms, length = self.ir.len(), "synthetic impulse");

        self.convolver.set_impulse_response(&self.ir)
    }
}

impl Effect for ConvolutionEffect {
    fn process(&mut self, input: f64) -> f64 {
        let wet = self.convolver.process(input);
        self.dry_delay.write(input);
        let dry = self.dry_delay.read(self.convolver.latency_samples());
        (1.0 - self.mix) * dry + self.mix * wet
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.regenerate();
        Effect::reset(self);
    }

    fn reset(&mut self) {
        self.convolver.reset();
        self.dry_delay.flush();
    }

    fn latency_samples(&self) -> usize {
        self.convolver.latency_samples()
    }
}

impl ParameterInfo for ConvolutionEffect {
    fn param_count(&self) -> usize {
        PARAMS.len()
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        PARAMS.get(index).copied()
    }

    fn get_param(&self, index: usize) -> f64 {
        match index {
            0 => self.decay_ms,
            1 => self.mix * 100.0,
            _ => 0.0,
        }
    }

    fn set_param(&mut self, index: usize, value: f64) {
        match index {
            0 => self.set_decay_ms(value),
            1 => self.set_mix(PARAMS[1].clamp(value) / 100.0),
            _ => {}
        }
    }
}
