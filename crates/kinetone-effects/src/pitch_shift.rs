//! Pitch shifter effect on the peak-locked phase vocoder.

use kinetone_core::{DspError, Effect, ParamDescriptor, ParamUnit, ParameterInfo};
use kinetone_spectral::{
    MAX_PITCH_SHIFT_SEMITONES, PSM_FRAME_LENGTH, PsmVocoder, PsmVocoderParameters,
};

const PARAMS: [ParamDescriptor; 3] = [
    ParamDescriptor::new(
        "Pitch Shift",
        "semitones",
        ParamUnit::Semitones,
        -MAX_PITCH_SHIFT_SEMITONES,
        MAX_PITCH_SHIFT_SEMITONES,
        0.0,
    ),
    ParamDescriptor::toggle("Peak Locking", "locking", true),
    ParamDescriptor::toggle("Peak Tracking", "tracking", true),
];

/// Fixed-latency pitch shifter.
///
/// ## Parameter Indices (`ParameterInfo`)
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Pitch Shift | -24–24 semitones | 0.0 |
/// | 1 | Peak Locking | Off/On | On |
/// | 2 | Peak Tracking | Off/On | On |
///
/// Changing the shift reallocates the resampling buffers when the resampled frame
/// length changes, so automate it from a control thread rather than per sample.
///
/// # Example
///
/// ```rust
/// use kinetone_core::{Effect, ParameterInfo};
/// use kinetone_effects::PitchShifter;
///
/// let mut shifter = PitchShifter::new(48000.0).unwrap();
/// shifter.set_param(0, 12.0);
/// assert_eq!(shifter.latency_samples(), 4096);
///
/// let output = shifter.process(0.5);
/// assert!(output.is_finite());
/// ```
#[derive(Debug)]
pub struct PitchShifter {
    psm: PsmVocoder,
}

impl PitchShifter {
    /// Create a shifter with the default 4096-point frame.
    ///
    /// # Errors
    ///
    /// Propagates [`PsmVocoder::new`] failures.
    pub fn new(sample_rate: f64) -> Result<Self, DspError> {
        Self::with_frame_length(sample_rate, PSM_FRAME_LENGTH)
    }

    /// Create a shifter with a custom power-of-two frame length.
    ///
    /// # Errors
    ///
    /// [`DspError::InvalidLength`] unless `frame_length` is a power of two of at least 4.
    pub fn with_frame_length(sample_rate: f64, frame_length: usize) -> Result<Self, DspError> {
        let mut psm = PsmVocoder::new(frame_length)?;
        psm.reset(sample_rate);
        psm.set_parameters(PsmVocoderParameters {
            pitch_shift_semitones: 0.0,
            enable_peak_phase_locking: true,
            enable_peak_tracking: true,
        });
        Ok(Self { psm })
    }

    /// Copy of the current parameters.
    pub fn parameters(&self) -> PsmVocoderParameters {
        self.psm.parameters()
    }

    /// Apply new parameters.
    pub fn set_parameters(&mut self, params: PsmVocoderParameters) {
        self.psm.set_parameters(params);
    }

    /// The underlying vocoder.
    pub fn vocoder(&self) -> &PsmVocoder {
        &self.psm
    }

    fn update(&mut self, f: impl FnOnce(&mut PsmVocoderParameters)) {
        let mut params = self.psm.parameters();
        f(&mut params);
        self.psm.set_parameters(params);
    }
}

impl Effect for PitchShifter {
    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        self.psm.process(input)
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.psm.reset(sample_rate);
    }

    fn reset(&mut self) {
        let sample_rate = self.psm.sample_rate();
        self.psm.reset(sample_rate);
    }

    fn latency_samples(&self) -> usize {
        self.psm.latency_samples()
    }
}

impl ParameterInfo for PitchShifter {
    fn param_count(&self) -> usize {
        PARAMS.len()
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        PARAMS.get(index).copied()
    }

    fn get_param(&self, index: usize) -> f64 {
        let params = self.psm.parameters();
        match index {
            0 => params.pitch_shift_semitones,
            1 => f64::from(u8::from(params.enable_peak_phase_locking)),
            2 => f64::from(u8::from(params.enable_peak_tracking)),
            _ => 0.0,
        }
    }

    fn set_param(&mut self, index: usize, value: f64) {
        let Some(desc) = PARAMS.get(index) else {
            return;
        };
        let value = desc.clamp(value);
        match index {
            0 => self.update(|p| p.pitch_shift_semitones = value),
            1 => self.update(|p| p.enable_peak_phase_locking = value >= 0.5),
            2 => self.update(|p| p.enable_peak_tracking = value >= 0.5),
            _ => {}
        }
    }
}
