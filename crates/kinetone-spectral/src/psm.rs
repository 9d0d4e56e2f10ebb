//! Peak-locked phase vocoder pitch shifter.
//!
//! Pitch shifting by `alpha = 2^(semitones / 12)` in two moves per analysis frame:
//!
//! 1. **Phase propagation.** Each bin's phase advance over the hop is unwrapped
//!    against the bin's centre frequency and scaled by `alpha`, so the resynthesized
//!    frame runs `alpha` times faster in phase. With peak locking, only spectral peaks
//!    propagate; every other bin keeps its analysed phase offset from the peak whose
//!    region of influence it falls in, which preserves the vertical phase coherence of
//!    each partial. With peak tracking, a peak that moved between frames continues from
//!    the phase of the nearest previous peak.
//! 2. **Frame resampling.** The inverse-transformed frame of `N` samples is resampled
//!    onto `round(N / alpha)` samples under a Hann synthesis window and overlap-added
//!    at the analysis hop, which scales every frequency by `alpha` without changing
//!    duration.
//!
//! The analysis hop is `N / 4` (75% overlap). Phases are unwrapped with that hop, the
//! one between frames actually taken.
//!
//! # Example
//!
//! ```rust
//! use kinetone_spectral::{PsmVocoder, PsmVocoderParameters};
//!
//! let mut psm = PsmVocoder::new(1024).unwrap();
//! psm.set_parameters(PsmVocoderParameters {
//!     pitch_shift_semitones: 12.0,
//!     enable_peak_phase_locking: true,
//!     enable_peak_tracking: true,
//! });
//! assert_eq!(psm.resampled_frame_len(), 512);
//!
//! let y = psm.process(0.25);
//! assert_eq!(y, 0.0); // one frame of latency
//! ```

use std::f64::consts::TAU;

use kinetone_core::{DspError, principal_arg};
use rustfft::num_complex::Complex64;

use crate::resample::{Interpolation, resample_frame};
use crate::vocoder::PhaseVocoder;
use crate::window::WindowType;

/// Default analysis frame length.
pub const PSM_FRAME_LENGTH: usize = 4096;

/// Largest shift in either direction. Keeps the resampled frame within the vocoder's
/// output ring.
pub const MAX_PITCH_SHIFT_SEMITONES: f64 = 24.0;

/// Bins quieter than this are never peaks.
const PEAK_THRESHOLD: f64 = 1e-5;

/// Pitch shifter configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PsmVocoderParameters {
    /// Shift in semitones, clamped to +-24.
    pub pitch_shift_semitones: f64,
    /// Lock non-peak bins to their region's peak.
    pub enable_peak_phase_locking: bool,
    /// Continue moving peaks from the nearest previous-frame peak.
    pub enable_peak_tracking: bool,
}

/// Per-bin analysis of one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BinData {
    /// Local maximum above the peak threshold.
    pub is_peak: bool,
    /// Bin magnitude (unnormalized FFT scale).
    pub magnitude: f64,
    /// Analysed phase.
    pub phi: f64,
    /// Synthesis phase.
    pub psi: f64,
    /// Peak whose region of influence contains this bin. `None` when the frame has
    /// no peaks.
    pub local_peak_bin: Option<usize>,
    /// Previous-frame peak this peak continues from.
    pub previous_peak_bin: Option<usize>,
}

/// Phase propagation state across frames.
#[derive(Debug, Clone)]
struct PhasePropagator {
    frame_length: usize,
    bins: Vec<BinData>,
    phi: Vec<f64>,
    psi: Vec<f64>,
    psi_previous: Vec<f64>,
    peaks: Vec<usize>,
    previous_peaks: Vec<usize>,
}

impl PhasePropagator {
    fn new(frame_length: usize) -> Self {
        let bins = frame_length / 2 + 1;
        Self {
            frame_length,
            bins: vec![BinData::default(); bins],
            phi: vec![0.0; bins],
            psi: vec![0.0; bins],
            psi_previous: vec![0.0; bins],
            peaks: Vec::with_capacity(bins),
            previous_peaks: Vec::with_capacity(bins),
        }
    }

    fn reset(&mut self) {
        self.bins.fill(BinData::default());
        self.phi.fill(0.0);
        self.psi.fill(0.0);
        self.psi_previous.fill(0.0);
        self.peaks.clear();
        self.previous_peaks.clear();
    }

    /// Rewrite `spectrum` with propagated phases.
    fn process(
        &mut self,
        spectrum: &mut [Complex64],
        alpha: f64,
        hop: f64,
        params: &PsmVocoderParameters,
    ) {
        let n = self.frame_length;
        let half = n / 2;
        let locking = params.enable_peak_phase_locking;

        for (bin, value) in self.bins.iter_mut().zip(spectrum.iter()) {
            *bin = BinData {
                magnitude: value.norm(),
                phi: value.arg(),
                ..BinData::default()
            };
        }
        core::mem::swap(&mut self.psi, &mut self.psi_previous);

        if locking {
            self.find_peaks_and_regions(params.enable_peak_tracking);
        } else {
            self.peaks.clear();
        }

        for k in 0..=half {
            let bin = self.bins[k];
            let omega = TAU * k as f64 / n as f64;
            let deviation = bin.phi - self.phi[k] - omega * hop;
            let delta_phi = omega * hop + principal_arg(deviation);
            self.phi[k] = bin.phi;

            // Non-peak bins inside a region are locked in the second pass
            if locking && !bin.is_peak && bin.local_peak_bin.is_some() {
                continue;
            }
            let base = bin
                .previous_peak_bin
                .map_or(self.psi_previous[k], |p| self.psi_previous[p]);
            let psi = principal_arg(base + alpha * delta_phi);
            self.psi[k] = psi;
            self.bins[k].psi = psi;
        }

        if locking {
            for k in 0..=half {
                let bin = self.bins[k];
                if bin.is_peak {
                    continue;
                }
                if let Some(p) = bin.local_peak_bin {
                    let peak = self.bins[p];
                    let psi = principal_arg(peak.psi - peak.phi + bin.phi);
                    self.psi[k] = psi;
                    self.bins[k].psi = psi;
                }
            }
        }

        for (value, bin) in spectrum.iter_mut().zip(&self.bins) {
            *value = Complex64::from_polar(bin.magnitude, bin.psi);
        }
        for k in 1..half {
            spectrum[n - k] = spectrum[k].conj();
        }

        core::mem::swap(&mut self.peaks, &mut self.previous_peaks);
    }

    fn find_peaks_and_regions(&mut self, tracking: bool) {
        let half = self.frame_length / 2;
        self.peaks.clear();

        for k in 0..=half {
            let magnitude = self.bins[k].magnitude;
            let is_peak = magnitude > PEAK_THRESHOLD
                && [k.checked_sub(2), k.checked_sub(1), Some(k + 1), Some(k + 2)]
                    .into_iter()
                    .all(|j| magnitude > self.magnitude_at(j));
            if is_peak {
                self.bins[k].is_peak = true;
                self.bins[k].previous_peak_bin = if tracking {
                    self.nearest_previous_peak(k)
                } else {
                    None
                };
                self.peaks.push(k);
            }
        }

        if self.peaks.is_empty() {
            return;
        }

        // Regions of influence split halfway between adjacent peaks
        let mut current = 0;
        for k in 0..=half {
            while current + 1 < self.peaks.len() {
                let boss = self.peaks[current];
                let next = self.peaks[current + 1];
                if k < next - (next - boss) / 2 {
                    break;
                }
                current += 1;
            }
            self.bins[k].local_peak_bin = Some(self.peaks[current]);
        }
    }

    fn magnitude_at(&self, bin: Option<usize>) -> f64 {
        bin.and_then(|j| self.bins.get(j))
            .map_or(0.0, |b| b.magnitude)
    }

    /// Nearest previous-frame peak within a quarter frame.
    fn nearest_previous_peak(&self, bin: usize) -> Option<usize> {
        debug_assert!(
            self.previous_peaks.is_sorted(),
            "previous peak list must be ascending"
        );
        let max_distance = self.frame_length / 4;
        let mut best: Option<(usize, usize)> = None;
        for &previous in &self.previous_peaks {
            let distance = previous.abs_diff(bin);
            if distance > max_distance {
                if previous > bin {
                    break;
                }
                continue;
            }
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((previous, distance));
            }
        }
        best.map(|(p, _)| p)
    }
}

/// Synthesis window and resampled output frame for the current ratio.
#[derive(Debug, Clone)]
struct FrameResampler {
    time_frame: Vec<f64>,
    window: Vec<f64>,
    correction: f64,
    output: Vec<f64>,
    interpolation: Interpolation,
}

impl FrameResampler {
    fn new(frame_length: usize) -> Self {
        let mut resampler = Self {
            time_frame: vec![0.0; frame_length],
            window: Vec::new(),
            correction: 0.0,
            output: Vec::new(),
            interpolation: Interpolation::Linear,
        };
        resampler.allocate(frame_length, frame_length, frame_length / 4);
        resampler
    }

    /// Hann synthesis window of `length`, gain-corrected so that an unmodified frame
    /// overlap-added at `hop` reproduces its input.
    fn allocate(&mut self, frame_length: usize, length: usize, hop: usize) {
        self.window = (0..length)
            .map(|i| WindowType::Hann.value(i, length))
            .collect();
        let energy: f64 = self.window.iter().map(|w| w * w).sum();
        self.correction = if energy > 0.0 {
            hop as f64 / (frame_length as f64 * energy)
        } else {
            0.0
        };
        self.output = vec![0.0; length];
    }

    fn resample(&mut self, ifft: &[Complex64]) -> &[f64] {
        for (sample, bin) in self.time_frame.iter_mut().zip(ifft) {
            *sample = bin.re;
        }
        resample_frame(
            &self.time_frame,
            &mut self.output,
            self.interpolation,
            self.correction,
            Some(&self.window),
        );
        &self.output
    }
}

/// Pitch shifter on a Hann, 75%-overlap [`PhaseVocoder`].
#[derive(Debug)]
pub struct PsmVocoder {
    vocoder: PhaseVocoder,
    params: PsmVocoderParameters,
    propagator: PhasePropagator,
    resampler: FrameResampler,
    frame_length: usize,
    sample_rate: f64,
    alpha: f64,
    hs: f64,
    ha: f64,
}

impl PsmVocoder {
    /// Create a pitch shifter with `frame_length` analysis frames (see
    /// [`PSM_FRAME_LENGTH`]) and no shift.
    ///
    /// # Errors
    ///
    /// [`DspError::InvalidLength`] unless `frame_length` is a power of two of at
    /// least 4.
    pub fn new(frame_length: usize) -> Result<Self, DspError> {
        DspError::require_power_of_two("pitch shifter frame length", frame_length)?;
        if frame_length < 4 {
            return Err(DspError::InvalidLength {
                what: "pitch shifter frame length",
                length: frame_length,
            });
        }
        let hop = frame_length / 4;
        Ok(Self {
            vocoder: PhaseVocoder::new(frame_length, hop, WindowType::Hann)?,
            params: PsmVocoderParameters::default(),
            propagator: PhasePropagator::new(frame_length),
            resampler: FrameResampler::new(frame_length),
            frame_length,
            sample_rate: 48000.0,
            alpha: 1.0,
            hs: hop as f64,
            ha: hop as f64,
        })
    }

    /// Clear all signal and phase state.
    pub fn reset(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.vocoder.reset();
        self.propagator.reset();
    }

    /// Sample rate last passed to [`PsmVocoder::reset`].
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Copy of the current parameters.
    pub fn parameters(&self) -> PsmVocoderParameters {
        self.params
    }

    /// Apply new parameters; a changed shift goes through
    /// [`PsmVocoder::set_pitch_shift`].
    pub fn set_parameters(&mut self, params: PsmVocoderParameters) {
        if params.pitch_shift_semitones != self.params.pitch_shift_semitones {
            self.set_pitch_shift(params.pitch_shift_semitones);
        }
        self.params = PsmVocoderParameters {
            pitch_shift_semitones: self.params.pitch_shift_semitones,
            ..params
        };
    }

    /// Set the shift in semitones.
    ///
    /// Reallocates the synthesis window and output frame when `round(N / alpha)`
    /// changes, so this is not realtime safe. A ratio that rounds to the current frame
    /// length is recorded in the parameters but keeps the current `alpha`.
    pub fn set_pitch_shift(&mut self, semitones: f64) {
        if semitones.is_nan() {
            return;
        }
        let clamped = semitones.clamp(-MAX_PITCH_SHIFT_SEMITONES, MAX_PITCH_SHIFT_SEMITONES);
        #[cfg(feature = "tracing")]
        if clamped != semitones {
            tracing::warn!(semitones, clamped, "pitch shift clamped");
        }

        let alpha = (clamped / 12.0).exp2();
        let length = ((self.frame_length as f64 / alpha).round() as usize).max(1);
        self.params.pitch_shift_semitones = clamped;
        if length == self.resampler.output.len() {
            #[cfg(feature = "tracing")]
            tracing::trace!(semitones = clamped, length, "pitch ratio unchanged");
            return;
        }

        self.alpha = alpha;
        self.ha = self.hs / alpha;
        self.resampler
            .allocate(self.frame_length, length, self.vocoder.hop_size());

        #[cfg(feature = "tracing")]
        tracing::debug!(
            semitones = clamped,
            alpha,
            resampled_frame_len = length,
            "pitch shifter reallocated"
        );
    }

    /// Choose the frame resampling kernel.
    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.resampler.interpolation = interpolation;
    }

    /// Pitch ratio, `2^(semitones / 12)`.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Synthesis hop in samples.
    pub fn synthesis_hop(&self) -> f64 {
        self.hs
    }

    /// Equivalent analysis hop of a time stretch by `alpha`, `hs / alpha`.
    pub fn analysis_hop(&self) -> f64 {
        self.ha
    }

    /// Length each frame is resampled to, `round(N / alpha)`.
    pub fn resampled_frame_len(&self) -> usize {
        self.resampler.output.len()
    }

    /// Analysis frame length.
    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    /// Input-to-output delay in samples.
    pub fn latency_samples(&self) -> usize {
        self.vocoder.latency_samples()
    }

    /// Analysis of the most recent frame.
    pub fn bins(&self) -> &[BinData] {
        &self.propagator.bins
    }

    /// Shift one sample.
    pub fn process(&mut self, input: f64) -> f64 {
        let (output, frame) = self.vocoder.process_sample(input);
        let Some(mut frame) = frame else {
            return output;
        };

        self.propagator
            .process(frame.spectrum_mut(), self.alpha, self.hs, &self.params);
        let shifted = self.resampler.resample(frame.inverse_fft());
        frame.overlap_add_with(shifted);
        output
    }
}
