//! Integration tests for kinetone-spectral.
//!
//! Tests exercise the vocoder, fast convolver and pitch shifter with synthetic
//! signals whose correct output is known: delayed copies, direct-form convolution and
//! zero-crossing frequency estimates.

use std::f64::consts::TAU;

use kinetone_spectral::{
    FastConvolver, Interpolation, PhaseVocoder, PsmVocoder, PsmVocoderParameters, WindowType,
};

const SAMPLE_RATE: f64 = 48000.0;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Generate a sine wave at a given frequency and amplitude.
fn sine(freq_hz: f64, num_samples: usize, amplitude: f64) -> Vec<f64> {
    (0..num_samples)
        .map(|i| amplitude * (TAU * freq_hz * i as f64 / SAMPLE_RATE).sin())
        .collect()
}

/// Deterministic white noise in [-1, 1).
fn noise(num_samples: usize) -> Vec<f64> {
    let mut state = 0x1234_5678_u32;
    (0..num_samples)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            f64::from(state as i32) / f64::from(i32::MAX)
        })
        .collect()
}

/// RMS of a signal slice.
fn rms(signal: &[f64]) -> f64 {
    (signal.iter().map(|x| x * x).sum::<f64>() / signal.len() as f64).sqrt()
}

/// Frequency from interpolated positive-going zero crossings.
fn zero_crossing_frequency(signal: &[f64]) -> f64 {
    let crossings: Vec<f64> = signal
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[0] < 0.0 && w[1] >= 0.0)
        .map(|(n, w)| n as f64 + w[0] / (w[0] - w[1]))
        .collect();
    assert!(crossings.len() > 2, "no periodic signal found");
    let span = crossings[crossings.len() - 1] - crossings[0];
    (crossings.len() - 1) as f64 * SAMPLE_RATE / span
}

fn run_psm(semitones: f64, freq_hz: f64, frame_length: usize) -> Vec<f64> {
    let mut psm = PsmVocoder::new(frame_length).unwrap();
    psm.set_parameters(PsmVocoderParameters {
        pitch_shift_semitones: semitones,
        enable_peak_phase_locking: true,
        enable_peak_tracking: true,
    });
    sine(freq_hz, 48000, 0.5)
        .into_iter()
        .map(|x| psm.process(x))
        .collect()
}

// ===========================================================================
// 1. Phase vocoder
// ===========================================================================

#[test]
fn vocoder_reproduces_steady_sine_at_fixed_latency() {
    let n = 2048;
    let mut vocoder = PhaseVocoder::new(n, n / 4, WindowType::Hann).unwrap();
    assert_eq!(vocoder.latency_samples(), n);

    let input = sine(1234.5, 16384, 0.8);
    let output: Vec<f64> = input
        .iter()
        .map(|&x| vocoder.process_sample(x).0)
        .collect();

    for i in 2 * n..input.len() {
        let expected = input[i - n];
        assert!(
            (output[i] - expected).abs() < 0.01 * 0.8,
            "sample {i}: {} vs {expected}",
            output[i]
        );
    }
}

#[test]
fn vocoder_reconstructs_with_every_window_at_matching_overlap() {
    // Hann and Hamming are constant-overlap-add at 75%; rectangular at any hop
    for (window, hop) in [
        (WindowType::Hann, 256),
        (WindowType::Hamming, 256),
        (WindowType::Rectangular, 512),
        (WindowType::Rectangular, 1024),
    ] {
        let mut vocoder = PhaseVocoder::new(1024, hop, window).unwrap();
        let input = noise(8192);
        let output: Vec<f64> = input
            .iter()
            .map(|&x| vocoder.process_sample(x).0)
            .collect();
        for i in 2048..input.len() {
            assert!(
                (output[i] - input[i - 1024]).abs() < 1e-9,
                "{window:?}/{hop} sample {i}"
            );
        }
    }
}

#[test]
fn vocoder_spectral_gain_scales_output() {
    let mut vocoder = PhaseVocoder::new(1024, 256, WindowType::Hann).unwrap();
    let input = sine(500.0, 8192, 1.0);
    let mut output = Vec::with_capacity(input.len());
    for &x in &input {
        let (y, frame) = vocoder.process_sample(x);
        if let Some(mut frame) = frame {
            for bin in frame.spectrum_mut() {
                *bin *= 0.5;
            }
            frame.synthesize();
        }
        output.push(y);
    }
    // Output lags by one frame
    let ratio = rms(&output[4096..]) / rms(&input[3072..8192 - 1024]);
    assert!((ratio - 0.5).abs() < 1e-6, "gain ratio {ratio}");
}

// ===========================================================================
// 2. Fast convolver
// ===========================================================================

#[test]
fn identity_convolver_reproduces_input_after_ir_length() {
    let mut convolver = FastConvolver::new(512).unwrap();
    let mut ir = vec![0.0; 512];
    ir[0] = 1.0;
    convolver.set_impulse_response(&ir).unwrap();
    assert_eq!(convolver.latency_samples(), 512);

    let input = noise(4096);
    let output: Vec<f64> = input.iter().map(|&x| convolver.process(x)).collect();

    for (i, &y) in output.iter().enumerate().take(512) {
        assert_eq!(y, 0.0, "sample {i} before latency");
    }
    for i in 512..input.len() {
        assert!(
            (output[i] - input[i - 512]).abs() < 1e-9,
            "sample {i}: {} vs {}",
            output[i],
            input[i - 512]
        );
    }
}

#[test]
fn convolver_matches_direct_convolution() {
    let ir_length = 256;
    let ir: Vec<f64> = noise(ir_length)
        .iter()
        .enumerate()
        .map(|(k, &r)| r * (-(k as f64) / 40.0).exp())
        .collect();
    let mut convolver = FastConvolver::new(ir_length).unwrap();
    convolver.set_impulse_response(&ir).unwrap();

    let input = sine(440.0, 3000, 0.7);
    let output: Vec<f64> = input.iter().map(|&x| convolver.process(x)).collect();

    for n in ir_length..input.len() {
        let m = n - ir_length;
        let expected: f64 = (0..=m.min(ir_length - 1))
            .map(|k| ir[k] * input[m - k])
            .sum();
        assert!(
            (output[n] - expected).abs() < 1e-9,
            "n={n}: {} vs {expected}",
            output[n]
        );
    }
}

#[test]
fn convolver_reset_clears_tail() {
    let mut convolver = FastConvolver::new(64).unwrap();
    convolver.set_impulse_response(&[1.0; 64]).unwrap();
    for _ in 0..100 {
        convolver.process(1.0);
    }
    convolver.reset();
    for _ in 0..256 {
        assert_eq!(convolver.process(0.0), 0.0);
    }
}

// ===========================================================================
// 3. PSM pitch shifter
// ===========================================================================

#[test]
fn psm_zero_shift_keeps_frequency() {
    let output = run_psm(0.0, 700.0, 2048);
    let freq = zero_crossing_frequency(&output[8192..]);
    assert!(
        (freq - 700.0).abs() < 0.7,
        "expected 700 Hz, measured {freq:.3} Hz"
    );
}

#[test]
fn psm_octave_up_doubles_frequency() {
    let output = run_psm(12.0, 700.0, 2048);
    let freq = zero_crossing_frequency(&output[8192..]);
    assert!(
        (freq - 1400.0).abs() < 1.4,
        "expected 1400 Hz, measured {freq:.3} Hz"
    );
}

#[test]
fn psm_octave_down_halves_frequency() {
    let output = run_psm(-12.0, 700.0, 2048);
    let freq = zero_crossing_frequency(&output[16384..]);
    assert!(
        (freq - 350.0).abs() < 0.35,
        "expected 350 Hz, measured {freq:.3} Hz"
    );
}

#[test]
fn psm_without_locking_stays_finite_and_shifted() {
    let mut psm = PsmVocoder::new(2048).unwrap();
    psm.set_interpolation(Interpolation::Lagrange4);
    psm.set_parameters(PsmVocoderParameters {
        pitch_shift_semitones: 7.0,
        ..Default::default()
    });
    let output: Vec<f64> = sine(500.0, 32768, 0.5)
        .into_iter()
        .map(|x| psm.process(x))
        .collect();
    assert!(output.iter().all(|y| y.is_finite()));

    let expected = 500.0 * 2f64.powf(7.0 / 12.0);
    let freq = zero_crossing_frequency(&output[8192..]);
    assert!(
        (freq - expected).abs() < expected * 0.01,
        "expected {expected:.1} Hz, measured {freq:.3} Hz"
    );
}

#[test]
fn psm_unshifted_level_is_unity() {
    let output = run_psm(0.0, 1000.0, 1024);
    let level = rms(&output[4096..]);
    let expected = 0.5 / 2f64.sqrt();
    assert!(
        (level - expected).abs() < expected * 0.01,
        "rms {level} vs {expected}"
    );
}

#[test]
fn psm_shifted_level_holds() {
    let expected = 0.5 / 2f64.sqrt();
    for semitones in [-12.0, -7.0, 7.0, 12.0] {
        let output = run_psm(semitones, 440.0, 2048);
        // skip the latency and the first overlapping frames
        let steady = &output[16384..];

        let level = rms(steady);
        assert!(
            (level - expected).abs() < expected * 0.05,
            "{semitones:+} st: rms {level:.4} vs {expected:.4}"
        );

        for (i, chunk) in steady.chunks_exact(2048).enumerate() {
            let chunk_level = rms(chunk);
            assert!(
                (chunk_level - expected).abs() < expected * 0.15,
                "{semitones:+} st: chunk {i} rms {chunk_level:.4}"
            );
        }
    }
}
