//! Criterion benchmarks for kinetone-spectral components
//!
//! Run with: cargo bench -p kinetone-spectral
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use kinetone_spectral::{
    Complex64, FastConvolver, Fft, PhaseVocoder, PsmVocoder, PsmVocoderParameters, WindowType,
};
use std::f64::consts::PI;

const SAMPLE_RATE: f64 = 48000.0;
const BLOCK_SIZE: usize = 1024;

/// Generate a test sine wave
fn generate_sine(size: usize, frequency: f64) -> Vec<f64> {
    (0..size)
        .map(|i| (2.0 * PI * frequency * i as f64 / SAMPLE_RATE).sin())
        .collect()
}

// ============================================================================
// FFT benchmarks
// ============================================================================

fn bench_fft(c: &mut Criterion) {
    let mut group = c.benchmark_group("FFT_Forward");

    for &size in &[256, 1024, 4096] {
        let mut fft = Fft::new(size).unwrap();
        let input: Vec<Complex64> = generate_sine(size, 440.0)
            .into_iter()
            .map(|x| Complex64::new(x, 0.0))
            .collect();
        let mut buffer = input.clone();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                fft.forward(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}

// ============================================================================
// Streaming benchmarks
// ============================================================================

fn bench_vocoder(c: &mut Criterion) {
    let mut group = c.benchmark_group("PhaseVocoder");
    let input = generate_sine(BLOCK_SIZE, 440.0);

    for &frame_length in &[512, 2048] {
        let mut vocoder = PhaseVocoder::new(frame_length, frame_length / 4, WindowType::Hann).unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(frame_length),
            &frame_length,
            |b, _| {
                b.iter(|| {
                    for &x in &input {
                        black_box(vocoder.process_sample(black_box(x)).0);
                    }
                })
            },
        );
    }

    group.finish();
}

fn bench_convolver(c: &mut Criterion) {
    let mut group = c.benchmark_group("FastConvolver");
    let input = generate_sine(BLOCK_SIZE, 440.0);

    for &ir_length in &[256, 1024, 4096] {
        let mut convolver = FastConvolver::new(ir_length).unwrap();
        let ir: Vec<f64> = (0..ir_length)
            .map(|k| (-(k as f64) / (ir_length as f64 / 8.0)).exp())
            .collect();
        convolver.set_impulse_response(&ir).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(ir_length), &ir_length, |b, _| {
            b.iter(|| {
                for &x in &input {
                    black_box(convolver.process(black_box(x)));
                }
            })
        });
    }

    group.finish();
}

fn bench_psm(c: &mut Criterion) {
    let mut group = c.benchmark_group("PsmVocoder");
    let input = generate_sine(BLOCK_SIZE, 440.0);

    for (name, locking) in [("independent", false), ("peak_locked", true)] {
        let mut psm = PsmVocoder::new(4096).unwrap();
        psm.set_parameters(PsmVocoderParameters {
            pitch_shift_semitones: 5.0,
            enable_peak_phase_locking: locking,
            enable_peak_tracking: locking,
        });
        group.bench_function(name, |b| {
            b.iter(|| {
                for &x in &input {
                    black_box(psm.process(black_box(x)));
                }
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fft, bench_vocoder, bench_convolver, bench_psm);

criterion_main!(benches);
