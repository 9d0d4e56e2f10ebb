//! Criterion benchmarks for kinetone-core DSP primitives
//!
//! Run with: cargo bench -p kinetone-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use kinetone_core::{
    AudioDetector, AudioDetectorParameters, Biquad, BiquadTopology, CircularBuffer, DetectMode,
    FilterAlgorithm, FilterParameters, Lfo, LfoWaveform, OscillatorParameters,
    calculate_coefficients,
};

const SAMPLE_RATE: f64 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 256, 1024];

fn generate_test_signal(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE;
            (2.0 * std::f64::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_biquad(c: &mut Criterion) {
    let mut group = c.benchmark_group("Biquad");
    let coeffs = calculate_coefficients(
        &FilterParameters::new(FilterAlgorithm::ButterLpf2, 1000.0),
        SAMPLE_RATE,
    );

    for topology in [
        BiquadTopology::Direct,
        BiquadTopology::Canonical,
        BiquadTopology::TransposedDirect,
        BiquadTopology::TransposedCanonical,
    ] {
        for &block_size in BLOCK_SIZES {
            let input = generate_test_signal(block_size);
            group.bench_with_input(
                BenchmarkId::new(format!("{topology:?}"), block_size),
                &block_size,
                |b, _| {
                    let mut biquad = Biquad::new(topology);
                    biquad.set_coefficients(coeffs);
                    b.iter(|| {
                        for &sample in &input {
                            black_box(biquad.process(black_box(sample)));
                        }
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_coefficient_design(c: &mut Criterion) {
    let mut group = c.benchmark_group("Coefficients");
    for algorithm in [
        FilterAlgorithm::ButterLpf2,
        FilterAlgorithm::MmaLpf2,
        FilterAlgorithm::CqParaEq,
        FilterAlgorithm::MatchBp2A,
    ] {
        let params = FilterParameters::new(algorithm, 1000.0)
            .with_q(2.0)
            .with_boost_cut(6.0);
        group.bench_function(algorithm.name(), |b| {
            b.iter(|| black_box(calculate_coefficients(black_box(&params), SAMPLE_RATE)));
        });
    }
    group.finish();
}

fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("CircularBuffer");
    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);
        group.bench_with_input(
            BenchmarkId::new("fractional", block_size),
            &block_size,
            |b, _| {
                let mut buffer = CircularBuffer::<f64>::new(4800).unwrap();
                b.iter(|| {
                    for &sample in &input {
                        let y = buffer.read_fractional(black_box(1234.56));
                        buffer.write(sample + 0.5 * y);
                        black_box(y);
                    }
                });
            },
        );
    }
    group.finish();
}

fn bench_detector_and_lfo(c: &mut Criterion) {
    let mut group = c.benchmark_group("Modulation");
    let input = generate_test_signal(1024);

    group.bench_function("detector_rms_db", |b| {
        let mut detector = AudioDetector::new(SAMPLE_RATE);
        detector.set_parameters(AudioDetectorParameters {
            attack_time_ms: 10.0,
            release_time_ms: 100.0,
            detect_mode: DetectMode::Rms,
            detect_db: true,
            clamp_to_unity_max: true,
        });
        b.iter(|| {
            for &sample in &input {
                black_box(detector.process(black_box(sample)));
            }
        });
    });

    group.bench_function("lfo_sin", |b| {
        let mut lfo = Lfo::new(SAMPLE_RATE);
        lfo.set_parameters(OscillatorParameters {
            waveform: LfoWaveform::Sin,
            frequency_hz: 0.5,
        });
        b.iter(|| {
            for _ in 0..1024 {
                black_box(lfo.render());
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_biquad,
    bench_coefficient_design,
    bench_delay,
    bench_detector_and_lfo,
);

criterion_main!(benches);
