//! Criterion benchmarks for kinetone effects
//!
//! Run with: cargo bench
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use kinetone_core::{Effect, EffectExt, ParameterInfo};
use kinetone_effects::{
    AudioDelay, ConvolutionEffect, EnvelopeFollower, Filter, ModDelayAlgorithm, ModulatedDelay,
    PhaseShifter, PitchShifter,
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

fn bench_effect<E: Effect>(c: &mut Criterion, name: &str, mut effect: E) {
    let mut group = c.benchmark_group(name);

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |b, _| {
                let mut output = vec![0.0; block_size];
                b.iter(|| {
                    effect.process_block(black_box(&input), &mut output);
                    black_box(output[0])
                })
            },
        );
    }

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    bench_effect(c, "Filter", Filter::new(SAMPLE_RATE));
}

fn bench_delay(c: &mut Criterion) {
    let mut effect = AudioDelay::with_sample_rate(SAMPLE_RATE);
    effect.set_param(3, 40.0);
    bench_effect(c, "AudioDelay", effect);
}

fn bench_stereo_delay(c: &mut Criterion) {
    let mut delay = AudioDelay::with_sample_rate(SAMPLE_RATE);
    delay.set_param(0, 1.0);
    delay.set_param(3, 40.0);
    let input = generate_test_signal(1024);

    c.bench_function("AudioDelay/ping_pong_frames", |b| {
        let mut frame = [0.0; 2];
        b.iter(|| {
            for &x in &input {
                delay.process_frame(black_box(&[x, -x]), &mut frame);
            }
            black_box(frame[0])
        })
    });
}

fn bench_modulated_delay(c: &mut Criterion) {
    for (name, algorithm) in [
        ("Flanger", ModDelayAlgorithm::Flanger),
        ("Chorus", ModDelayAlgorithm::Chorus),
        ("Vibrato", ModDelayAlgorithm::Vibrato),
    ] {
        bench_effect(c, name, ModulatedDelay::new(SAMPLE_RATE, algorithm));
    }
}

fn bench_phaser(c: &mut Criterion) {
    bench_effect(c, "Phaser", PhaseShifter::new(SAMPLE_RATE));
}

fn bench_envelope_follower(c: &mut Criterion) {
    bench_effect(c, "EnvelopeFollower", EnvelopeFollower::new(SAMPLE_RATE));
}

fn bench_pitch_shift(c: &mut Criterion) {
    if let Ok(mut effect) = PitchShifter::new(SAMPLE_RATE) {
        effect.set_param(0, 7.0);
        bench_effect(c, "PitchShifter", effect);
    }
}

fn bench_convolution(c: &mut Criterion) {
    if let Ok(effect) = ConvolutionEffect::new(SAMPLE_RATE) {
        bench_effect(c, "Convolution", effect);
    }
}

fn bench_effect_chain(c: &mut Criterion) {
    // phaser -> chorus -> delay
    let phaser = PhaseShifter::new(SAMPLE_RATE);
    let chorus = ModulatedDelay::new(SAMPLE_RATE, ModDelayAlgorithm::Chorus);
    let delay = {
        let mut d = AudioDelay::with_sample_rate(SAMPLE_RATE);
        d.set_param(5, 300.0);
        d.set_param(3, 40.0);
        d
    };

    bench_effect(c, "EffectChain", phaser.chain(chorus).chain(delay));
}

criterion_group!(
    benches,
    bench_filter,
    bench_delay,
    bench_stereo_delay,
    bench_modulated_delay,
    bench_phaser,
    bench_envelope_follower,
    bench_pitch_shift,
    bench_convolution,
    bench_effect_chain,
);

criterion_main!(benches);
