//! Integration tests for kinetone-io WAV I/O and offline rendering.

use kinetone_core::Effect;
use kinetone_effects::{EffectRegistry, EffectWithParams};
use kinetone_io::{
    AudioBuffer, Error, ProcessingEngine, RenderOptions, WavFormat, WavSpec, read_wav,
    read_wav_info, write_wav,
};
use tempfile::NamedTempFile;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sine_wave(sample_rate: u32, freq_hz: f64, num_samples: usize) -> Vec<f64> {
    (0..num_samples)
        .map(|i| {
            (2.0 * std::f64::consts::PI * freq_hz * i as f64 / f64::from(sample_rate)).sin() * 0.8
        })
        .collect()
}

fn impulse(len: usize) -> Vec<f64> {
    let mut samples = vec![0.0; len];
    samples[0] = 1.0;
    samples
}

fn roundtrip(buffer: &AudioBuffer, spec: WavSpec) -> (AudioBuffer, WavSpec) {
    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), buffer, spec).unwrap();
    read_wav(file.path()).unwrap()
}

fn max_error(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

fn registry_effect(id: &str, sample_rate: f64) -> Box<dyn EffectWithParams + Send> {
    EffectRegistry::new()
        .create(id, sample_rate)
        .unwrap_or_else(|| panic!("registry has no '{id}'"))
}

// ===========================================================================
// WAV roundtrips
// ===========================================================================

#[test]
fn wav_roundtrip_mono_every_depth() {
    let samples = sine_wave(44100, 440.0, 4410);
    for (bits, tolerance) in [(16, 1.0 / 32768.0), (24, 1.0 / 8_388_608.0), (32, 1e-7)] {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: bits,
        };
        let (loaded, loaded_spec) = roundtrip(&AudioBuffer::mono(samples.clone()), spec);
        assert_eq!(loaded_spec, spec);
        let err = max_error(&samples, loaded.channel(0).unwrap());
        assert!(err <= tolerance, "{bits}-bit error {err} above {tolerance}");
    }
}

#[test]
fn wav_roundtrip_stereo_keeps_channels_apart() {
    let left = sine_wave(48000, 440.0, 2400);
    let right = sine_wave(48000, 1000.0, 2400);
    let spec = WavSpec {
        channels: 2,
        sample_rate: 48000,
        bits_per_sample: 24,
    };
    let (loaded, loaded_spec) = roundtrip(&AudioBuffer::stereo(left.clone(), right.clone()), spec);

    assert_eq!(loaded_spec.channels, 2);
    assert!(max_error(&left, loaded.channel(0).unwrap()) < 1e-6);
    assert!(max_error(&right, loaded.channel(1).unwrap()) < 1e-6);
}

#[test]
fn wav_channel_count_comes_from_buffer() {
    let spec = WavSpec {
        channels: 1,
        ..WavSpec::default()
    };
    let (loaded, loaded_spec) = roundtrip(&AudioBuffer::stereo(vec![0.5; 8], vec![-0.5; 8]), spec);
    assert_eq!(loaded_spec.channels, 2);
    assert_eq!(loaded.channel(1).unwrap(), &[-0.5; 8]);
}

#[test]
fn wav_info_matches_written_file() {
    let file = NamedTempFile::new().unwrap();
    write_wav(
        file.path(),
        &AudioBuffer::mono(vec![0.0; 4800]),
        WavSpec::default(),
    )
    .unwrap();

    let info = read_wav_info(file.path()).unwrap();
    assert_eq!(info.channels, 1);
    assert_eq!(info.sample_rate, 48000);
    assert_eq!(info.bits_per_sample, 32);
    assert_eq!(info.num_frames, 4800);
    assert_eq!(info.format, WavFormat::IeeeFloat);
    assert!((info.duration_secs - 0.1).abs() < 1e-12);
}

#[test]
fn wav_errors() {
    assert!(matches!(
        read_wav("/nonexistent/kinetone/input.wav"),
        Err(Error::Wav(_))
    ));

    let file = NamedTempFile::new().unwrap();
    let spec = WavSpec {
        bits_per_sample: 8,
        ..WavSpec::default()
    };
    assert!(matches!(
        write_wav(file.path(), &AudioBuffer::mono(vec![0.0]), spec),
        Err(Error::UnsupportedBitDepth(8))
    ));
    assert!(matches!(
        write_wav(file.path(), &AudioBuffer::default(), WavSpec::default()),
        Err(Error::UnsupportedChannels(0))
    ));
}

// ===========================================================================
// Rendering with registry effects
// ===========================================================================

#[test]
fn ping_pong_delay_crosses_channels() {
    let sr = 48000.0;
    let mut delay = registry_effect("delay", sr);
    delay.effect_set_param(0, 1.0); // ping-pong
    delay.effect_set_param(1, 0.0); // wet 0 dB
    delay.effect_set_param(2, -60.0); // dry
    delay.effect_set_param(3, 0.0); // no feedback
    delay.effect_set_param(5, 5.0);
    delay.effect_set_param(6, 5.0);

    let mut engine = ProcessingEngine::new(sr);
    engine.add_effect(Box::new(delay));

    let input = AudioBuffer::stereo(impulse(1000), vec![0.0; 1000]);
    let output = engine.render(&input, &RenderOptions::default(), |_| {});
    let left = output.channel(0).unwrap();
    let right = output.channel(1).unwrap();

    // 5 ms at 48 kHz
    assert!((right[240] - 1.0).abs() < 1e-9, "right[240] = {}", right[240]);
    assert!(left[1..].iter().all(|&y| y.abs() < 1e-9));
    assert!(right[..240].iter().all(|&y| y.abs() < 1e-9));
}

#[test]
fn mono_delay_runs_through_blocks() {
    let sr = 48000.0;
    let mut delay = registry_effect("delay", sr);
    delay.effect_set_param(1, 0.0);
    delay.effect_set_param(2, -60.0);
    delay.effect_set_param(3, 0.0);
    delay.effect_set_param(5, 2.0);

    let mut engine = ProcessingEngine::new(sr);
    engine.add_effect(Box::new(delay));
    let options = RenderOptions {
        block_size: 64,
        compensate_latency: false,
    };
    let output = engine.render(&AudioBuffer::mono(impulse(500)), &options, |_| {});

    let samples = output.channel(0).unwrap();
    let peak = samples
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
        .map(|(i, _)| i);
    assert_eq!(peak, Some(96));
}

#[test]
fn latency_compensation_aligns_convolver_dry_path() {
    let sr = 48000.0;
    let mut convolver = registry_effect("convolver", sr);
    convolver.effect_set_param(1, 0.0); // fully dry

    let mut engine = ProcessingEngine::new(sr);
    engine.add_effect(Box::new(convolver));
    assert_eq!(engine.latency_samples(), 4096);

    let input = sine_wave(48000, 220.0, 6000);
    let options = RenderOptions {
        block_size: 512,
        compensate_latency: true,
    };
    let output = engine.render(&AudioBuffer::mono(input.clone()), &options, |_| {});

    assert_eq!(output.num_frames(), input.len());
    assert!(max_error(&input, output.channel(0).unwrap()) < 1e-12);
}

#[test]
fn rendered_file_roundtrips_through_wav() {
    let sr = 44100;
    let registry = EffectRegistry::new();
    let mut engine = ProcessingEngine::new(f64::from(sr));
    for id in ["filter", "phaser", "chorus"] {
        engine.add_effect(Box::new(registry.create(id, f64::from(sr)).unwrap()));
    }

    let input = AudioBuffer::mono(sine_wave(sr, 330.0, 8820));
    let mut progress = Vec::new();
    let output = engine.render(&input, &RenderOptions::default(), |done| progress.push(done));
    assert_eq!(progress.last(), Some(&8820));
    assert!(progress.windows(2).all(|w| w[0] < w[1]));

    let spec = WavSpec {
        channels: 1,
        sample_rate: sr,
        bits_per_sample: 32,
    };
    let (loaded, _) = roundtrip(&output, spec);
    assert!(max_error(output.channel(0).unwrap(), loaded.channel(0).unwrap()) < 1e-6);
}

#[test]
fn engine_reset_restores_initial_output() {
    let sr = 48000.0;
    let mut engine = ProcessingEngine::new(sr);
    engine.add_effect(Box::new(registry_effect("flanger", sr)));
    engine.add_effect(Box::new(registry_effect("delay", sr)));

    let input = sine_wave(48000, 500.0, 2048);
    let first = engine.process_file(&input, 256);
    engine.reset();
    let second = engine.process_file(&input, 256);
    assert!(max_error(&first, &second) < 1e-12);
    assert!(first.iter().all(|y| y.is_finite()));
}
