//! File-based effect processing command.

use std::path::PathBuf;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use kinetone_config::{EffectChain, EffectConfig, Preset};
use kinetone_core::linear_to_db;
use kinetone_io::{AudioBuffer, ProcessingEngine, RenderOptions, WavSpec, read_wav, write_wav};

use super::common::{load_preset, parse_chain, parse_key_val};

#[derive(Args)]
pub struct ProcessArgs {
    /// Input WAV file (mono or stereo)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Single effect to apply
    #[arg(short, long, conflicts_with_all = ["chain", "preset"])]
    effect: Option<String>,

    /// Effect chain specification (e.g., "filter:fc=2kHz|delay:left_ms=300ms,feedback=40%")
    #[arg(short, long, conflicts_with = "preset")]
    chain: Option<String>,

    /// Preset name or TOML file
    #[arg(short, long)]
    preset: Option<String>,

    /// Effect parameters for --effect (e.g., "fc=800Hz")
    #[arg(long, value_parser = parse_key_val, number_of_values = 1, requires = "effect")]
    param: Vec<(String, String)>,

    /// Processing block size
    #[arg(long, default_value_t = 1024)]
    block_size: usize,

    /// Output bit depth
    #[arg(long, default_value_t = 32, value_parser = parse_bit_depth)]
    bit_depth: u16,

    /// Shift the output back by the chain's latency so it lines up with the input
    #[arg(long)]
    compensate_latency: bool,
}

fn parse_bit_depth(s: &str) -> Result<u16, String> {
    match s.parse() {
        Ok(bits @ (16 | 24 | 32)) => Ok(bits),
        _ => Err(format!("unsupported bit depth '{s}' (expected 16, 24 or 32)")),
    }
}

/// Effects requested on the command line, as a preset.
fn requested_preset(args: &ProcessArgs) -> anyhow::Result<Preset> {
    if let Some(name) = &args.preset {
        return load_preset(name);
    }
    if let Some(spec) = &args.chain {
        return Ok(Preset::new("command line").with_effects(parse_chain(spec)?));
    }
    if let Some(effect) = &args.effect {
        let config = args
            .param
            .iter()
            .fold(EffectConfig::new(effect.as_str()), |config, (key, value)| {
                config.with_param(key.as_str(), value.as_str())
            });
        return Ok(Preset::new("command line").with_effect(config));
    }
    anyhow::bail!("No effect specified. Use --effect, --chain, or --preset")
}

pub fn run(args: ProcessArgs) -> anyhow::Result<()> {
    let preset = requested_preset(&args)?;

    println!("Reading {}...", args.input.display());
    let (input, spec) = read_wav(&args.input)?;
    let sample_rate = f64::from(spec.sample_rate);
    println!(
        "  {} frames, {} channel(s), {} Hz, {:.2}s",
        input.num_frames(),
        input.num_channels(),
        spec.sample_rate,
        input.num_frames() as f64 / sample_rate
    );

    let chain = EffectChain::from_preset(&preset, sample_rate)?;
    if chain.is_empty() {
        anyhow::bail!("No effects to process");
    }
    println!(
        "Processing with {} ({})...",
        preset.name,
        chain.effect_types().join(" -> ")
    );

    let mut engine = ProcessingEngine::new(sample_rate);
    engine.add_effect(Box::new(chain));
    tracing::info!(
        latency = engine.latency_samples(),
        compensated = args.compensate_latency,
        "chain ready"
    );

    let pb = ProgressBar::new(input.num_frames() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let options = RenderOptions {
        block_size: args.block_size,
        compensate_latency: args.compensate_latency,
    };
    let output = engine.render(&input, &options, |done| pb.set_position(done as u64));
    pb.finish_with_message("done");

    println!("\nStats:");
    print_stats("Input: ", &input);
    print_stats("Output:", &output);

    let out_spec = WavSpec {
        bits_per_sample: args.bit_depth,
        ..spec
    };
    println!("\nWriting {}...", args.output.display());
    write_wav(&args.output, &output, out_spec)?;
    println!("Done!");

    Ok(())
}

fn print_stats(label: &str, buffer: &AudioBuffer) {
    let samples = buffer.to_interleaved();
    println!(
        "  {label} RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(rms(&samples)),
        linear_to_db(peak(&samples))
    );
}

fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f64).sqrt()
}

fn peak(samples: &[f64]) -> f64 {
    samples.iter().map(|s| s.abs()).fold(0.0, f64::max)
}
