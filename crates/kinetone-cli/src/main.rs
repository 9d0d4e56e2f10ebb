//! kinetone CLI - offline effect processing and filter inspection.

mod commands;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

const EXAMPLES: &str = "\
Examples:
  kinetone effects delay
  kinetone process in.wav out.wav --effect filter --param fc=2kHz
  kinetone process in.wav out.wav --chain \"phaser:rate=0.3Hz|!delay\"
  kinetone process in.wav out.wav --preset octave_up --compensate-latency
  kinetone response --algorithm low_shelf --fc 200 --boost-cut -6";

/// Offline DSP effects: filters, delays, modulation, pitch and convolution.
#[derive(Parser)]
#[command(name = "kinetone", version, propagate_version = true, after_help = EXAMPLES)]
struct Cli {
    /// More log output: -v for debug, -vv for trace (RUST_LOG wins when set)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a WAV file through an effect, a chain or a preset
    Process(commands::process::ProcessArgs),

    /// Tabulate the magnitude response of a filter design
    Response(commands::response::ResponseArgs),

    /// List effects, or show one effect's parameters
    Effects(commands::effects::EffectsArgs),
}

/// Log filter used when `RUST_LOG` is not set.
fn log_level(verbose: u8, quiet: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Progress bars and tables go to stdout; logs stay on stderr.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(cli.verbose, cli.quiet)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Process(args) => commands::process::run(args),
        Commands::Response(args) => commands::response::run(&args),
        Commands::Effects(args) => commands::effects::run(&args),
    }
}
