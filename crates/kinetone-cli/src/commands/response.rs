//! Filter magnitude response command.

use std::f64::consts::PI;

use clap::Args;
use kinetone_core::{
    DEFAULT_Q, FilterAlgorithm, FilterParameters, calculate_coefficients, magnitude_response_db,
};

#[derive(Args)]
pub struct ResponseArgs {
    /// Filter algorithm, by name (e.g. butter_lpf2) or index
    #[arg(short, long, value_parser = parse_algorithm)]
    algorithm: FilterAlgorithm,

    /// Cutoff or center frequency in Hz
    #[arg(long)]
    fc: f64,

    /// Quality factor
    #[arg(short, long, default_value_t = DEFAULT_Q)]
    q: f64,

    /// Boost or cut in dB (shelves and parametric EQs)
    #[arg(short, long, default_value_t = 0.0, allow_hyphen_values = true)]
    boost_cut: f64,

    /// Sample rate in Hz
    #[arg(short, long, default_value_t = 48000.0)]
    sample_rate: f64,

    /// Number of log-spaced frequencies from 20 Hz to Nyquist
    #[arg(short, long, default_value_t = 32)]
    points: usize,
}

fn parse_algorithm(s: &str) -> Result<FilterAlgorithm, String> {
    if let Ok(index) = s.parse::<usize>() {
        return FilterAlgorithm::from_index(index).ok_or_else(|| {
            format!(
                "algorithm index {index} out of range (0-{})",
                FilterAlgorithm::ALL.len() - 1
            )
        });
    }
    s.parse().map_err(|_| {
        let names: Vec<&str> = FilterAlgorithm::ALL.iter().map(|a| a.name()).collect();
        format!("unknown algorithm '{s}' (expected one of: {})", names.join(", "))
    })
}

/// `points` log-spaced frequencies from 20 Hz up to just below Nyquist.
fn log_frequencies(sample_rate: f64, points: usize) -> Vec<f64> {
    const LOW: f64 = 20.0;
    let high = sample_rate * 0.4999;
    match points {
        0 => Vec::new(),
        1 => vec![LOW],
        n => {
            let ratio = (high / LOW).ln() / (n - 1) as f64;
            (0..n).map(|i| LOW * (ratio * i as f64).exp()).collect()
        }
    }
}

/// (frequency, magnitude dB) pairs of one filter design.
fn response(params: &FilterParameters, sample_rate: f64, points: usize) -> Vec<(f64, f64)> {
    let coeffs = calculate_coefficients(params, sample_rate);
    log_frequencies(sample_rate, points)
        .into_iter()
        .map(|freq| {
            let theta = 2.0 * PI * freq / sample_rate;
            (freq, magnitude_response_db(theta, &coeffs))
        })
        .collect()
}

pub fn run(args: &ResponseArgs) -> anyhow::Result<()> {
    if !(args.sample_rate.is_finite() && args.sample_rate > 0.0) {
        anyhow::bail!("sample rate must be positive, got {}", args.sample_rate);
    }
    if !(args.fc.is_finite() && args.fc > 0.0) {
        anyhow::bail!("fc must be positive, got {}", args.fc);
    }

    let params = FilterParameters::new(args.algorithm, args.fc)
        .with_q(args.q)
        .with_boost_cut(args.boost_cut);

    println!(
        "{} (index {}), fc {} Hz, Q {}{} at {} Hz",
        args.algorithm,
        args.algorithm.index(),
        args.fc,
        args.q,
        if args.algorithm.uses_boost_cut() {
            format!(", {:+} dB", args.boost_cut)
        } else {
            String::new()
        },
        args.sample_rate
    );
    println!();
    println!("  {:>10}  {:>9}", "Hz", "dB");
    println!("  {:>10}  {:>9}", "--", "--");
    for (freq, db) in response(&params, args.sample_rate, args.points) {
        println!("  {freq:>10.1}  {db:>9.2}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_algorithm_by_name_and_index() {
        assert_eq!(parse_algorithm("butter_lpf2"), Ok(FilterAlgorithm::ButterLpf2));
        assert_eq!(parse_algorithm("Hi-Shelf"), Ok(FilterAlgorithm::HiShelf));
        assert_eq!(parse_algorithm("8"), Ok(FilterAlgorithm::ButterHpf2));
        assert!(parse_algorithm("29").is_err());
        assert!(parse_algorithm("moog").is_err());
    }

    #[test]
    fn test_log_frequencies() {
        let freqs = log_frequencies(48000.0, 10);
        assert_eq!(freqs.len(), 10);
        assert!((freqs[0] - 20.0).abs() < 1e-9);
        assert!(freqs[9] < 24000.0 && freqs[9] > 23990.0);
        assert!(freqs.windows(2).all(|w| w[0] < w[1]));
        assert!(log_frequencies(48000.0, 0).is_empty());
    }

    #[test]
    fn test_butterworth_response_shape() {
        let params = FilterParameters::new(FilterAlgorithm::ButterLpf2, 1000.0);
        let points = response(&params, 48000.0, 64);
        assert!(points[0].1.abs() < 0.01, "passband {} dB", points[0].1);
        assert!(points[63].1 < -60.0, "stopband {} dB", points[63].1);
        assert!(points.windows(2).all(|w| w[1].1 <= w[0].1 + 1e-9));
    }

    #[test]
    fn test_every_algorithm_has_a_finite_passband_point() {
        for algorithm in FilterAlgorithm::ALL {
            let params = FilterParameters::new(algorithm, 1000.0).with_boost_cut(6.0);
            let points = response(&params, 48000.0, 16);
            assert_eq!(points.len(), 16);
            assert!(
                points.iter().any(|(_, db)| db.is_finite()),
                "{algorithm} has no finite point"
            );
        }
    }
}
