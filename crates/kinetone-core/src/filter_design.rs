//! Closed-form biquad coefficient design.
//!
//! [`calculate_coefficients`] maps a [`FilterParameters`] set and a sample rate to a
//! [`BiquadCoefficients`] set. It is a pure function: no state, no allocation, no range
//! checking. Degenerate inputs (fc at or above Nyquist, Q of zero) produce degenerate
//! coefficients; [`AudioFilter`](crate::AudioFilter) is where values are validated.
//!
//! # Algorithms
//!
//! | Family | Variants |
//! |--------|----------|
//! | First order | [`Lpf1P`](FilterAlgorithm::Lpf1P), [`Lpf1`](FilterAlgorithm::Lpf1), [`Hpf1`](FilterAlgorithm::Hpf1), [`Apf1`](FilterAlgorithm::Apf1) |
//! | Second order resonant | `Lpf2`, `Hpf2`, `Bpf2`, `Bsf2`, `Apf2` |
//! | Butterworth | `ButterLpf2`, `ButterHpf2`, `ButterBpf2`, `ButterBsf2` |
//! | Linkwitz-Riley | `LwrLpf2`, `LwrHpf2` |
//! | Analog-matched | `MmaLpf2`, `MmaLpf2B`, `MatchLp2A`, `MatchLp2B`, `MatchBp2A`, `MatchBp2B` |
//! | Shelving / EQ | `LowShelf`, `HiShelf`, `NcqParaEq`, `CqParaEq` |
//! | Resonators | `ResonA`, `ResonB` |
//! | Impulse invariant | `ImpInvLp1`, `ImpInvLp2` |
//!
//! Shelving and non-constant-Q EQ designs set `c0 = mu - 1` and `d0 = 1`, so the final
//! output is `x + (mu - 1) * H(x)`.
//!
//! # Reference
//!
//! W. Pirkle, *Designing Audio Effect Plugins in C++*, 2nd ed., ch. 11.
//! M. Vicanek, *Matched Second Order Digital Filters*, 2016.

use core::f64::consts::{PI, SQRT_2};
use core::fmt;
use core::str::FromStr;

use libm::{cos, cosh, exp, log10, pow, sin, sqrt, tan};

use crate::biquad::BiquadCoefficients;

/// Upper bound for tangent arguments that would otherwise approach pi/2.
const MAX_TAN_ARG: f64 = 0.95 * PI / 2.0;

/// Q used whenever a non-positive Q is supplied.
pub const DEFAULT_Q: f64 = 0.707;

/// Filter design selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FilterAlgorithm {
    /// One-pole low-pass, no zero.
    Lpf1P,
    /// First-order bilinear low-pass.
    #[default]
    Lpf1,
    /// First-order bilinear high-pass.
    Hpf1,
    /// Second-order resonant low-pass.
    Lpf2,
    /// Second-order resonant high-pass.
    Hpf2,
    /// Second-order band-pass.
    Bpf2,
    /// Second-order band-stop.
    Bsf2,
    /// Butterworth low-pass.
    ButterLpf2,
    /// Butterworth high-pass.
    ButterHpf2,
    /// Butterworth band-pass.
    ButterBpf2,
    /// Butterworth band-stop.
    ButterBsf2,
    /// Massberg analog-matched low-pass with resonance gain compensation.
    MmaLpf2,
    /// Massberg analog-matched low-pass without gain compensation.
    MmaLpf2B,
    /// First-order low shelf.
    LowShelf,
    /// First-order high shelf.
    HiShelf,
    /// Non-constant-Q parametric EQ.
    NcqParaEq,
    /// Constant-Q parametric EQ.
    CqParaEq,
    /// Linkwitz-Riley low-pass.
    LwrLpf2,
    /// Linkwitz-Riley high-pass.
    LwrHpf2,
    /// First-order all-pass.
    Apf1,
    /// Second-order all-pass.
    Apf2,
    /// Resonator.
    ResonA,
    /// Resonator with zeros at DC and Nyquist.
    ResonB,
    /// Vicanek matched low-pass, tight fit.
    MatchLp2A,
    /// Vicanek matched low-pass, loose fit.
    MatchLp2B,
    /// Vicanek matched band-pass, tight fit.
    MatchBp2A,
    /// Vicanek matched band-pass, loose fit.
    MatchBp2B,
    /// Impulse-invariant one-pole low-pass.
    ImpInvLp1,
    /// Impulse-invariant two-pole low-pass.
    ImpInvLp2,
}

impl FilterAlgorithm {
    /// Every algorithm, in declaration order. The position is the parameter index.
    pub const ALL: [FilterAlgorithm; 29] = [
        Self::Lpf1P,
        Self::Lpf1,
        Self::Hpf1,
        Self::Lpf2,
        Self::Hpf2,
        Self::Bpf2,
        Self::Bsf2,
        Self::ButterLpf2,
        Self::ButterHpf2,
        Self::ButterBpf2,
        Self::ButterBsf2,
        Self::MmaLpf2,
        Self::MmaLpf2B,
        Self::LowShelf,
        Self::HiShelf,
        Self::NcqParaEq,
        Self::CqParaEq,
        Self::LwrLpf2,
        Self::LwrHpf2,
        Self::Apf1,
        Self::Apf2,
        Self::ResonA,
        Self::ResonB,
        Self::MatchLp2A,
        Self::MatchLp2B,
        Self::MatchBp2A,
        Self::MatchBp2B,
        Self::ImpInvLp1,
        Self::ImpInvLp2,
    ];

    /// Stable snake-case name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Lpf1P => "lpf1p",
            Self::Lpf1 => "lpf1",
            Self::Hpf1 => "hpf1",
            Self::Lpf2 => "lpf2",
            Self::Hpf2 => "hpf2",
            Self::Bpf2 => "bpf2",
            Self::Bsf2 => "bsf2",
            Self::ButterLpf2 => "butter_lpf2",
            Self::ButterHpf2 => "butter_hpf2",
            Self::ButterBpf2 => "butter_bpf2",
            Self::ButterBsf2 => "butter_bsf2",
            Self::MmaLpf2 => "mma_lpf2",
            Self::MmaLpf2B => "mma_lpf2b",
            Self::LowShelf => "low_shelf",
            Self::HiShelf => "hi_shelf",
            Self::NcqParaEq => "ncq_para_eq",
            Self::CqParaEq => "cq_para_eq",
            Self::LwrLpf2 => "lwr_lpf2",
            Self::LwrHpf2 => "lwr_hpf2",
            Self::Apf1 => "apf1",
            Self::Apf2 => "apf2",
            Self::ResonA => "reson_a",
            Self::ResonB => "reson_b",
            Self::MatchLp2A => "match_lp2a",
            Self::MatchLp2B => "match_lp2b",
            Self::MatchBp2A => "match_bp2a",
            Self::MatchBp2B => "match_bp2b",
            Self::ImpInvLp1 => "imp_inv_lp1",
            Self::ImpInvLp2 => "imp_inv_lp2",
        }
    }

    /// Position in [`FilterAlgorithm::ALL`].
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&a| a == self).unwrap_or(0)
    }

    /// Algorithm at `index` in [`FilterAlgorithm::ALL`].
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Whether the design uses the boost/cut parameter.
    pub const fn uses_boost_cut(self) -> bool {
        matches!(
            self,
            Self::LowShelf | Self::HiShelf | Self::NcqParaEq | Self::CqParaEq
        )
    }
}

impl fmt::Display for FilterAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned by [`FilterAlgorithm::from_str`] for an unrecognised name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownAlgorithm;

impl fmt::Display for UnknownAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown filter algorithm")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UnknownAlgorithm {}

impl FromStr for FilterAlgorithm {
    type Err = UnknownAlgorithm;

    /// Parses the snake-case name, ignoring ASCII case and treating `-` as `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|a| {
                let name = a.name();
                name.len() == s.len()
                    && name
                        .bytes()
                        .zip(s.bytes())
                        .all(|(n, c)| n == c.to_ascii_lowercase() || (n == b'_' && c == b'-'))
            })
            .ok_or(UnknownAlgorithm)
    }
}

/// Design parameters for one biquad section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParameters {
    /// Design to use.
    pub algorithm: FilterAlgorithm,
    /// Cutoff or centre frequency in Hz.
    pub fc: f64,
    /// Quality factor.
    pub q: f64,
    /// Boost (positive) or cut (negative) in dB for shelving and EQ designs.
    pub boost_cut_db: f64,
}

impl FilterParameters {
    /// Parameters with the given design and frequency, default Q and no boost/cut.
    pub const fn new(algorithm: FilterAlgorithm, fc: f64) -> Self {
        Self {
            algorithm,
            fc,
            q: DEFAULT_Q,
            boost_cut_db: 0.0,
        }
    }

    /// Builder-style Q.
    #[must_use]
    pub const fn with_q(mut self, q: f64) -> Self {
        self.q = q;
        self
    }

    /// Builder-style boost/cut.
    #[must_use]
    pub const fn with_boost_cut(mut self, db: f64) -> Self {
        self.boost_cut_db = db;
        self
    }
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self::new(FilterAlgorithm::Lpf1, 100.0)
    }
}

/// Compute biquad coefficients for `params` at `sample_rate`.
///
/// # Example
///
/// ```rust
/// use kinetone_core::{FilterAlgorithm, FilterParameters};
/// use kinetone_core::filter_design::{calculate_coefficients, magnitude_response_db};
/// use core::f64::consts::PI;
///
/// let params = FilterParameters::new(FilterAlgorithm::ButterLpf2, 1000.0);
/// let coeffs = calculate_coefficients(&params, 48000.0);
///
/// let at_fc = magnitude_response_db(2.0 * PI * 1000.0 / 48000.0, &coeffs);
/// assert!((at_fc + 3.01).abs() < 0.05);
/// ```
#[allow(clippy::too_many_lines, clippy::many_single_char_names)]
pub fn calculate_coefficients(params: &FilterParameters, sample_rate: f64) -> BiquadCoefficients {
    let fc = params.fc;
    let q = params.q;
    let fs = sample_rate;
    let theta_c = 2.0 * PI * fc / fs;

    let mut c = BiquadCoefficients {
        a0: 0.0,
        ..BiquadCoefficients::PASSTHROUGH
    };

    match params.algorithm {
        FilterAlgorithm::Lpf1P => {
            let gamma = 2.0 - cos(theta_c);
            c.b1 = sqrt(gamma * gamma - 1.0) - gamma;
            c.a0 = 1.0 + c.b1;
        }
        FilterAlgorithm::Lpf1 | FilterAlgorithm::Hpf1 => {
            let gamma = cos(theta_c) / (1.0 + sin(theta_c));
            if params.algorithm == FilterAlgorithm::Lpf1 {
                c.a0 = (1.0 - gamma) / 2.0;
                c.a1 = c.a0;
            } else {
                c.a0 = (1.0 + gamma) / 2.0;
                c.a1 = -c.a0;
            }
            c.b1 = -gamma;
        }
        FilterAlgorithm::Lpf2 | FilterAlgorithm::Hpf2 => {
            let d = 1.0 / q;
            let half_d_sin = 0.5 * d * sin(theta_c);
            let beta = 0.5 * (1.0 - half_d_sin) / (1.0 + half_d_sin);
            let gamma = (0.5 + beta) * cos(theta_c);
            if params.algorithm == FilterAlgorithm::Lpf2 {
                let alpha = (0.5 + beta - gamma) / 2.0;
                c.a0 = alpha;
                c.a1 = 2.0 * alpha;
                c.a2 = alpha;
            } else {
                let alpha = (0.5 + beta + gamma) / 2.0;
                c.a0 = alpha;
                c.a1 = -2.0 * alpha;
                c.a2 = alpha;
            }
            c.b1 = -2.0 * gamma;
            c.b2 = 2.0 * beta;
        }
        FilterAlgorithm::Bpf2 | FilterAlgorithm::Bsf2 => {
            let k = tan(PI * fc / fs);
            let k2 = k * k;
            let delta = k2 * q + k + q;
            if params.algorithm == FilterAlgorithm::Bpf2 {
                c.a0 = k / delta;
                c.a2 = -k / delta;
            } else {
                c.a0 = q * (1.0 + k2) / delta;
                c.a1 = 2.0 * q * (k2 - 1.0) / delta;
                c.a2 = c.a0;
            }
            c.b1 = 2.0 * q * (k2 - 1.0) / delta;
            c.b2 = (k2 * q - k + q) / delta;
        }
        FilterAlgorithm::ButterLpf2 => {
            let cc = 1.0 / tan(PI * fc / fs);
            let cc2 = cc * cc;
            c.a0 = 1.0 / (1.0 + SQRT_2 * cc + cc2);
            c.a1 = 2.0 * c.a0;
            c.a2 = c.a0;
            c.b1 = 2.0 * c.a0 * (1.0 - cc2);
            c.b2 = c.a0 * (1.0 - SQRT_2 * cc + cc2);
        }
        FilterAlgorithm::ButterHpf2 => {
            let cc = tan(PI * fc / fs);
            let cc2 = cc * cc;
            c.a0 = 1.0 / (1.0 + SQRT_2 * cc + cc2);
            c.a1 = -2.0 * c.a0;
            c.a2 = c.a0;
            c.b1 = 2.0 * c.a0 * (cc2 - 1.0);
            c.b2 = c.a0 * (1.0 - SQRT_2 * cc + cc2);
        }
        FilterAlgorithm::ButterBpf2 | FilterAlgorithm::ButterBsf2 => {
            let bw = fc / q;
            let delta_c = (PI * bw / fs).min(MAX_TAN_ARG);
            let d = 2.0 * cos(theta_c);
            if params.algorithm == FilterAlgorithm::ButterBpf2 {
                let cc = 1.0 / tan(delta_c);
                c.a0 = 1.0 / (1.0 + cc);
                c.a2 = -c.a0;
                c.b1 = -c.a0 * (cc * d);
                c.b2 = c.a0 * (cc - 1.0);
            } else {
                let cc = tan(delta_c);
                c.a0 = 1.0 / (1.0 + cc);
                c.a1 = -c.a0 * d;
                c.a2 = c.a0;
                c.b1 = -c.a0 * d;
                c.b2 = c.a0 * (1.0 - cc);
            }
        }
        FilterAlgorithm::MmaLpf2 | FilterAlgorithm::MmaLpf2B => {
            let resonance_db = if q > DEFAULT_Q {
                let peak = q * q / sqrt(q * q - 0.25);
                20.0 * log10(peak)
            } else {
                0.0
            };
            let (sin_t, cos_t) = (sin(theta_c), cos(theta_c));
            let resonance = (cos_t + sin_t * sqrt(pow(10.0, resonance_db / 10.0) - 1.0))
                / (pow(10.0, resonance_db / 20.0) * sin_t + 1.0);
            let g = if params.algorithm == FilterAlgorithm::MmaLpf2B {
                1.0
            } else {
                pow(10.0, -resonance_db / 40.0)
            };
            c.b1 = -2.0 * resonance * cos_t;
            c.b2 = resonance * resonance;
            c.a0 = g * (1.0 + c.b1 + c.b2);
        }
        FilterAlgorithm::LowShelf | FilterAlgorithm::HiShelf => {
            let mu = pow(10.0, params.boost_cut_db / 20.0);
            let beta = if params.algorithm == FilterAlgorithm::LowShelf {
                4.0 / (1.0 + mu)
            } else {
                (1.0 + mu) / 4.0
            };
            let delta = beta * tan(theta_c / 2.0);
            let gamma = (1.0 - delta) / (1.0 + delta);
            if params.algorithm == FilterAlgorithm::LowShelf {
                c.a0 = (1.0 - gamma) / 2.0;
                c.a1 = c.a0;
            } else {
                c.a0 = (1.0 + gamma) / 2.0;
                c.a1 = -c.a0;
            }
            c.b1 = -gamma;
            c.c0 = mu - 1.0;
            c.d0 = 1.0;
        }
        FilterAlgorithm::NcqParaEq => {
            let mu = pow(10.0, params.boost_cut_db / 20.0);
            let tan_arg = (theta_c / (2.0 * q)).min(MAX_TAN_ARG);
            let zeta = 4.0 / (1.0 + mu);
            let zt = zeta * tan(tan_arg);
            let beta = 0.5 * (1.0 - zt) / (1.0 + zt);
            let gamma = (0.5 + beta) * cos(theta_c);
            let alpha = 0.5 - beta;
            c.a0 = alpha;
            c.a2 = -alpha;
            c.b1 = -2.0 * gamma;
            c.b2 = 2.0 * beta;
            c.c0 = mu - 1.0;
            c.d0 = 1.0;
        }
        FilterAlgorithm::CqParaEq => {
            let k = tan(PI * fc / fs);
            let k2 = k * k;
            let vo = pow(10.0, params.boost_cut_db / 20.0);
            let boost = params.boost_cut_db >= 0.0;

            let d0 = 1.0 + k / q + k2;
            let e0 = 1.0 + k / (vo * q) + k2;
            let alpha = 1.0 + vo * k / q + k2;
            let beta = 2.0 * (k2 - 1.0);
            let gamma = 1.0 - vo * k / q + k2;
            let delta = 1.0 - k / q + k2;
            let eta = 1.0 - k / (vo * q) + k2;

            if boost {
                c.a0 = alpha / d0;
                c.a1 = beta / d0;
                c.a2 = gamma / d0;
                c.b1 = beta / d0;
                c.b2 = delta / d0;
            } else {
                c.a0 = d0 / e0;
                c.a1 = beta / e0;
                c.a2 = delta / e0;
                c.b1 = beta / e0;
                c.b2 = eta / e0;
            }
        }
        FilterAlgorithm::LwrLpf2 | FilterAlgorithm::LwrHpf2 => {
            let omega_c = PI * fc;
            let theta = PI * fc / fs;
            let k = omega_c / tan(theta);
            let k2 = k * k;
            let w2 = omega_c * omega_c;
            let denominator = k2 + w2 + 2.0 * k * omega_c;
            if params.algorithm == FilterAlgorithm::LwrLpf2 {
                c.a0 = w2 / denominator;
                c.a1 = 2.0 * w2 / denominator;
                c.a2 = c.a0;
            } else {
                c.a0 = k2 / denominator;
                c.a1 = -2.0 * k2 / denominator;
                c.a2 = c.a0;
            }
            c.b1 = (-2.0 * k2 + 2.0 * w2) / denominator;
            c.b2 = (-2.0 * k * omega_c + k2 + w2) / denominator;
        }
        FilterAlgorithm::Apf1 => {
            let t = tan(PI * fc / fs);
            let alpha = (t - 1.0) / (t + 1.0);
            c.a0 = alpha;
            c.a1 = 1.0;
            c.b1 = alpha;
        }
        FilterAlgorithm::Apf2 => {
            let bw = fc / q;
            let t = tan((PI * bw / fs).min(MAX_TAN_ARG));
            let alpha = (t - 1.0) / (t + 1.0);
            let beta = -cos(theta_c);
            c.a0 = -alpha;
            c.a1 = beta * (1.0 - alpha);
            c.a2 = 1.0;
            c.b1 = beta * (1.0 - alpha);
            c.b2 = -alpha;
        }
        FilterAlgorithm::ResonA | FilterAlgorithm::ResonB => {
            let bw = fc / q;
            c.b2 = exp(-2.0 * PI * (bw / fs));
            c.b1 = (-4.0 * c.b2 / (1.0 + c.b2)) * cos(theta_c);
            if params.algorithm == FilterAlgorithm::ResonA {
                c.a0 = (1.0 - c.b2) * sqrt(1.0 - c.b1 * c.b1 / (4.0 * c.b2));
            } else {
                c.a0 = 1.0 - sqrt(c.b2);
                c.a2 = -c.a0;
            }
        }
        FilterAlgorithm::MatchLp2A
        | FilterAlgorithm::MatchLp2B
        | FilterAlgorithm::MatchBp2A
        | FilterAlgorithm::MatchBp2B => {
            let (b1, b2) = matched_poles(theta_c, q);
            c.b1 = b1;
            c.b2 = b2;
            let (a0, a1, a2) = matched_zeros(params.algorithm, theta_c, q, b1, b2);
            c.a0 = a0;
            c.a1 = a1;
            c.a2 = a2;
        }
        FilterAlgorithm::ImpInvLp1 => {
            let e_t = exp(-theta_c);
            c.a0 = 1.0 - e_t;
            c.b1 = -e_t;
        }
        FilterAlgorithm::ImpInvLp2 => {
            let alpha = theta_c;
            let zeta = 1.0 / (2.0 * q);
            // real poles (Q < 0.5) are outside this design; keep the root finite
            let damping = sqrt((1.0 - zeta * zeta).max(1e-12));
            let p_re = -alpha * zeta;
            let p_im = alpha * damping;
            let c_im = alpha / (2.0 * damping);
            let e_p = exp(p_re);
            // residue -j*c_im at p: numerator z^-1 term is -2*Re(r*e^conj(p)) > 0, DC gain +1
            c.a1 = 2.0 * c_im * sin(p_im) * e_p;
            c.b1 = -2.0 * e_p * cos(p_im);
            c.b2 = e_p * e_p;
        }
    }

    c
}

/// Denominator of the Vicanek matched designs: impulse-invariant poles.
fn matched_poles(theta_c: f64, q: f64) -> (f64, f64) {
    let zeta = 1.0 / (2.0 * q);
    let b2 = exp(-2.0 * zeta * theta_c);
    let b1 = if zeta <= 1.0 {
        -2.0 * exp(-zeta * theta_c) * cos(sqrt(1.0 - zeta * zeta) * theta_c)
    } else {
        -2.0 * exp(-zeta * theta_c) * cosh(sqrt(zeta * zeta - 1.0) * theta_c)
    };
    (b1, b2)
}

/// Numerator of the Vicanek matched designs.
#[allow(clippy::many_single_char_names)]
fn matched_zeros(
    algorithm: FilterAlgorithm,
    theta_c: f64,
    q: f64,
    b1: f64,
    b2: f64,
) -> (f64, f64, f64) {
    let big_b0 = (1.0 + b1 + b2) * (1.0 + b1 + b2);
    let big_b1 = (1.0 - b1 + b2) * (1.0 - b1 + b2);
    let big_b2 = -4.0 * b2;
    let s = sin(theta_c / 2.0);
    let phi1 = s * s;
    let phi0 = 1.0 - phi1;
    let phi2 = 4.0 * phi0 * phi1;

    let f0 = theta_c / PI;
    let analog_denominator = sqrt((1.0 - f0 * f0) * (1.0 - f0 * f0) + f0 * f0 / (q * q));

    match algorithm {
        FilterAlgorithm::MatchLp2A => {
            let r1 = (big_b0 * phi0 + big_b1 * phi1 + big_b2 * phi2) * q * q;
            let a0_sq = big_b0.max(0.0);
            let a1_sq = ((r1 - a0_sq * phi0) / phi1).max(0.0);
            let a0 = 0.5 * (sqrt(a0_sq) + sqrt(a1_sq));
            (a0, sqrt(a0_sq) - a0, 0.0)
        }
        FilterAlgorithm::MatchLp2B => {
            let r0 = 1.0 + b1 + b2;
            let r1 = (1.0 - b1 + b2) * f0 * f0 / analog_denominator;
            let a0 = (r0 + r1) / 2.0;
            (a0, r0 - a0, 0.0)
        }
        FilterAlgorithm::MatchBp2A => {
            let r1 = big_b0 * phi0 + big_b1 * phi1 + big_b2 * phi2;
            let r2 = -big_b0 + big_b1 + 4.0 * (phi0 - phi1) * big_b2;
            let a2_sq = (r1 - r2 * phi1) / (4.0 * phi1 * phi1);
            let a1_sq = (r2 + 4.0 * (phi1 - phi0) * a2_sq).max(0.0);
            let a1 = -0.5 * sqrt(a1_sq);
            let a0 = 0.5 * (sqrt((a2_sq + a1 * a1).max(0.0)) - a1);
            (a0, a1, -a0 - a1)
        }
        _ => {
            let r0 = (1.0 + b1 + b2) / (PI * f0 * q);
            let r1 = (1.0 - b1 + b2) * (f0 / q) / analog_denominator;
            let a1 = -r1 / 2.0;
            let a0 = (r0 - a1) / 2.0;
            (a0, a1, -a0 - a1)
        }
    }
}

/// Linear magnitude of `c0 * H(e^{j theta}) + d0` at normalised angular frequency
/// `theta` (radians per sample).
pub fn magnitude_response(theta: f64, coeffs: &BiquadCoefficients) -> f64 {
    let (s1, c1) = (sin(theta), cos(theta));
    let (s2, c2) = (sin(2.0 * theta), cos(2.0 * theta));

    let num_re = coeffs.a0 + coeffs.a1 * c1 + coeffs.a2 * c2;
    let num_im = -(coeffs.a1 * s1 + coeffs.a2 * s2);
    let den_re = 1.0 + coeffs.b1 * c1 + coeffs.b2 * c2;
    let den_im = -(coeffs.b1 * s1 + coeffs.b2 * s2);

    let den_mag_sq = den_re * den_re + den_im * den_im;
    let h_re = (num_re * den_re + num_im * den_im) / den_mag_sq;
    let h_im = (num_im * den_re - num_re * den_im) / den_mag_sq;

    let re = coeffs.c0 * h_re + coeffs.d0;
    let im = coeffs.c0 * h_im;
    sqrt(re * re + im * im)
}

/// [`magnitude_response`] in dB (unfloored, so deep notches stay visible).
pub fn magnitude_response_db(theta: f64, coeffs: &BiquadCoefficients) -> f64 {
    20.0 * log10(magnitude_response(theta, coeffs))
}
