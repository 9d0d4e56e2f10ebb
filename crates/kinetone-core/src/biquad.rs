//! Biquad (bi-quadratic) filter engine.
//!
//! A second-order IIR section that runs one of four equivalent signal-flow graphs
//! over the same coefficient set. Coefficients come from
//! [`calculate_coefficients`](crate::filter_design::calculate_coefficients).
//!
//! # Coefficient Convention
//!
//! ```text
//!         a0 + a1 z^-1 + a2 z^-2
//! H(z) = ------------------------
//!          1 + b1 z^-1 + b2 z^-2
//! ```
//!
//! `c0` and `d0` are not used by the biquad itself; they blend filtered and dry
//! signal in [`AudioFilter`](crate::AudioFilter) for shelving and parametric designs.
//!
//! # Topologies
//!
//! | Topology | State | S/G available |
//! |----------|-------|---------------|
//! | [`BiquadTopology::Direct`] | x\[n-1\], x\[n-2\], y\[n-1\], y\[n-2\] | yes |
//! | [`BiquadTopology::Canonical`] | w\[n-1\], w\[n-2\] | no |
//! | [`BiquadTopology::TransposedDirect`] | four node registers | no |
//! | [`BiquadTopology::TransposedCanonical`] | two node registers | yes |

use crate::math::flush_underflow;

/// The seven coefficients of a biquad plus wet/dry blend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    /// Feedforward, current input.
    pub a0: f64,
    /// Feedforward, one sample back.
    pub a1: f64,
    /// Feedforward, two samples back.
    pub a2: f64,
    /// Feedback, one sample back.
    pub b1: f64,
    /// Feedback, two samples back.
    pub b2: f64,
    /// Filtered (wet) blend.
    pub c0: f64,
    /// Dry blend.
    pub d0: f64,
}

impl BiquadCoefficients {
    /// Pass-through coefficients: `a0 = 1`, `c0 = 1`, everything else zero.
    pub const PASSTHROUGH: Self = Self {
        a0: 1.0,
        a1: 0.0,
        a2: 0.0,
        b1: 0.0,
        b2: 0.0,
        c0: 1.0,
        d0: 0.0,
    };

    /// Returns true if every coefficient is finite.
    pub fn is_finite(&self) -> bool {
        [self.a0, self.a1, self.a2, self.b1, self.b2, self.c0, self.d0]
            .iter()
            .all(|c| c.is_finite())
    }
}

impl Default for BiquadCoefficients {
    fn default() -> Self {
        Self::PASSTHROUGH
    }
}

/// Signal-flow graph used to evaluate the biquad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BiquadTopology {
    /// Direct Form I.
    #[default]
    Direct,
    /// Direct Form II (canonical, two registers).
    Canonical,
    /// Transposed Direct Form I.
    TransposedDirect,
    /// Transposed Direct Form II.
    TransposedCanonical,
}

/// Stateful second-order IIR section.
///
/// # Example
///
/// ```rust
/// use kinetone_core::{Biquad, BiquadTopology, FilterAlgorithm, FilterParameters};
/// use kinetone_core::filter_design::calculate_coefficients;
///
/// let params = FilterParameters::new(FilterAlgorithm::ButterLpf2, 1000.0);
/// let mut biquad = Biquad::new(BiquadTopology::TransposedCanonical);
/// biquad.set_coefficients(calculate_coefficients(&params, 48000.0));
///
/// let y = biquad.process(1.0);
/// assert!(y > 0.0 && y < 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    coeffs: BiquadCoefficients,
    topology: BiquadTopology,
    /// x_z1, x_z2, y_z1, y_z2; meaning depends on the topology
    state: [f64; 4],
}

const X_Z1: usize = 0;
const X_Z2: usize = 1;
const Y_Z1: usize = 2;
const Y_Z2: usize = 3;

impl Biquad {
    /// Create a pass-through biquad with the given topology.
    pub fn new(topology: BiquadTopology) -> Self {
        Self {
            coeffs: BiquadCoefficients::PASSTHROUGH,
            topology,
            state: [0.0; 4],
        }
    }

    /// Zero the delay registers. Coefficients are kept.
    pub fn reset(&mut self) {
        self.state = [0.0; 4];
    }

    /// Replace the coefficient set.
    pub fn set_coefficients(&mut self, coeffs: BiquadCoefficients) {
        self.coeffs = coeffs;
    }

    /// Current coefficient set.
    pub fn coefficients(&self) -> BiquadCoefficients {
        self.coeffs
    }

    /// Active topology.
    pub fn topology(&self) -> BiquadTopology {
        self.topology
    }

    /// Switch topology. The registers mean different things per topology, so the
    /// state is cleared.
    pub fn set_topology(&mut self, topology: BiquadTopology) {
        if topology != self.topology {
            self.topology = topology;
            self.reset();
        }
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, xn: f64) -> f64 {
        let c = &self.coeffs;
        let s = &mut self.state;

        match self.topology {
            BiquadTopology::Direct => {
                let yn = flush_underflow(
                    c.a0 * xn + c.a1 * s[X_Z1] + c.a2 * s[X_Z2] - c.b1 * s[Y_Z1] - c.b2 * s[Y_Z2],
                );
                s[X_Z2] = s[X_Z1];
                s[X_Z1] = xn;
                s[Y_Z2] = s[Y_Z1];
                s[Y_Z1] = yn;
                yn
            }
            BiquadTopology::Canonical => {
                // w(n) = x(n) - b1*w(n-1) - b2*w(n-2)
                let wn = xn - c.b1 * s[X_Z1] - c.b2 * s[X_Z2];
                let yn = flush_underflow(c.a0 * wn + c.a1 * s[X_Z1] + c.a2 * s[X_Z2]);
                s[X_Z2] = s[X_Z1];
                s[X_Z1] = flush_underflow(wn);
                yn
            }
            BiquadTopology::TransposedDirect => {
                let wn = xn + s[Y_Z1];
                let yn = flush_underflow(c.a0 * wn + s[X_Z1]);
                s[Y_Z1] = s[Y_Z2] - c.b1 * wn;
                s[Y_Z2] = -c.b2 * wn;
                s[X_Z1] = s[X_Z2] + c.a1 * wn;
                s[X_Z2] = c.a2 * wn;
                yn
            }
            BiquadTopology::TransposedCanonical => {
                let yn = flush_underflow(c.a0 * xn + s[X_Z1]);
                s[X_Z1] = c.a1 * xn - c.b1 * yn + s[X_Z2];
                s[X_Z2] = c.a2 * xn - c.b2 * yn;
                yn
            }
        }
    }

    /// The "S" part of the next output: everything except the `a0 * x` term.
    ///
    /// Only meaningful for [`BiquadTopology::Direct`] and
    /// [`BiquadTopology::TransposedCanonical`]; returns 0 otherwise.
    pub fn storage_value(&self) -> f64 {
        let c = &self.coeffs;
        let s = &self.state;
        match self.topology {
            BiquadTopology::Direct => {
                c.a1 * s[X_Z1] + c.a2 * s[X_Z2] - c.b1 * s[Y_Z1] - c.b2 * s[Y_Z2]
            }
            BiquadTopology::TransposedCanonical => s[X_Z1],
            _ => 0.0,
        }
    }

    /// The "G" part of the next output: the instantaneous gain `a0`.
    ///
    /// Only meaningful for [`BiquadTopology::Direct`] and
    /// [`BiquadTopology::TransposedCanonical`]; returns 0 otherwise.
    pub fn gain_value(&self) -> f64 {
        match self.topology {
            BiquadTopology::Direct | BiquadTopology::TransposedCanonical => self.coeffs.a0,
            _ => 0.0,
        }
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new(BiquadTopology::Direct)
    }
}
