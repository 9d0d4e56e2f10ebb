//! Parameter introspection for discoverable effect parameters.
//!
//! Effects expose their parameters by index through [`ParameterInfo`]. Each index is
//! described by a [`ParamDescriptor`] carrying the display name, a short name usable as a
//! preset key, the unit and the valid range. Presets are replayed as flat key/value
//! pairs by resolving the key with [`ParameterInfo::find_param_by_name`] and writing the
//! value with [`ParameterInfo::set_param`].
//!
//! Enumerated parameters (filter algorithm, delay mode, waveform) are exposed as
//! [`ParamUnit::Index`] values whose range is `0..=variant_count-1` and whose step is 1.
//!
//! # Example
//!
//! ```rust
//! use kinetone_core::{ParameterInfo, ParamDescriptor, ParamUnit};
//!
//! struct SimpleGain {
//!     gain_db: f64,
//! }
//!
//! impl ParameterInfo for SimpleGain {
//!     fn param_count(&self) -> usize { 1 }
//!
//!     fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
//!         match index {
//!             0 => Some(ParamDescriptor::gain_db("Gain", "gain", -60.0, 12.0, 0.0)),
//!             _ => None,
//!         }
//!     }
//!
//!     fn get_param(&self, index: usize) -> f64 {
//!         match index {
//!             0 => self.gain_db,
//!             _ => 0.0,
//!         }
//!     }
//!
//!     fn set_param(&mut self, index: usize, value: f64) {
//!         if index == 0 {
//!             self.gain_db = value.clamp(-60.0, 12.0);
//!         }
//!     }
//! }
//!
//! let mut gain = SimpleGain { gain_db: 0.0 };
//! let idx = gain.find_param_by_name("GAIN").unwrap();
//! gain.set_param(idx, -6.0);
//! assert_eq!(gain.get_param(idx), -6.0);
//! ```

/// Unit of a parameter value, used for display and for parsing preset strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamUnit {
    /// Decibels.
    Decibels,
    /// Hertz.
    Hertz,
    /// Milliseconds.
    Milliseconds,
    /// Percent (0-100).
    Percent,
    /// Semitones.
    Semitones,
    /// Zero-based index into an enumerated choice.
    Index,
    /// On/off toggle stored as 0.0 or 1.0.
    Toggle,
    /// Dimensionless.
    None,
}

impl ParamUnit {
    /// Unit suffix for display.
    ///
    /// ```rust
    /// use kinetone_core::ParamUnit;
    ///
    /// assert_eq!(ParamUnit::Decibels.suffix(), " dB");
    /// assert_eq!(ParamUnit::None.suffix(), "");
    /// ```
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Decibels => " dB",
            ParamUnit::Hertz => " Hz",
            ParamUnit::Milliseconds => " ms",
            ParamUnit::Percent => "%",
            ParamUnit::Semitones => " st",
            ParamUnit::Index | ParamUnit::Toggle | ParamUnit::None => "",
        }
    }
}

/// Metadata for one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Display name ("Feedback", "Left Delay").
    pub name: &'static str,
    /// Short snake-case name, used as the preset key ("feedback", "left_ms").
    pub short_name: &'static str,
    /// Unit of the value.
    pub unit: ParamUnit,
    /// Minimum accepted value.
    pub min: f64,
    /// Maximum accepted value.
    pub max: f64,
    /// Value after construction.
    pub default: f64,
    /// Recommended increment.
    pub step: f64,
}

impl ParamDescriptor {
    /// Generic continuous parameter.
    pub const fn new(
        name: &'static str,
        short_name: &'static str,
        unit: ParamUnit,
        min: f64,
        max: f64,
        default: f64,
    ) -> Self {
        Self {
            name,
            short_name,
            unit,
            min,
            max,
            default,
            step: 0.01,
        }
    }

    /// Frequency parameter in Hz.
    pub const fn frequency(
        name: &'static str,
        short_name: &'static str,
        min: f64,
        max: f64,
        default: f64,
    ) -> Self {
        Self {
            step: 1.0,
            ..Self::new(name, short_name, ParamUnit::Hertz, min, max, default)
        }
    }

    /// Level parameter in dB.
    pub const fn gain_db(
        name: &'static str,
        short_name: &'static str,
        min: f64,
        max: f64,
        default: f64,
    ) -> Self {
        Self {
            step: 0.5,
            ..Self::new(name, short_name, ParamUnit::Decibels, min, max, default)
        }
    }

    /// Time parameter in milliseconds.
    pub const fn time_ms(
        name: &'static str,
        short_name: &'static str,
        min: f64,
        max: f64,
        default: f64,
    ) -> Self {
        Self {
            step: 1.0,
            ..Self::new(name, short_name, ParamUnit::Milliseconds, min, max, default)
        }
    }

    /// Percentage parameter.
    pub const fn percent(
        name: &'static str,
        short_name: &'static str,
        min: f64,
        max: f64,
        default: f64,
    ) -> Self {
        Self {
            step: 1.0,
            ..Self::new(name, short_name, ParamUnit::Percent, min, max, default)
        }
    }

    /// Enumerated choice with `count` variants.
    #[allow(clippy::cast_precision_loss)]
    pub const fn choice(
        name: &'static str,
        short_name: &'static str,
        count: usize,
        default: usize,
    ) -> Self {
        Self {
            step: 1.0,
            ..Self::new(
                name,
                short_name,
                ParamUnit::Index,
                0.0,
                (count - 1) as f64,
                default as f64,
            )
        }
    }

    /// On/off toggle.
    pub const fn toggle(name: &'static str, short_name: &'static str, default: bool) -> Self {
        Self {
            step: 1.0,
            ..Self::new(
                name,
                short_name,
                ParamUnit::Toggle,
                0.0,
                1.0,
                if default { 1.0 } else { 0.0 },
            )
        }
    }

    /// Clamp `value` into `[min, max]`, rounding index and toggle values.
    pub fn clamp(&self, value: f64) -> f64 {
        let v = value.clamp(self.min, self.max);
        match self.unit {
            ParamUnit::Index | ParamUnit::Toggle => libm::round(v),
            _ => v,
        }
    }

    /// Whether `value` is finite and inside the descriptor's range.
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

/// Index-based parameter access.
pub trait ParameterInfo {
    /// Number of parameters. Valid indices are `0..param_count()`.
    fn param_count(&self) -> usize;

    /// Descriptor for `index`, or `None` when out of range.
    fn param_info(&self, index: usize) -> Option<ParamDescriptor>;

    /// Current value at `index`; `0.0` when out of range.
    fn get_param(&self, index: usize) -> f64;

    /// Set the value at `index`, clamped to the descriptor range. Out-of-range indices
    /// are ignored.
    fn set_param(&mut self, index: usize, value: f64);

    /// Find a parameter index by name or short name, ignoring ASCII case.
    fn find_param_by_name(&self, name: &str) -> Option<usize> {
        (0..self.param_count()).find(|&i| {
            self.param_info(i).is_some_and(|desc| {
                desc.name.eq_ignore_ascii_case(name) || desc.short_name.eq_ignore_ascii_case(name)
            })
        })
    }
}
