//! Effect lookup by id.
//!
//! Every built-in effect has one static [`EffectDescriptor`] row: the id that presets and
//! `--effect` use, a display name, a category and the constructor. The registry walks
//! those rows; it holds no state of its own.
//!
//! ```rust
//! use kinetone_core::Effect;
//! use kinetone_effects::{EffectCategory, EffectRegistry};
//!
//! let registry = EffectRegistry::new();
//!
//! let mut phaser = registry.create("phaser", 48000.0).unwrap();
//! assert!(phaser.process(0.5).is_finite());
//!
//! assert_eq!(registry.lookup("Audio Delay").map(|d| d.id), Some("delay"));
//!
//! let modulation: Vec<_> = registry
//!     .effects_in_category(EffectCategory::Modulation)
//!     .iter()
//!     .map(|d| d.id)
//!     .collect();
//! assert_eq!(modulation, ["flanger", "chorus", "vibrato", "phaser"]);
//! ```

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, vec::Vec};

use kinetone_core::{Effect, ParamDescriptor, ParameterInfo};

use crate::{
    AudioDelay, EnvelopeFollower, Filter, ModDelayAlgorithm, ModulatedDelay, PhaseShifter,
};
#[cfg(feature = "std")]
use crate::{ConvolutionEffect, PitchShifter};

/// Boxed effect as handed out by the registry.
pub type BoxedEffect = Box<dyn EffectWithParams + Send>;

/// Grouping used by `kinetone effects` listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectCategory {
    /// Fixed and envelope-swept biquads
    Filter,
    /// Delay lines and convolution
    TimeBased,
    /// LFO-swept delays and all-passes
    Modulation,
    /// Spectral pitch shifting
    Pitch,
}

impl EffectCategory {
    /// Label for listings.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Filter => "Filter",
            Self::TimeBased => "Time-Based",
            Self::Modulation => "Modulation",
            Self::Pitch => "Pitch",
        }
    }
}

/// One registry row.
#[derive(Debug, Clone)]
pub struct EffectDescriptor {
    /// Id used in presets and on the command line.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// One-line summary.
    pub description: &'static str,
    /// Listing group.
    pub category: EffectCategory,
    build: fn(f64) -> Option<BoxedEffect>,
}

fn boxed<E: EffectWithParams + Send + 'static>(effect: E) -> Option<BoxedEffect> {
    Some(Box::new(effect))
}

fn filter(sr: f64) -> Option<BoxedEffect> {
    boxed(Filter::new(sr))
}

fn delay(sr: f64) -> Option<BoxedEffect> {
    boxed(AudioDelay::with_sample_rate(sr))
}

fn flanger(sr: f64) -> Option<BoxedEffect> {
    boxed(ModulatedDelay::new(sr, ModDelayAlgorithm::Flanger))
}

fn chorus(sr: f64) -> Option<BoxedEffect> {
    boxed(ModulatedDelay::new(sr, ModDelayAlgorithm::Chorus))
}

fn vibrato(sr: f64) -> Option<BoxedEffect> {
    boxed(ModulatedDelay::new(sr, ModDelayAlgorithm::Vibrato))
}

fn phaser(sr: f64) -> Option<BoxedEffect> {
    boxed(PhaseShifter::new(sr))
}

fn envelope_follower(sr: f64) -> Option<BoxedEffect> {
    boxed(EnvelopeFollower::new(sr))
}

// Spectral effects size their FFT buffers up front, which can fail.
#[cfg(feature = "std")]
fn pitch_shift(sr: f64) -> Option<BoxedEffect> {
    PitchShifter::new(sr).ok().and_then(boxed)
}

#[cfg(feature = "std")]
fn convolver(sr: f64) -> Option<BoxedEffect> {
    ConvolutionEffect::new(sr).ok().and_then(boxed)
}

static TIME_DOMAIN: [EffectDescriptor; 7] = [
    EffectDescriptor {
        id: "filter",
        name: "Filter",
        description: "Biquad filter with 29 algorithms and four topologies",
        category: EffectCategory::Filter,
        build: filter,
    },
    EffectDescriptor {
        id: "delay",
        name: "Audio Delay",
        description: "Stereo feedback delay with ping-pong mode",
        category: EffectCategory::TimeBased,
        build: delay,
    },
    EffectDescriptor {
        id: "flanger",
        name: "Flanger",
        description: "Short modulated delay with feedback",
        category: EffectCategory::Modulation,
        build: flanger,
    },
    EffectDescriptor {
        id: "chorus",
        name: "Chorus",
        description: "10-30 ms modulated delay blended with the dry signal",
        category: EffectCategory::Modulation,
        build: chorus,
    },
    EffectDescriptor {
        id: "vibrato",
        name: "Vibrato",
        description: "Wet-only sinusoidal pitch wobble",
        category: EffectCategory::Modulation,
        build: vibrato,
    },
    EffectDescriptor {
        id: "phaser",
        name: "Phaser",
        description: "Six-stage all-pass phaser with delay-free feedback",
        category: EffectCategory::Modulation,
        build: phaser,
    },
    EffectDescriptor {
        id: "envelope_follower",
        name: "Envelope Follower",
        description: "Resonant low-pass swept by the input level",
        category: EffectCategory::Filter,
        build: envelope_follower,
    },
];

#[cfg(feature = "std")]
static SPECTRAL: [EffectDescriptor; 2] = [
    EffectDescriptor {
        id: "pitch_shift",
        name: "Pitch Shifter",
        description: "Peak-locked phase vocoder pitch shifter",
        category: EffectCategory::Pitch,
        build: pitch_shift,
    },
    EffectDescriptor {
        id: "convolver",
        name: "Convolver",
        description: "FFT convolution with a synthetic or loaded impulse",
        category: EffectCategory::TimeBased,
        build: convolver,
    },
];

#[cfg(feature = "std")]
static SPECTRAL_ROWS: &[EffectDescriptor] = &SPECTRAL;
#[cfg(not(feature = "std"))]
static SPECTRAL_ROWS: &[EffectDescriptor] = &[];

/// Every built-in effect, time-domain ones first.
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectRegistry {
    _private: (),
}

impl EffectRegistry {
    /// The built-in effects.
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> impl Iterator<Item = &'static EffectDescriptor> {
        TIME_DOMAIN.iter().chain(SPECTRAL_ROWS)
    }

    /// All rows in listing order.
    pub fn descriptors(&self) -> Vec<&'static EffectDescriptor> {
        self.rows().collect()
    }

    /// Rows in one category, in listing order.
    pub fn effects_in_category(&self, category: EffectCategory) -> Vec<&'static EffectDescriptor> {
        self.rows().filter(|d| d.category == category).collect()
    }

    /// Row for an exact id.
    pub fn get(&self, id: &str) -> Option<&'static EffectDescriptor> {
        self.rows().find(|d| d.id == id)
    }

    /// Row for an id or display name, ignoring case.
    pub fn lookup(&self, name: &str) -> Option<&'static EffectDescriptor> {
        self.get(name).or_else(|| {
            self.rows()
                .find(|d| d.id.eq_ignore_ascii_case(name) || d.name.eq_ignore_ascii_case(name))
        })
    }

    /// New instance of `id` at `sample_rate`, or `None` for an unknown id or an effect
    /// that could not allocate its buffers.
    pub fn create(&self, id: &str, sample_rate: f64) -> Option<BoxedEffect> {
        self.get(id).and_then(|d| (d.build)(sample_rate))
    }

    /// Index of a parameter on `effect_id` by display or short name, ignoring case.
    pub fn param_index_by_name(&self, effect_id: &str, param_name: &str) -> Option<usize> {
        self.create(effect_id, 48000.0)?
            .effect_param_index(param_name)
    }

    /// Number of built-in effects.
    pub fn len(&self) -> usize {
        TIME_DOMAIN.len() + SPECTRAL_ROWS.len()
    }

    /// Always false; kept for the `len`/`is_empty` pair.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// [`Effect`] plus [`ParameterInfo`] behind one vtable, so a boxed effect can be driven
/// by parameter index. Blanket-implemented for every effect with a parameter table.
pub trait EffectWithParams: Effect {
    /// Parameter count.
    fn effect_param_count(&self) -> usize;

    /// Descriptor at `index`.
    fn effect_param_info(&self, index: usize) -> Option<ParamDescriptor>;

    /// Current value at `index`.
    fn effect_get_param(&self, index: usize) -> f64;

    /// Set the value at `index`; the effect clamps it.
    fn effect_set_param(&mut self, index: usize, value: f64);

    /// Index of the parameter whose display or short name matches, ignoring case.
    fn effect_param_index(&self, name: &str) -> Option<usize> {
        (0..self.effect_param_count()).find(|&i| {
            self.effect_param_info(i).is_some_and(|desc| {
                desc.name.eq_ignore_ascii_case(name) || desc.short_name.eq_ignore_ascii_case(name)
            })
        })
    }
}

impl<T: Effect + ParameterInfo> EffectWithParams for T {
    fn effect_param_count(&self) -> usize {
        self.param_count()
    }

    fn effect_param_info(&self, index: usize) -> Option<ParamDescriptor> {
        self.param_info(index)
    }

    fn effect_get_param(&self, index: usize) -> f64 {
        self.get_param(index)
    }

    fn effect_set_param(&mut self, index: usize, value: f64) {
        self.set_param(index, value);
    }
}
