//! Presets and effect-chain configuration for kinetone.
//!
//! Effects persist as flat key/value parameters, so this crate never stores internal
//! DSP state: a preset names effects from the [`EffectRegistry`] and lists their
//! parameters as strings, and building a chain replays those through `set_param`.
//!
//! - **Presets**: [`Preset`] and [`EffectConfig`] load from and save to TOML
//! - **Values**: [`parse_param_value`] understands `%`, `dB`, `ms`/`s`, `Hz`/`kHz`, `st`
//!   and on/off, in the units the effects use
//! - **Validation**: unknown effects, unknown parameters, wrong units and out-of-range
//!   values are reported together
//! - **Chains**: [`EffectChain`] runs registry effects in series with per-entry bypass
//! - **Hand-off**: [`SharedParams`] moves parameter snapshots to the audio thread
//! - **Paths** and **factory presets**
//!
//! # Example
//!
//! ```rust
//! use kinetone_config::{EffectChain, EffectConfig, Preset, validate_preset};
//! use kinetone_core::Effect;
//!
//! let preset = Preset::new("Wah into slap")
//!     .with_effect(
//!         EffectConfig::new("envelope_follower")
//!             .with_param("fc", "800Hz")
//!             .with_param("sensitivity", "2.5"),
//!     )
//!     .with_effect(EffectConfig::new("delay").with_param("left_ms", "90ms"));
//!
//! validate_preset(&preset).unwrap();
//! let toml = preset.to_toml().unwrap();
//! assert_eq!(Preset::from_toml(&toml).unwrap(), preset);
//!
//! let mut chain = EffectChain::from_preset(&preset, 48000.0).unwrap();
//! assert!(chain.process(0.1).is_finite());
//! ```

mod chain;
mod effect_config;
mod error;
mod preset;
mod shared;

/// Platform-specific paths for presets and configuration.
pub mod paths;

/// Effect and preset validation.
pub mod validation;

/// Factory presets bundled with the library.
pub mod factory_presets;

pub use chain::EffectChain;
pub use effect_config::{
    EffectConfig, ParsedValue, parse_param_value, parse_value_with_unit, resolve_param_value,
};
pub use error::{ConfigError, IoAction};
pub use factory_presets::{
    FACTORY_PRESET_NAMES, factory_preset_names, factory_presets, get_factory_preset,
    is_factory_preset,
};
pub use paths::{
    ensure_user_config_dir, ensure_user_presets_dir, find_preset, list_all_presets,
    list_system_presets, list_user_presets, preset_name_from_path, resolve_preset,
    system_presets_dir, user_config_dir, user_presets_dir,
};
pub use preset::Preset;
pub use shared::SharedParams;
pub use validation::{
    EffectValidator, ValidationError, ValidationResult, validate_effect, validate_effect_config,
    validate_effect_param, validate_preset,
};

pub use kinetone_effects::{EffectCategory, EffectDescriptor, EffectRegistry, EffectWithParams};
