//! Effect and preset validation.
//!
//! Validation is driven by the [`ParamDescriptor`]s the effects themselves publish, so
//! effect ids, parameter names, units and ranges are always those of the registry. Presets
//! are checked as a whole and every problem is reported, not just the first.
//!
//! # Example
//!
//! ```rust
//! use kinetone_config::{validate_effect, EffectValidator};
//!
//! validate_effect("phaser").expect("phaser should exist");
//!
//! let mut validator = EffectValidator::new();
//! let (index, value) = validator.resolve_param("delay", "feedback", "40%").unwrap();
//! assert_eq!((index, value), (3, 40.0));
//! ```

use std::collections::{BTreeMap, HashMap};

use kinetone_core::ParamDescriptor;
use kinetone_effects::{EffectRegistry, EffectWithParams};
use thiserror::Error;

use crate::effect_config::resolve_param_value;

/// Sample rate used to instantiate effects for introspection.
const PROBE_SAMPLE_RATE: f64 = 48000.0;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Unknown effect type.
    #[error("unknown effect type: {0}")]
    UnknownEffect(String),

    /// Unknown parameter name.
    #[error("unknown parameter '{param}' for effect '{effect}'")]
    UnknownParameter {
        /// Name of the effect.
        effect: String,
        /// Name of the unrecognized parameter.
        param: String,
    },

    /// Parameter value out of range.
    #[error("parameter '{param}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Name of the parameter.
        param: String,
        /// The value that was out of range.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// Invalid parameter format.
    #[error("invalid format for parameter '{param}': {reason}")]
    InvalidFormat {
        /// Name of the parameter.
        param: String,
        /// Description of the format error.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validator for effects and their parameters.
///
/// Parameter descriptors are cached per effect id, so each effect is instantiated at most
/// once however many presets are checked.
pub struct EffectValidator {
    registry: EffectRegistry,
    param_cache: HashMap<String, Vec<ParamDescriptor>>,
}

impl Default for EffectValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectValidator {
    /// Create a new effect validator.
    pub fn new() -> Self {
        Self {
            registry: EffectRegistry::new(),
            param_cache: HashMap::new(),
        }
    }

    /// The registry effects are looked up in.
    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    /// Parameter descriptors of an effect, in index order.
    ///
    /// Returns `None` for unknown effects.
    pub fn param_descriptors(&mut self, effect_type: &str) -> Option<&[ParamDescriptor]> {
        if !self.param_cache.contains_key(effect_type) {
            let effect = self.registry.create(effect_type, PROBE_SAMPLE_RATE)?;
            let params = (0..effect.effect_param_count())
                .filter_map(|i| effect.effect_param_info(i))
                .collect();
            self.param_cache.insert(effect_type.to_string(), params);
        }
        self.param_cache.get(effect_type).map(Vec::as_slice)
    }

    /// Validate that an effect type exists.
    ///
    /// # Errors
    ///
    /// [`ValidationError::UnknownEffect`].
    pub fn validate_effect(&self, effect_type: &str) -> ValidationResult<()> {
        if self.registry.get(effect_type).is_some() {
            Ok(())
        } else {
            Err(ValidationError::UnknownEffect(effect_type.to_string()))
        }
    }

    /// Find a parameter by display or short name, ignoring case, spaces and dashes.
    ///
    /// # Errors
    ///
    /// [`ValidationError::UnknownEffect`] or [`ValidationError::UnknownParameter`].
    pub fn find_param(
        &mut self,
        effect_type: &str,
        param_name: &str,
    ) -> ValidationResult<(usize, ParamDescriptor)> {
        self.validate_effect(effect_type)?;
        let params = self
            .param_descriptors(effect_type)
            .ok_or_else(|| ValidationError::UnknownEffect(effect_type.to_string()))?;

        let wanted = normalize_param_name(param_name);
        params
            .iter()
            .enumerate()
            .find(|(_, desc)| {
                normalize_param_name(desc.short_name) == wanted
                    || normalize_param_name(desc.name) == wanted
            })
            .map(|(index, desc)| (index, *desc))
            .ok_or_else(|| ValidationError::UnknownParameter {
                effect: effect_type.to_string(),
                param: param_name.to_string(),
            })
    }

    /// Find a parameter index by name for an effect type.
    pub fn find_param_index(&mut self, effect_type: &str, param_name: &str) -> Option<usize> {
        self.find_param(effect_type, param_name)
            .ok()
            .map(|(index, _)| index)
    }

    /// Validate a parameter name for an effect.
    ///
    /// # Errors
    ///
    /// See [`find_param`](Self::find_param).
    pub fn validate_param_name(
        &mut self,
        effect_type: &str,
        param_name: &str,
    ) -> ValidationResult<()> {
        self.find_param(effect_type, param_name).map(|_| ())
    }

    /// Validate a numeric parameter value for an effect.
    ///
    /// # Errors
    ///
    /// [`ValidationError::OutOfRange`] as well as the lookup errors of
    /// [`find_param`](Self::find_param).
    pub fn validate_param_value(
        &mut self,
        effect_type: &str,
        param_name: &str,
        value: f64,
    ) -> ValidationResult<()> {
        let (_, desc) = self.find_param(effect_type, param_name)?;
        check_range(param_name, &desc, value)
    }

    /// Parse, unit-check and range-check a raw preset value.
    ///
    /// Returns the parameter index and the value ready for `set_param`.
    ///
    /// # Errors
    ///
    /// [`ValidationError::InvalidFormat`] for unparsable values or mismatched units,
    /// [`ValidationError::OutOfRange`], and the lookup errors of
    /// [`find_param`](Self::find_param).
    pub fn resolve_param(
        &mut self,
        effect_type: &str,
        param_name: &str,
        raw: &str,
    ) -> ValidationResult<(usize, f64)> {
        let (index, desc) = self.find_param(effect_type, param_name)?;
        let value =
            resolve_param_value(&desc, raw).map_err(|reason| ValidationError::InvalidFormat {
                param: param_name.to_string(),
                reason,
            })?;
        check_range(param_name, &desc, value)?;
        Ok((index, value))
    }

    /// Validate every parameter of one effect, collecting all problems.
    ///
    /// # Errors
    ///
    /// [`ValidationError::UnknownEffect`] on its own, otherwise one error or
    /// [`ValidationError::Multiple`].
    pub fn validate_params(
        &mut self,
        effect_type: &str,
        params: &BTreeMap<String, String>,
    ) -> ValidationResult<()> {
        self.validate_effect(effect_type)?;
        let errors = params
            .iter()
            .filter_map(|(name, raw)| self.resolve_param(effect_type, name, raw).err())
            .collect();
        collect_errors(errors)
    }

    /// Get all valid effect type IDs.
    pub fn effect_ids(&self) -> Vec<&'static str> {
        self.registry.descriptors().iter().map(|d| d.id).collect()
    }
}

fn check_range(param_name: &str, desc: &ParamDescriptor, value: f64) -> ValidationResult<()> {
    if desc.contains(value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            param: param_name.to_string(),
            value,
            min: desc.min,
            max: desc.max,
        })
    }
}

fn collect_errors(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

/// Normalize a parameter name for lookup: lowercase, spaces and dashes become underscores.
fn normalize_param_name(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Validate that an effect type exists.
///
/// ```rust
/// use kinetone_config::validate_effect;
///
/// assert!(validate_effect("convolver").is_ok());
/// assert!(validate_effect("fuzz").is_err());
/// ```
///
/// # Errors
///
/// [`ValidationError::UnknownEffect`].
pub fn validate_effect(effect_type: &str) -> ValidationResult<()> {
    EffectValidator::new().validate_effect(effect_type)
}

/// Validate one raw parameter value for an effect, returning the resolved value.
///
/// # Errors
///
/// See [`EffectValidator::resolve_param`].
pub fn validate_effect_param(
    effect_type: &str,
    param_name: &str,
    raw: &str,
) -> ValidationResult<f64> {
    EffectValidator::new()
        .resolve_param(effect_type, param_name, raw)
        .map(|(_, value)| value)
}

/// Validate a preset's effects and parameters.
///
/// Bypassed effects are checked too: toggling them back on must not fail.
///
/// # Errors
///
/// One error, or [`ValidationError::Multiple`] with every problem found.
pub fn validate_preset(preset: &crate::Preset) -> ValidationResult<()> {
    let mut validator = EffectValidator::new();
    let mut errors = Vec::new();

    for effect in &preset.effects {
        match validator.validate_params(effect.canonical_type(), &effect.params) {
            Ok(()) => {}
            Err(ValidationError::Multiple(inner)) => errors.extend(inner),
            Err(e) => errors.push(e),
        }
    }

    collect_errors(errors)
}

/// Validate a map of parameter name to raw value against an effect type.
///
/// # Errors
///
/// See [`EffectValidator::validate_params`].
pub fn validate_effect_config(
    effect_type: &str,
    params: &BTreeMap<String, String>,
) -> ValidationResult<()> {
    EffectValidator::new().validate_params(effect_type, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EffectConfig, Preset};

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_validate_known_effects() {
        let validator = EffectValidator::new();
        for id in validator.effect_ids() {
            assert!(validator.validate_effect(id).is_ok(), "{id} should validate");
        }
        assert_eq!(validator.effect_ids().len(), 9);
    }

    #[test]
    fn test_validate_unknown_effect() {
        assert_eq!(
            validate_effect("reverb"),
            Err(ValidationError::UnknownEffect("reverb".to_string()))
        );
    }

    #[test]
    fn test_find_param_by_short_and_display_name() {
        let mut validator = EffectValidator::new();
        assert_eq!(validator.find_param_index("delay", "left_ms"), Some(5));
        assert_eq!(validator.find_param_index("delay", "Left Delay"), Some(5));
        assert_eq!(validator.find_param_index("delay", "left-delay"), Some(5));
        assert_eq!(validator.find_param_index("delay", "FEEDBACK"), Some(3));
        assert_eq!(validator.find_param_index("delay", "size"), None);
        assert_eq!(validator.find_param_index("fuzz", "drive"), None);
    }

    #[test]
    fn test_validate_param_name() {
        let mut validator = EffectValidator::new();
        assert!(validator.validate_param_name("phaser", "rate").is_ok());
        assert_eq!(
            validator.validate_param_name("phaser", "mix"),
            Err(ValidationError::UnknownParameter {
                effect: "phaser".to_string(),
                param: "mix".to_string(),
            })
        );
    }

    #[test]
    fn test_validate_param_value_range() {
        let mut validator = EffectValidator::new();
        assert!(validator.validate_param_value("pitch_shift", "semitones", 12.0).is_ok());
        assert!(matches!(
            validator.validate_param_value("pitch_shift", "semitones", 30.0),
            Err(ValidationError::OutOfRange { max, .. }) if max == 24.0
        ));
    }

    #[test]
    fn test_resolve_param_units() {
        let mut validator = EffectValidator::new();
        assert_eq!(validator.resolve_param("filter", "fc", "2kHz"), Ok((1, 2000.0)));
        assert_eq!(
            validator.resolve_param("delay", "left_ms", "0.25s"),
            Ok((5, 250.0))
        );
        assert!(matches!(
            validator.resolve_param("delay", "left_ms", "250Hz"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            validator.resolve_param("delay", "feedback", "lots"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_effect_config_valid() {
        let p = params(&[("rate", "0.5Hz"), ("depth", "80%"), ("feedback", "30%")]);
        assert!(validate_effect_config("flanger", &p).is_ok());
    }

    #[test]
    fn test_validate_effect_config_collects_errors() {
        let p = params(&[("rate", "1000Hz"), ("depth", "loud"), ("colour", "1")]);
        match validate_effect_config("chorus", &p) {
            Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected three errors, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_effect_config_unknown_effect_is_single_error() {
        let p = params(&[("drive", "1")]);
        assert_eq!(
            validate_effect_config("fuzz", &p),
            Err(ValidationError::UnknownEffect("fuzz".to_string()))
        );
    }

    #[test]
    fn test_validate_effect_param_returns_value() {
        assert_eq!(validate_effect_param("convolver", "mix", "50%"), Ok(50.0));
        assert!(validate_effect_param("convolver", "mix", "150%").is_err());
    }

    #[test]
    fn test_validate_preset_reports_every_problem() {
        let preset = Preset::new("Broken")
            .with_effect(EffectConfig::new("fuzz"))
            .with_effect(EffectConfig::new("!delay").with_param("feedback", "120%"))
            .with_effect(EffectConfig::new("filter").with_param("fc", "1kHz"));

        match validate_preset(&preset) {
            Err(ValidationError::Multiple(errors)) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0], ValidationError::UnknownEffect("fuzz".to_string()));
                assert!(matches!(errors[1], ValidationError::OutOfRange { .. }));
            }
            other => panic!("expected two errors, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_preset_ok() {
        let preset = Preset::new("Fine")
            .with_effect(EffectConfig::new("phaser").with_param("intensity", "60%"))
            .with_effect(EffectConfig::new("pitch_shift").with_param("semitones", "-7st"));
        assert!(validate_preset(&preset).is_ok());
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::OutOfRange {
            param: "feedback".to_string(),
            value: 120.0,
            min: 0.0,
            max: 99.0,
        };
        assert_eq!(
            err.to_string(),
            "parameter 'feedback' value 120 out of range [0, 99]"
        );

        let multi = ValidationError::Multiple(vec![
            ValidationError::UnknownEffect("a".to_string()),
            ValidationError::UnknownEffect("b".to_string()),
        ]);
        assert_eq!(
            multi.to_string(),
            "multiple validation errors: unknown effect type: a; unknown effect type: b"
        );
    }

    #[test]
    fn test_param_ranges_are_sensible() {
        let mut validator = EffectValidator::new();
        for id in validator.effect_ids() {
            let descriptors = validator.param_descriptors(id).unwrap().to_vec();
            assert!(!descriptors.is_empty(), "{id} has no parameters");
            for desc in descriptors {
                assert!(desc.min <= desc.max, "{id}.{}: min > max", desc.short_name);
                assert!(
                    desc.contains(desc.default),
                    "{id}.{}: default {} outside [{}, {}]",
                    desc.short_name,
                    desc.default,
                    desc.min,
                    desc.max
                );
                assert_eq!(
                    validator.find_param(id, desc.short_name).map(|(_, d)| d),
                    Ok(desc)
                );
            }
        }
    }
}
