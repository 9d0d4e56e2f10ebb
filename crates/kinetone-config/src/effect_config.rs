//! Effect configuration types and parameter value parsing.

use kinetone_core::{ParamDescriptor, ParamUnit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for a single effect in a preset.
///
/// Each effect has a type identifier and optional parameters. Effects can be
/// bypassed by prefixing the type with `!` (e.g., `!phaser`).
///
/// # Example
///
/// ```rust
/// use kinetone_config::EffectConfig;
///
/// let config = EffectConfig::new("delay")
///     .with_param("left_ms", "375ms")
///     .with_param("feedback", "40%");
///
/// assert_eq!(config.effect_type, "delay");
/// assert!(!config.bypassed);
/// assert_eq!(config.parse_param("left_ms"), Some(375.0));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EffectConfig {
    /// Registry id of the effect. A `!` prefix marks the entry as bypassed.
    #[serde(rename = "type")]
    pub effect_type: String,

    /// Whether the effect is bypassed.
    #[serde(default)]
    pub bypassed: bool,

    /// Effect parameters as key-value pairs, keyed by display or short name.
    /// Values are strings so they can carry units ("800Hz", "-6dB", "40%").
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl EffectConfig {
    /// Create a new effect configuration.
    ///
    /// If the type starts with `!`, the effect will be marked as bypassed.
    pub fn new(effect_type: impl Into<String>) -> Self {
        let type_str = effect_type.into();
        let (effect_type, bypassed) = match type_str.strip_prefix('!') {
            Some(stripped) => (stripped.to_string(), true),
            None => (type_str, false),
        };

        Self {
            effect_type,
            bypassed,
            params: BTreeMap::new(),
        }
    }

    /// Move a `!` prefix on the type into the `bypassed` flag.
    ///
    /// Presets loaded from TOML pass through this, so `type = "!phaser"` and
    /// `bypassed = true` mean the same thing.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if let Some(stripped) = self.effect_type.strip_prefix('!') {
            self.effect_type = stripped.to_string();
            self.bypassed = true;
        }
        self
    }

    /// Add a parameter to the configuration.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set whether the effect is bypassed.
    #[must_use]
    pub fn with_bypass(mut self, bypassed: bool) -> Self {
        self.bypassed = bypassed;
        self
    }

    /// Get a raw parameter value.
    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Set a parameter value.
    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Parse a parameter value with [`parse_param_value`].
    pub fn parse_param(&self, key: &str) -> Option<f64> {
        parse_param_value(self.params.get(key)?)
    }

    /// Get the canonical effect type (without bypass prefix).
    pub fn canonical_type(&self) -> &str {
        self.effect_type.strip_prefix('!').unwrap_or(&self.effect_type)
    }

    /// Get the effect type string for display (with ! prefix if bypassed).
    pub fn display_type(&self) -> String {
        if self.bypassed {
            format!("!{}", self.canonical_type())
        } else {
            self.canonical_type().to_string()
        }
    }
}

/// A parsed parameter value and the unit its suffix named, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedValue {
    /// Value in kinetone's parameter units (percent, dB, ms, Hz, semitones).
    pub value: f64,
    /// Unit implied by the suffix; `None` for plain numbers.
    pub unit: Option<ParamUnit>,
}

/// Parse a parameter value string, keeping the unit its suffix named.
///
/// Values come back in the units effect parameters use:
///
/// | Input | Value | Unit |
/// |-------|-------|------|
/// | `"0.5"`, `"-3"` | as written | none |
/// | `"50%"` | 50.0 | Percent |
/// | `"-6dB"` | -6.0 | Decibels |
/// | `"250ms"`, `"1.5s"` | 250.0, 1500.0 | Milliseconds |
/// | `"440Hz"`, `"1.2kHz"` | 440.0, 1200.0 | Hertz |
/// | `"7st"` | 7.0 | Semitones |
/// | `"on"`, `"off"`, `"true"`, `"false"` | 1.0, 0.0 | Toggle |
pub fn parse_value_with_unit(value: &str) -> Option<ParsedValue> {
    let value = value.trim();
    let number = |s: &str| s.trim().parse::<f64>().ok().filter(|v| v.is_finite());
    let with_unit = |v: f64, unit: ParamUnit| ParsedValue {
        value: v,
        unit: Some(unit),
    };

    if value.eq_ignore_ascii_case("on") || value.eq_ignore_ascii_case("true") {
        return Some(with_unit(1.0, ParamUnit::Toggle));
    }
    if value.eq_ignore_ascii_case("off") || value.eq_ignore_ascii_case("false") {
        return Some(with_unit(0.0, ParamUnit::Toggle));
    }

    if let Some(pct) = value.strip_suffix('%') {
        return number(pct).map(|v| with_unit(v, ParamUnit::Percent));
    }
    if let Some(db) = value
        .strip_suffix("dB")
        .or_else(|| value.strip_suffix("db"))
    {
        return number(db).map(|v| with_unit(v, ParamUnit::Decibels));
    }
    // kHz before Hz, ms before s
    if let Some(khz) = value
        .strip_suffix("kHz")
        .or_else(|| value.strip_suffix("khz"))
    {
        return number(khz).map(|v| with_unit(v * 1000.0, ParamUnit::Hertz));
    }
    if let Some(hz) = value
        .strip_suffix("Hz")
        .or_else(|| value.strip_suffix("hz"))
    {
        return number(hz).map(|v| with_unit(v, ParamUnit::Hertz));
    }
    if let Some(ms) = value.strip_suffix("ms") {
        return number(ms).map(|v| with_unit(v, ParamUnit::Milliseconds));
    }
    if let Some(s) = value.strip_suffix('s') {
        return number(s).map(|v| with_unit(v * 1000.0, ParamUnit::Milliseconds));
    }
    if let Some(st) = value.strip_suffix("st") {
        return number(st).map(|v| with_unit(v, ParamUnit::Semitones));
    }

    number(value).map(|v| ParsedValue {
        value: v,
        unit: None,
    })
}

/// Parse a parameter value string into an `f64` in parameter units.
///
/// See [`parse_value_with_unit`] for the accepted formats.
///
/// ```rust
/// use kinetone_config::parse_param_value;
///
/// assert_eq!(parse_param_value("1.2kHz"), Some(1200.0));
/// assert_eq!(parse_param_value("40%"), Some(40.0));
/// assert_eq!(parse_param_value("0.25s"), Some(250.0));
/// assert_eq!(parse_param_value("loud"), None);
/// ```
pub fn parse_param_value(value: &str) -> Option<f64> {
    parse_value_with_unit(value).map(|parsed| parsed.value)
}

/// Parse `raw` for the parameter described by `desc`.
///
/// Plain numbers are accepted for every parameter. A unit suffix must match the
/// parameter's unit; toggles also accept on/off words. Range is not checked here.
///
/// # Errors
///
/// A description of the problem when the value cannot be parsed or its unit does not
/// fit the parameter.
pub fn resolve_param_value(desc: &ParamDescriptor, raw: &str) -> Result<f64, String> {
    let parsed =
        parse_value_with_unit(raw).ok_or_else(|| format!("cannot parse '{}' as a value", raw.trim()))?;
    match parsed.unit {
        None => Ok(parsed.value),
        Some(unit) if unit == desc.unit => Ok(parsed.value),
        Some(unit) => Err(format!(
            "expected {}, got {}",
            unit_name(desc.unit),
            unit_name(unit)
        )),
    }
}

fn unit_name(unit: ParamUnit) -> &'static str {
    match unit {
        ParamUnit::Decibels => "dB",
        ParamUnit::Hertz => "Hz",
        ParamUnit::Milliseconds => "a time",
        ParamUnit::Percent => "a percentage",
        ParamUnit::Semitones => "semitones",
        ParamUnit::Index => "a choice index",
        ParamUnit::Toggle => "on/off",
        ParamUnit::None => "a plain number",
    }
}
