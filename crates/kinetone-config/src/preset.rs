//! Named effect chains as stored on disk.
//!
//! A [`Preset`] is the persisted form of an [`EffectChain`]: an ordered list of
//! [`EffectConfig`] entries whose parameter values stay exactly as written (`"800Hz"`,
//! `"-6dB"`, `"on"`). Units are interpreted against the registry's descriptors only
//! when the preset is validated or built, so a hand-edited file round-trips unchanged.
//!
//! ```toml
//! name = "Wah into slap"
//! description = "Envelope wah feeding a short stereo delay"
//! sample_rate = 48000
//!
//! [[effects]]
//! type = "envelope_follower"
//! [effects.params]
//! fc = "800Hz"
//! sensitivity = "2.5"
//!
//! [[effects]]
//! type = "!delay"
//! [effects.params]
//! left_ms = "90ms"
//! feedback = "20%"
//! ```
//!
//! A `!` before the type keeps the entry in the chain but bypasses it; on load it is
//! folded into the entry's `bypassed` flag.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chain::EffectChain;
use crate::effect_config::EffectConfig;
use crate::error::{ConfigError, IoAction};
use crate::validation::{ValidationResult, validate_preset};

const VOICED_SAMPLE_RATE: u32 = 48000;

fn voiced_sample_rate() -> u32 {
    VOICED_SAMPLE_RATE
}

/// An ordered, named effect chain with raw parameter text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preset {
    /// Display name.
    pub name: String,

    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Rate the preset was voiced at. Times and frequencies are stored in ms and Hz,
    /// so it builds at any rate.
    #[serde(default = "voiced_sample_rate")]
    pub sample_rate: u32,

    /// Chain entries in processing order.
    #[serde(default)]
    pub effects: Vec<EffectConfig>,
}

impl Preset {
    /// An empty chain voiced at 48 kHz.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            sample_rate: VOICED_SAMPLE_RATE,
            effects: Vec::new(),
        }
    }

    /// Append one entry.
    #[must_use]
    pub fn with_effect(mut self, effect: EffectConfig) -> Self {
        self.effects.push(effect.normalized());
        self
    }

    /// Append several entries.
    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = EffectConfig>) -> Self {
        self.effects
            .extend(effects.into_iter().map(EffectConfig::normalized));
        self
    }

    /// Number of entries, bypassed ones included.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// True when the chain has no entries.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Entries that will process audio, in order.
    pub fn active(&self) -> impl Iterator<Item = &EffectConfig> {
        self.effects.iter().filter(|effect| !effect.bypassed)
    }

    /// Store `value` for `key` on the entry at `index`. The text is kept as given and
    /// checked on [`validate`](Self::validate) or [`build`](Self::build).
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoSuchEntry`] when `index` is past the last entry.
    pub fn set_param(
        &mut self,
        index: usize,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ConfigError> {
        let len = self.effects.len();
        let entry = self
            .effects
            .get_mut(index)
            .ok_or(ConfigError::NoSuchEntry { index, len })?;
        entry.set_param(key, value);
        Ok(())
    }

    /// Check every entry, bypassed ones included, against the effect registry.
    ///
    /// # Errors
    ///
    /// Every problem found, as one [`ValidationError`](crate::ValidationError).
    pub fn validate(&self) -> ValidationResult<()> {
        validate_preset(self)
    }

    /// Build a runnable chain at `sample_rate`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Validation`] if the preset does not validate.
    pub fn build(&self, sample_rate: f64) -> Result<EffectChain, ConfigError> {
        EffectChain::from_preset(self, sample_rate)
    }

    /// Parse preset text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] if the text is not a preset.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let mut preset: Self = toml::from_str(text)?;
        preset.effects = preset
            .effects
            .into_iter()
            .map(EffectConfig::normalized)
            .collect();
        Ok(preset)
    }

    /// Encode as preset text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Serialize`].
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Read a preset file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] or [`ConfigError::Parse`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::io(IoAction::Read, path, e))?;
        let preset = Self::from_toml(&text)?;
        tracing::debug!(
            path = %path.display(),
            name = %preset.name,
            effects = preset.len(),
            "loaded preset"
        );
        Ok(preset)
    }

    /// Write a preset file, creating missing parent directories.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Serialize`] or [`ConfigError::Io`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = self.to_toml()?;
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .map_err(|e| ConfigError::io(IoAction::CreateDir, dir, e))?;
        }
        std::fs::write(path, text).map_err(|e| ConfigError::io(IoAction::Write, path, e))?;
        tracing::debug!(path = %path.display(), name = %self.name, "saved preset");
        Ok(())
    }
}
