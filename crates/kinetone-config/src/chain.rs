//! Effect chain management.
//!
//! [`EffectChain`] runs a list of registry effects in series, respecting per-entry bypass
//! flags. Chains are built from presets or programmatically, and their parameters are
//! addressed by name with the same unit-aware strings presets use.
//!
//! # Example
//!
//! ```rust
//! use kinetone_config::{EffectChain, EffectConfig, Preset};
//! use kinetone_core::Effect;
//!
//! let preset = Preset::new("Slap")
//!     .with_effect(EffectConfig::new("filter").with_param("fc", "3kHz"))
//!     .with_effect(EffectConfig::new("delay").with_param("left_ms", "90ms"));
//!
//! let mut chain = EffectChain::from_preset(&preset, 48000.0).unwrap();
//! let output = chain.process(0.5);
//! assert!(output.is_finite());
//! ```

use kinetone_core::Effect;
use kinetone_effects::{EffectRegistry, EffectWithParams};

use crate::effect_config::EffectConfig;
use crate::error::ConfigError;
use crate::preset::Preset;
use crate::validation::{EffectValidator, ValidationError, validate_preset};

/// Widest frame the chain carries between stages.
const MAX_CHANNELS: usize = 2;

/// An entry in the effect chain.
struct ChainEntry {
    effect: Box<dyn EffectWithParams + Send>,
    bypassed: bool,
    effect_type: String,
}

/// A chain of effects that can be processed as a unit.
///
/// Bypassed entries keep their state and parameters but are skipped when processing and
/// do not count towards [`latency_samples`](Effect::latency_samples). The chain itself
/// implements [`Effect`], so it can be used anywhere a single effect can.
pub struct EffectChain {
    entries: Vec<ChainEntry>,
    sample_rate: f64,
    validator: EffectValidator,
}

impl EffectChain {
    /// Create a new empty effect chain.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            entries: Vec::new(),
            sample_rate,
            validator: EffectValidator::new(),
        }
    }

    /// Create an effect chain from a preset.
    ///
    /// The whole preset is validated first so every problem is reported at once; then
    /// each effect is created and its parameters are replayed through `set_param`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Validation`] if any effect, parameter name or value is invalid.
    pub fn from_preset(preset: &Preset, sample_rate: f64) -> Result<Self, ConfigError> {
        validate_preset(preset)?;

        let mut chain = Self::new(sample_rate);
        for effect_config in &preset.effects {
            chain.add_effect_config(effect_config)?;
        }

        tracing::info!(
            preset = %preset.name,
            effects = chain.len(),
            latency = chain.latency_samples(),
            sample_rate,
            "built effect chain"
        );
        Ok(chain)
    }

    /// Create an effect chain from effect type strings.
    ///
    /// Effect types can be prefixed with `!` to bypass them.
    ///
    /// ```rust
    /// use kinetone_config::EffectChain;
    ///
    /// let chain = EffectChain::from_effect_types(&["phaser", "!delay"], 48000.0).unwrap();
    /// assert_eq!(chain.effect_types(), vec!["phaser", "!delay"]);
    /// ```
    ///
    /// # Errors
    ///
    /// [`ConfigError::Validation`] for an unregistered type.
    pub fn from_effect_types(types: &[&str], sample_rate: f64) -> Result<Self, ConfigError> {
        let mut chain = Self::new(sample_rate);
        for effect_type in types {
            chain.add_effect(effect_type)?;
        }
        Ok(chain)
    }

    /// Add an effect from a configuration, applying its parameters.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Validation`] for the first unknown effect, unknown parameter or
    /// rejected value.
    pub fn add_effect_config(&mut self, config: &EffectConfig) -> Result<(), ConfigError> {
        let effect_type = config.canonical_type();
        let mut effect = self
            .validator
            .registry()
            .create(effect_type, self.sample_rate)
            .ok_or_else(|| ValidationError::UnknownEffect(effect_type.to_string()))?;

        for (name, raw) in &config.params {
            let (index, value) = self.validator.resolve_param(effect_type, name, raw)?;
            effect.effect_set_param(index, value);
        }

        tracing::debug!(
            effect = effect_type,
            params = config.params.len(),
            bypassed = config.bypassed,
            "added effect to chain"
        );
        self.entries.push(ChainEntry {
            effect,
            bypassed: config.bypassed,
            effect_type: effect_type.to_string(),
        });
        Ok(())
    }

    /// Add an effect by type name with default parameters.
    ///
    /// Use `!` prefix to add as bypassed.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Validation`] for an unregistered type.
    pub fn add_effect(&mut self, effect_type: &str) -> Result<(), ConfigError> {
        self.add_effect_config(&EffectConfig::new(effect_type))
    }

    /// Add an already-created effect instance.
    pub fn add_effect_instance(
        &mut self,
        effect: Box<dyn EffectWithParams + Send>,
        effect_type: &str,
        bypassed: bool,
    ) {
        self.entries.push(ChainEntry {
            effect,
            bypassed,
            effect_type: effect_type.to_string(),
        });
    }

    /// Set a parameter of the effect at `index` from a preset-style string.
    ///
    /// Returns the value that was applied.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoSuchEntry`] for an index past the end, otherwise as
    /// [`add_effect_config`](Self::add_effect_config).
    pub fn set_param(&mut self, index: usize, name: &str, raw: &str) -> Result<f64, ConfigError> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(ConfigError::NoSuchEntry { index, len })?;
        let (param_index, value) = self
            .validator
            .resolve_param(&entry.effect_type, name, raw)?;
        entry.effect.effect_set_param(param_index, value);
        Ok(value)
    }

    /// Get the sample rate.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Get the number of effects in the chain.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get effect types in the chain (with ! prefix for bypassed).
    pub fn effect_types(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| {
                if e.bypassed {
                    format!("!{}", e.effect_type)
                } else {
                    e.effect_type.clone()
                }
            })
            .collect()
    }

    /// Check if an effect at the given index is bypassed.
    pub fn is_bypassed(&self, index: usize) -> Option<bool> {
        self.entries.get(index).map(|e| e.bypassed)
    }

    /// Set the bypass state for an effect at the given index.
    ///
    /// Returns `false` if there is no effect at `index`.
    pub fn set_bypassed(&mut self, index: usize, bypassed: bool) -> bool {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.bypassed = bypassed;
            true
        } else {
            false
        }
    }

    /// Toggle bypass for an effect at the given index.
    pub fn toggle_bypass(&mut self, index: usize) -> Option<bool> {
        self.entries.get_mut(index).map(|e| {
            e.bypassed = !e.bypassed;
            e.bypassed
        })
    }

    /// Remove an effect at the given index.
    pub fn remove(&mut self, index: usize) -> Option<Box<dyn EffectWithParams + Send>> {
        (index < self.entries.len()).then(|| self.entries.remove(index).effect)
    }

    /// Clear all effects from the chain.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Get the effect type at a given index.
    pub fn get_effect_type(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|e| e.effect_type.as_str())
    }

    /// Get an effect reference by index.
    pub fn get_effect(&self, index: usize) -> Option<&(dyn EffectWithParams + Send)> {
        self.entries.get(index).map(|e| e.effect.as_ref())
    }

    /// Get a mutable effect reference by index.
    pub fn get_effect_mut(
        &mut self,
        index: usize,
    ) -> Option<&mut Box<dyn EffectWithParams + Send>> {
        self.entries.get_mut(index).map(|e| &mut e.effect)
    }

    /// The registry the chain creates effects from.
    pub fn registry(&self) -> &EffectRegistry {
        self.validator.registry()
    }

    fn active(&mut self) -> impl Iterator<Item = &mut ChainEntry> {
        self.entries.iter_mut().filter(|e| !e.bypassed)
    }
}


impl Effect for EffectChain {
    fn process(&mut self, input: f64) -> f64 {
        self.active()
            .fold(input, |sample, entry| entry.effect.process(sample))
    }

    fn process_block(&mut self, input: &[f64], output: &mut [f64]) {
        output.copy_from_slice(input);
        self.process_block_inplace(output);
    }

    fn process_block_inplace(&mut self, buffer: &mut [f64]) {
        for entry in self.active() {
            entry.effect.process_block_inplace(buffer);
        }
    }

    /// Carries up to two channels between stages; wider outputs repeat the last one.
    fn process_frame(&mut self, input: &[f64], output: &mut [f64]) -> bool {
        let Some(&last_in) = input.last() else {
            return false;
        };
        if output.is_empty() {
            return false;
        }
        let channels = output.len().min(MAX_CHANNELS);

        let mut frame = [0.0; MAX_CHANNELS];
        for (ch, slot) in frame[..channels].iter_mut().enumerate() {
            *slot = input.get(ch).copied().unwrap_or(last_in);
        }

        for entry in self.active() {
            let mut next = [0.0; MAX_CHANNELS];
            if !entry
                .effect
                .process_frame(&frame[..channels], &mut next[..channels])
            {
                return false;
            }
            frame = next;
        }

        let (head, tail) = output.split_at_mut(channels);
        head.copy_from_slice(&frame[..channels]);
        tail.fill(frame[channels - 1]);
        true
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        for entry in &mut self.entries {
            entry.effect.set_sample_rate(sample_rate);
        }
    }

    fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.effect.reset();
        }
    }

    fn latency_samples(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.bypassed)
            .map(|e| e.effect.latency_samples())
            .sum()
    }
}
