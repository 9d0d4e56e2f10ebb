//! Factory presets bundled with kinetone.
//!
//! These are always available without files on disk and double as examples of the
//! preset format. Each one validates against the effect registry.

use crate::Preset;

/// Identifiers of the factory presets, in listing order.
pub static FACTORY_PRESET_NAMES: &[&str] = &[
    "init",
    "wah",
    "slapback",
    "ping_pong",
    "jet_flanger",
    "dream_chorus",
    "phase_90",
    "telephone",
    "octave_up",
];

static FACTORY_PRESETS_TOML: &[(&str, &str)] = &[
    ("init", INIT_PRESET),
    ("wah", WAH_PRESET),
    ("slapback", SLAPBACK_PRESET),
    ("ping_pong", PING_PONG_PRESET),
    ("jet_flanger", JET_FLANGER_PRESET),
    ("dream_chorus", DREAM_CHORUS_PRESET),
    ("phase_90", PHASE_90_PRESET),
    ("telephone", TELEPHONE_PRESET),
    ("octave_up", OCTAVE_UP_PRESET),
];

const INIT_PRESET: &str = r#"
name = "Init"
description = "Clean signal path, every stage bypassed"

[[effects]]
type = "!filter"

[[effects]]
type = "!phaser"

[[effects]]
type = "!delay"
"#;

const WAH_PRESET: &str = r#"
name = "Auto Wah"
description = "Envelope-following resonant low-pass"

[[effects]]
type = "envelope_follower"
[effects.params]
fc = "400Hz"
q = "6"
attack = "5ms"
release = "80ms"
threshold = "-35dB"
sensitivity = "3"
"#;

const SLAPBACK_PRESET: &str = r#"
name = "Slapback"
description = "Darkened single repeat, slightly wider on the right"

[[effects]]
type = "filter"
[effects.params]
algorithm = "7"
fc = "4kHz"

[[effects]]
type = "delay"
[effects.params]
left_ms = "90ms"
right_ms = "95ms"
feedback = "10%"
wet = "-6dB"
dry = "0dB"
"#;

const PING_PONG_PRESET: &str = r#"
name = "Ping Pong"
description = "Dotted-eighth repeats bouncing between channels at 120 BPM"

[[effects]]
type = "delay"
[effects.params]
algorithm = "1"
left_ms = "375ms"
right_ms = "375ms"
feedback = "45%"
wet = "-6dB"
dry = "0dB"
"#;

const JET_FLANGER_PRESET: &str = r#"
name = "Jet Flanger"
description = "Slow, deep sweep with heavy regeneration"

[[effects]]
type = "flanger"
[effects.params]
rate = "0.15Hz"
depth = "90%"
feedback = "70%"
"#;

const DREAM_CHORUS_PRESET: &str = r#"
name = "Dream Chorus"
description = "Chorus into a short diffuse room"

[[effects]]
type = "chorus"
[effects.params]
rate = "0.6Hz"
depth = "60%"

[[effects]]
type = "convolver"
[effects.params]
decay = "60ms"
mix = "25%"
"#;

const PHASE_90_PRESET: &str = r#"
name = "Phase 90"
description = "Six-stage phaser with moderate resonance"

[[effects]]
type = "phaser"
[effects.params]
rate = "0.5Hz"
depth = "100%"
intensity = "60%"
"#;

const TELEPHONE_PRESET: &str = r#"
name = "Telephone"
description = "Band-limited voice line"

[[effects]]
type = "filter"
[effects.params]
algorithm = "8"
fc = "300Hz"

[[effects]]
type = "filter"
[effects.params]
algorithm = "7"
fc = "3.4kHz"
"#;

const OCTAVE_UP_PRESET: &str = r#"
name = "Octave Up"
description = "Peak-locked phase-vocoder shift up twelve semitones"

[[effects]]
type = "pitch_shift"
[effects.params]
semitones = "12st"
locking = "on"
tracking = "on"
"#;

/// All factory presets, in listing order.
///
/// ```rust
/// use kinetone_config::factory_presets;
///
/// for preset in factory_presets() {
///     println!("{}: {}", preset.name, preset.description.as_deref().unwrap_or(""));
/// }
/// ```
pub fn factory_presets() -> Vec<Preset> {
    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(_, toml)| Preset::from_toml(toml).ok())
        .collect()
}

/// Get a factory preset by identifier or display name, ignoring case.
///
/// ```rust
/// use kinetone_config::get_factory_preset;
///
/// assert_eq!(get_factory_preset("wah").unwrap().name, "Auto Wah");
/// assert_eq!(get_factory_preset("auto wah").unwrap().name, "Auto Wah");
/// assert!(get_factory_preset("fuzz").is_none());
/// ```
pub fn get_factory_preset(name: &str) -> Option<Preset> {
    if let Some((_, toml)) = FACTORY_PRESETS_TOML
        .iter()
        .find(|(id, _)| id.eq_ignore_ascii_case(name))
    {
        return Preset::from_toml(toml).ok();
    }
    factory_presets()
        .into_iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(name))
}

/// Identifiers of all factory presets.
pub fn factory_preset_names() -> Vec<&'static str> {
    FACTORY_PRESETS_TOML.iter().map(|(name, _)| *name).collect()
}

/// Whether `name` names a factory preset, by identifier or display name.
///
/// ```rust
/// use kinetone_config::is_factory_preset;
///
/// assert!(is_factory_preset("slapback"));
/// assert!(is_factory_preset("Jet Flanger"));
/// assert!(!is_factory_preset("my_custom_preset"));
/// ```
pub fn is_factory_preset(name: &str) -> bool {
    get_factory_preset(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EffectChain, validate_preset};
    use kinetone_core::Effect;

    #[test]
    fn test_every_factory_preset_parses() {
        assert_eq!(factory_presets().len(), FACTORY_PRESETS_TOML.len());
    }

    #[test]
    fn test_names_match_table() {
        assert_eq!(factory_preset_names(), FACTORY_PRESET_NAMES.to_vec());
    }

    #[test]
    fn test_all_factory_presets_validate() {
        for preset in factory_presets() {
            if let Err(e) = validate_preset(&preset) {
                panic!("factory preset '{}' is invalid: {e}", preset.name);
            }
        }
    }

    #[test]
    fn test_all_factory_presets_build_and_run() {
        for preset in factory_presets() {
            let mut chain = EffectChain::from_preset(&preset, f64::from(preset.sample_rate))
                .unwrap_or_else(|e| panic!("{}: {e}", preset.name));
            for n in 0..2048 {
                let x = (n as f64 * 0.03).sin() * 0.5;
                let y = chain.process(x);
                assert!(y.is_finite(), "{} produced {y} at sample {n}", preset.name);
            }
        }
    }

    #[test]
    fn test_init_bypasses_everything() {
        let init = get_factory_preset("init").unwrap();
        assert_eq!(init.len(), 3);
        assert!(init.effects.iter().all(|e| e.bypassed));

        let mut chain = EffectChain::from_preset(&init, 48000.0).unwrap();
        assert_eq!(chain.process(0.3), 0.3);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert!(get_factory_preset("PING_PONG").is_some());
        assert!(get_factory_preset("phase 90").is_some());
        assert!(!is_factory_preset(""));
    }

    #[test]
    fn test_octave_up_latency() {
        let preset = get_factory_preset("octave_up").unwrap();
        let chain = EffectChain::from_preset(&preset, 48000.0).unwrap();
        assert_eq!(chain.latency_samples(), 4096);
    }
}
