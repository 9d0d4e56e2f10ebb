//! Shared CLI helpers used across multiple commands.

use kinetone_config::{EffectConfig, Preset, resolve_preset};

/// Parse a `key=value` string for clap's `value_parser`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!(
            "Invalid parameter format: '{s}' (expected key=value)"
        )),
    }
}

/// Parse a chain specification into effect configurations.
///
/// Format: `"effect1:param1=value1,param2=value2|effect2:param=value"`. A `!` before an
/// effect name adds it bypassed.
///
/// Examples:
/// - `"filter:fc=2kHz"`
/// - `"envelope_follower:sensitivity=3|delay:left_ms=300ms,feedback=40%"`
pub fn parse_chain(spec: &str) -> anyhow::Result<Vec<EffectConfig>> {
    spec.split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_effect_spec)
        .collect()
}

/// Parse a single `effect_name:param1=value1,param2=value2` specification.
fn parse_effect_spec(spec: &str) -> anyhow::Result<EffectConfig> {
    let (name, params) = spec.split_once(':').unwrap_or((spec, ""));
    let name = name.trim();
    if name.is_empty() || name == "!" {
        anyhow::bail!("Missing effect name in '{spec}'");
    }

    let mut config = EffectConfig::new(name);
    for param in params.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = parse_key_val(param).map_err(anyhow::Error::msg)?;
        config.set_param(key, value);
    }
    Ok(config)
}

/// Load a preset by path, by name from the preset directories, or from the factory set.
pub fn load_preset(name: &str) -> anyhow::Result<Preset> {
    resolve_preset(name).map_err(|e| {
        anyhow::anyhow!("{e}. Use 'kinetone effects' to see what a preset can contain.")
    })
}
