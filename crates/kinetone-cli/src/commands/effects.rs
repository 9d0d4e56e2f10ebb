//! Effect listing and information command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use kinetone_core::{Effect, ParamDescriptor, ParamUnit};
use kinetone_effects::{EffectRegistry, EffectWithParams};

#[derive(Args)]
pub struct EffectsArgs {
    /// Show details for a specific effect (id or display name)
    #[arg(value_name = "EFFECT")]
    effect: Option<String>,
}

/// Value with its unit, in the form a preset or `--param` accepts.
fn format_value(desc: &ParamDescriptor, value: f64) -> String {
    match desc.unit {
        ParamUnit::Toggle => if value >= 0.5 { "on" } else { "off" }.to_string(),
        ParamUnit::Index => format!("{value:.0}"),
        unit => format!("{value}{}", unit.suffix().trim_start()),
    }
}

fn format_range(desc: &ParamDescriptor) -> String {
    match desc.unit {
        ParamUnit::Toggle => "on|off".to_string(),
        _ => format!(
            "{} to {}",
            format_value(desc, desc.min),
            format_value(desc, desc.max)
        ),
    }
}

fn param_rows(effect: &dyn EffectWithParams) -> Vec<(ParamDescriptor, String, String)> {
    (0..effect.effect_param_count())
        .filter_map(|i| effect.effect_param_info(i))
        .map(|desc| (desc, format_value(&desc, desc.default), format_range(&desc)))
        .collect()
}

pub fn run(args: &EffectsArgs) -> anyhow::Result<()> {
    let registry = EffectRegistry::new();

    let Some(name) = &args.effect else {
        println!("Available Effects");
        println!("=================");
        println!();
        for desc in registry.descriptors() {
            println!(
                "  {:18} {:12} - {}",
                desc.id,
                desc.category.name(),
                desc.description
            );
        }
        println!();
        println!("Use 'kinetone effects <name>' for detailed parameter info.");
        return Ok(());
    };

    let desc = registry
        .lookup(name)
        .ok_or_else(|| anyhow::anyhow!("Unknown effect: {name}"))?;
    let effect = registry
        .create(desc.id, 48000.0)
        .ok_or_else(|| anyhow::anyhow!("Could not create effect: {}", desc.id))?;

    println!("{} ({})", desc.name, desc.id);
    println!("{}", "=".repeat(desc.name.len() + desc.id.len() + 3));
    println!();
    println!("{}", desc.description);
    if effect.latency_samples() > 0 {
        println!("Latency: {} samples", effect.latency_samples());
    }
    println!();

    let rows = param_rows(effect.as_ref());
    println!("Parameters:");
    println!();
    println!(
        "  {:12}  {:20}  {:10}  {}",
        "Key", "Name", "Default", "Range"
    );
    println!(
        "  {:12}  {:20}  {:10}  {}",
        "---", "----", "-------", "-----"
    );
    for (param, default, range) in &rows {
        println!(
            "  {:12}  {:20}  {:10}  {}",
            param.short_name, param.name, default, range
        );
    }

    let example: Vec<String> = rows
        .iter()
        .take(2)
        .map(|(param, default, _)| format!("{}={}", param.short_name, default))
        .collect();
    println!();
    println!("Example usage:");
    println!();
    if example.is_empty() {
        println!("  kinetone process input.wav output.wav --effect {}", desc.id);
    } else {
        println!(
            "  kinetone process input.wav output.wav --effect {} --param {}",
            desc.id,
            example.join(" --param ")
        );
        println!(
            "  kinetone process input.wav output.wav --chain \"{}:{}\"",
            desc.id,
            example.join(",")
        );
    }

    Ok(())
}
