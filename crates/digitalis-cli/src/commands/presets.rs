//! Factory preset listing and export.

use crate::commands::common::parse_variant;
use anyhow::Context;
use clap::Args;
use digitalis_config::factory_bank;
use digitalis_engine::VariantKind;
use std::path::PathBuf;

#[derive(Args)]
pub struct PresetsArgs {
    /// Variant slug, number (1-10) or name
    #[arg(short, long, value_parser = parse_variant)]
    variant: VariantKind,

    /// Write the bank as TOML to this file
    #[arg(long)]
    export: Option<PathBuf>,
}

pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    let kind = args.variant;
    let bank = factory_bank(kind).context("factory bank is malformed")?;

    println!("{} presets", kind.name());
    println!();
    for (index, preset) in bank.iter().enumerate() {
        match &preset.description {
            Some(description) => println!("  {index:>2}  {:28} {description}", preset.name),
            None => println!("  {index:>2}  {}", preset.name),
        }
    }

    if let Some(path) = &args.export {
        bank.save(path)
            .with_context(|| format!("failed to export {}", path.display()))?;
        println!();
        println!("Exported {} presets to {}", bank.len(), path.display());
    }
    Ok(())
}
