//! Parameter listing for one variant.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use crate::commands::common::parse_variant;
use clap::Args;
use digitalis_core::ParamDescriptor;
use digitalis_engine::{EngineConfig, VariantKind, param_descriptors};

#[derive(Args)]
pub struct ParamsArgs {
    /// Variant slug, number (1-10) or name
    #[arg(short, long, value_parser = parse_variant)]
    variant: VariantKind,
}

fn range(d: &ParamDescriptor) -> String {
    if d.is_choice() {
        d.labels.join(" | ")
    } else {
        format!("{}..{}{}", d.min, d.max, d.unit.suffix())
    }
}

fn default(d: &ParamDescriptor) -> String {
    match d.label(d.default) {
        Some(label) => label.to_string(),
        None => format!("{}{}", d.default, d.unit.suffix()),
    }
}

pub fn run(args: ParamsArgs) -> anyhow::Result<()> {
    let kind = args.variant;
    let layout = EngineConfig::for_variant(kind).layout;

    println!("{}", kind.name());
    println!("{}", "=".repeat(kind.name().len()));
    println!();
    println!(
        "  {:5}  {:16}  {:14}  {:12}  {}",
        "Id", "Name", "Control", "Default", "Range"
    );
    println!(
        "  {:5}  {:16}  {:14}  {:12}  {}",
        "--", "----", "-------", "-------", "-----"
    );
    for d in param_descriptors(kind) {
        let control = layout
            .slots()
            .find(|slot| slot.param == d.string_id)
            .map_or("", |slot| slot.label);
        println!(
            "  {:5}  {:16}  {:14}  {:12}  {}",
            d.id.0,
            d.string_id,
            control,
            default(&d),
            range(&d)
        );
    }
    println!();
    println!(
        "  digitalis process in.wav out.wav --variant {} --param mix=50",
        kind.slug()
    );
    Ok(())
}
