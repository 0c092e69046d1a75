//! The level measurement scenario.
//!
//! Runs the stereo stimulus through each selected variant at its Init
//! preset and reports input level, output level and their difference.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use crate::commands::common::{build_engine, configure_params, parse_variant};
use anyhow::Context;
use clap::Args;
use digitalis_core::linear_to_db;
use digitalis_engine::{MeasureReport, ProcessSpec, VariantKind, measure};

#[derive(Args)]
pub struct MeasureArgs {
    /// Variant slug, number (1-10) or name
    #[arg(short, long, value_parser = parse_variant, conflicts_with = "all")]
    variant: Option<VariantKind>,

    /// Measure every variant (the default when no variant is given)
    #[arg(long)]
    all: bool,

    /// Stimulus length in seconds
    #[arg(long, default_value = "10")]
    seconds: f32,

    /// Host block size
    #[arg(long, default_value = "256")]
    block_size: usize,

    /// Sample rate in Hz
    #[arg(long, default_value = "48000")]
    sample_rate: f32,

    /// Factory preset name or program index
    #[arg(short, long, default_value = "Init", conflicts_with = "defaults")]
    preset: String,

    /// Use descriptor defaults instead of a factory preset
    #[arg(long)]
    defaults: bool,

    /// Seed for the random stream
    #[arg(long, default_value = "1")]
    seed: u32,
}

pub fn run(args: MeasureArgs) -> anyhow::Result<()> {
    let kinds: Vec<VariantKind> = match args.variant {
        Some(kind) if !args.all => vec![kind],
        _ => VariantKind::ALL.to_vec(),
    };
    let preset = (!args.defaults).then_some(args.preset.as_str());

    println!(
        "{:32}  {:>12}  {:>12}  {:>9}  {:>9}",
        "Variant", "InputRMS_dB", "OutputRMS_dB", "Delta_dB", "Target_dB"
    );

    let mut failures = Vec::new();
    for kind in kinds {
        let report = measure_one(kind, &args, preset)?;
        println!(
            "{:32}  {:>12.2}  {:>12.2}  {:>9.2}  {:>9.2}",
            kind.name(),
            report.input_rms_db,
            report.output_rms_db,
            report.delta_db,
            linear_to_db(kind.target_rms())
        );
        tracing::debug!(variant = %kind.name(), peak = report.peak, "measured");
        if !report.finite || report.peak > 1.0 {
            failures.push(kind.name());
        }
    }

    if !failures.is_empty() {
        anyhow::bail!("out-of-range output from: {}", failures.join(", "));
    }
    Ok(())
}

fn measure_one(
    kind: VariantKind,
    args: &MeasureArgs,
    preset: Option<&str>,
) -> anyhow::Result<MeasureReport> {
    let mut engine = build_engine(kind, Some(args.seed));
    engine
        .prepare(ProcessSpec::stereo(args.sample_rate, args.block_size))
        .with_context(|| format!("cannot prepare {}", kind.name()))?;
    let params = engine.create_param_store();
    configure_params(kind, &params, preset, None, &[])?;
    Ok(measure(&mut engine, &params, args.seconds, args.block_size))
}
