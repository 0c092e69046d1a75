//! Offline WAV processing through one variant.

use crate::commands::common::{build_engine, configure_params, parse_param, parse_variant, rms_db};
use crate::wav::{Audio, read_wav, write_wav};
use anyhow::Context;
use clap::Args;
use digitalis_config::EngineState;
use digitalis_engine::{ProcessSpec, VariantKind};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Args)]
pub struct ProcessArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Variant slug, number (1-10) or name
    #[arg(short, long, value_parser = parse_variant)]
    variant: VariantKind,

    /// Factory preset name or program index
    #[arg(short, long)]
    preset: Option<String>,

    /// Saved state file (JSON or TOML) to restore parameters from
    #[arg(long, conflicts_with = "preset")]
    state: Option<PathBuf>,

    /// Write the final parameter state to this file
    #[arg(long)]
    save_state: Option<PathBuf>,

    /// Parameter override (e.g. "mix=40"), may be repeated
    #[arg(long, value_parser = parse_param)]
    param: Vec<(String, f32)>,

    /// Processing block size
    #[arg(long, default_value = "512")]
    block_size: usize,

    /// Seed for the random stream (omit for a fresh seed each run)
    #[arg(long)]
    seed: Option<u32>,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,
}

pub fn run(args: ProcessArgs) -> anyhow::Result<()> {
    let kind = args.variant;

    println!("Reading {}...", args.input.display());
    let mut audio = read_wav(&args.input)?;
    println!(
        "  {} frames x {} channels, {} Hz, {:.2}s",
        audio.frames(),
        audio.channels.len(),
        audio.sample_rate,
        audio.duration_secs()
    );

    let mut engine = build_engine(kind, args.seed);
    let spec = ProcessSpec {
        sample_rate: audio.sample_rate as f32,
        max_block_size: args.block_size,
        channels: audio.channels.len(),
    };
    engine
        .prepare(spec)
        .with_context(|| format!("cannot prepare {}", kind.name()))?;

    let params = engine.create_param_store();
    let program = configure_params(
        kind,
        &params,
        args.preset.as_deref(),
        args.state.as_deref(),
        &args.param,
    )?;

    tracing::info!(
        variant = %kind.name(),
        sample_rate = audio.sample_rate,
        channels = audio.channels.len(),
        block_size = args.block_size,
        "processing"
    );

    let input_db = rms_db(audio.channels.iter().flatten());
    render(&mut engine, &params, &mut audio, args.block_size)?;
    let output_db = rms_db(audio.channels.iter().flatten());

    println!("\nStats:");
    println!("  Input:  RMS {input_db:.1} dB");
    println!("  Output: RMS {output_db:.1} dB");

    println!("\nWriting {}...", args.output.display());
    write_wav(&args.output, &audio, args.bit_depth)?;

    if let Some(path) = &args.save_state {
        EngineState::capture(kind, program.unwrap_or(0), &params)
            .save(path)
            .with_context(|| format!("failed to save state {}", path.display()))?;
        println!("Saved state to {}", path.display());
    }

    println!("Done!");
    Ok(())
}

/// Process `audio` in place with a progress bar.
fn render(
    engine: &mut digitalis_engine::Engine,
    params: &digitalis_core::ParamStore,
    audio: &mut Audio,
    block_size: usize,
) -> anyhow::Result<()> {
    let frames = audio.frames();
    let pb = ProgressBar::new(frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let block_size = block_size.max(1);
    let mut start = 0;
    while start < frames {
        let end = (start + block_size).min(frames);
        let mut slices: Vec<&mut [f32]> = audio
            .channels
            .iter_mut()
            .map(|ch| &mut ch[start..end])
            .collect();
        engine.process(&mut slices, params);
        start = end;
        pb.set_position(start as u64);
    }

    pb.finish_with_message("done");
    Ok(())
}
