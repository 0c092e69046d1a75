//! Digitalis CLI - offline rendering and measurement for the degradation engine.

mod commands;
mod wav;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "digitalis")]
#[command(author, version, about = "Digitalis degradation engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a WAV file through one variant
    Process(commands::process::ProcessArgs),

    /// Run the measurement stimulus through one or all variants
    Measure(commands::measure::MeasureArgs),

    /// List the ten variants
    Variants(commands::variants::VariantsArgs),

    /// List the parameters of a variant
    Params(commands::params::ParamsArgs),

    /// List or export the factory presets of a variant
    Presets(commands::presets::PresetsArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process(args) => commands::process::run(args),
        Commands::Measure(args) => commands::measure::run(args),
        Commands::Variants(args) => commands::variants::run(args),
        Commands::Params(args) => commands::params::run(args),
        Commands::Presets(args) => commands::presets::run(args),
    }
}
