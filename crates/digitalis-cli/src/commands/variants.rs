//! Variant listing.

use clap::Args;
use digitalis_core::linear_to_db;
use digitalis_engine::{VariantKind, subtitle};

#[derive(Args)]
pub struct VariantsArgs {
    /// Show slugs only, one per line
    #[arg(long)]
    slugs: bool,
}

pub fn run(args: VariantsArgs) -> anyhow::Result<()> {
    if args.slugs {
        for kind in VariantKind::ALL {
            println!("{}", kind.slug());
        }
        return Ok(());
    }

    println!("Available Variants");
    println!("==================");
    println!();
    for kind in VariantKind::ALL {
        println!(
            "  {:>2}  {:28} {:24} target {:.1} dB",
            kind.number(),
            kind.name(),
            kind.slug(),
            linear_to_db(kind.target_rms())
        );
        println!("      {}", subtitle(kind));
    }
    println!();
    println!("Use 'digitalis params --variant <slug>' for parameter details.");
    Ok(())
}
