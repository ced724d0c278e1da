mod args;

use admit_card::intake::{self, TrustUploads};
use admit_card::LayoutEngine;
use anyhow::{Context, Result};
use args::Args;
use clap::Parser;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let engine = LayoutEngine::discover(args.font.as_deref())?;
    if let Some(path) = engine.typeface().path() {
        log::info!("Rendering with font {}", path.display());
    }

    println!("Loading photo: {}", args.photo.display());
    let photo = std::fs::read(&args.photo)
        .with_context(|| format!("Failed to read {}", args.photo.display()))?;

    println!("Loading signature: {}", args.signature.display());
    let signature = std::fs::read(&args.signature)
        .with_context(|| format!("Failed to read {}", args.signature.display()))?;

    let card = intake::generate(&engine, &TrustUploads, &args.record(), &photo, &signature)?;

    std::fs::write(&args.output, card.to_png()?)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!("Saved to: {}", args.output.display());
    Ok(())
}
