use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use solarcal_core::io::{OutputDirectory, RawDirectory};
use solarcal_core::pipeline::convert_exposures;

use crate::progress::BarReporter;

#[derive(Args)]
pub struct ConvertArgs {
    /// Directory searched (recursively) for raw exposures
    pub raw_directory: PathBuf,

    /// Directory the FITS frames are written to (created if missing)
    pub output_directory: PathBuf,

    /// Calibration config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &ConvertArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let raw = RawDirectory::open(&args.raw_directory)?;
    let out = OutputDirectory::ensure(&args.output_directory)
        .with_context(|| format!("Failed to create {}", args.output_directory.display()))?;

    let report = convert_exposures(&raw, &out, &config, &BarReporter::new())?;

    println!(
        "Converted {} exposures into {}",
        report.written.len(),
        out.path().display()
    );
    for skipped in &report.skipped {
        println!("Invalid Image file: {}", skipped.display());
    }
    Ok(())
}
