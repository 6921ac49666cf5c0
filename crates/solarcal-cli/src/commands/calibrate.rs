use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Args;
use solarcal_core::error::CalibrationError;
use solarcal_core::io::{OutputDirectory, RawDirectory};
use solarcal_core::pipeline::{generate_master_dark, generate_master_flat, write_shift_profile};
use tracing::debug;

use crate::progress::BarReporter;
use crate::summary::{print_master_summary, print_run_header};

#[derive(Args)]
pub struct CalibrateArgs {
    /// Directory searched (recursively) for raw exposures
    pub raw_directory: Option<PathBuf>,

    /// Directory the master frames are written to (created if missing)
    pub output_directory: Option<PathBuf>,

    /// Calibration config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Reuse the existing dark master instead of rebuilding it
    #[arg(long)]
    pub flat_only: bool,

    /// Write the per-row shift profile of the flat master to this file
    #[arg(long)]
    pub shift_profile: Option<PathBuf>,
}

pub fn run(args: &CalibrateArgs) -> Result<()> {
    let (Some(raw_dir), Some(out_dir)) = (&args.raw_directory, &args.output_directory) else {
        println!("Usage: solarcal <path_to_raw_directory> <path_to_write_directory>");
        println!("Example:\nsolarcal . ./Level1");
        process::exit(1);
    };

    let config = super::load_config(args.config.as_deref())?;
    debug!(?config, "Calibration config loaded");
    let raw = RawDirectory::open(raw_dir)?;
    let out = OutputDirectory::ensure(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    print_run_header(raw.path(), out.path(), &config);
    let reporter = BarReporter::new();

    if !args.flat_only {
        let dark = generate_master_dark(&raw, &out, &config, &reporter)
            .context("Failed to build master dark")?;
        print_master_summary("Master Dark", &dark);
    }

    let flat = match generate_master_flat(&raw, &out, &config, &reporter) {
        Ok(report) => report,
        Err(CalibrationError::MissingDarkMaster(path)) => {
            println!("Master Dark not found at path: {}", absolute_display(&path));
            println!("Please Create Master Dark First");
            process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to build master flat"),
    };
    print_master_summary("Master Flat", &flat);

    if let (Some(path), Some(registration)) = (&args.shift_profile, &flat.registration) {
        write_shift_profile(path, registration)
            .with_context(|| format!("Failed to write shift profile {}", path.display()))?;
        println!("Shift profile saved to {}", path.display());
    }

    Ok(())
}

fn absolute_display(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
