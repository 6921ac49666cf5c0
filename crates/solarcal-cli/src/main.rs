mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "solarcal",
    about = "Build master dark and flat calibration frames for solar spectrograph data"
)]
#[command(version, args_conflicts_with_subcommands = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    calibrate: commands::calibrate::CalibrateArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Transcode raw exposures into FITS frames tagged with their creation time
    Convert(commands::convert::ConvertArgs),
    /// Print or save the default calibration config as TOML
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Some(Commands::Convert(args)) => commands::convert::run(args),
        Some(Commands::Config(args)) => commands::config::run(args),
        None => commands::calibrate::run(&cli.calibrate),
    }
}
