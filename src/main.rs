// SPDX-License-Identifier: GPL-3.0-only

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "lens-composite")]
#[command(about = "Lens-distortion-aware compositing of rendered layers over camera frames")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Config file (default: ~/.config/lens-composite/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a calibration record
    Inspect {
        /// Calibration file (default: configured calibration)
        calibration: Option<PathBuf>,
    },

    /// Print the projection setup as JSON
    Projection {
        /// Calibration file (default: configured calibration)
        calibration: Option<PathBuf>,

        #[command(flatten)]
        projection: ProjectionArgs,
    },

    /// Warp a rendered layer through the lens model and blend it over a frame
    Composite {
        /// Calibration file (default: configured calibration)
        calibration: Option<PathBuf>,

        /// Undistorted rendered layer (RGBA image)
        #[arg(short, long)]
        layer: PathBuf,

        /// Camera frame to blend over
        #[arg(short, long)]
        frame: Option<PathBuf>,

        /// Output file path (default: composite_TIMESTAMP.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        projection: ProjectionArgs,
    },
}

/// Overrides on top of the persisted config
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectionArgs {
    /// Pinhole frustum from intrinsics
    #[arg(long, conflicts_with_all = ["exact_cover", "provided"])]
    pub direct: bool,

    /// Distortion-aware frustum covering the whole frame
    #[arg(long, conflicts_with = "provided")]
    pub exact_cover: bool,

    /// The calibration's explicit 4x4 matrix
    #[arg(long)]
    pub provided: bool,

    /// Boundary samples per edge for exact cover
    #[arg(long)]
    pub samples: Option<usize>,

    /// Near clip plane
    #[arg(long)]
    pub near: Option<f64>,

    /// Far clip plane
    #[arg(long)]
    pub far: Option<f64>,

    /// Render target width
    #[arg(long, requires = "height")]
    pub width: Option<u32>,

    /// Render target height
    #[arg(long, requires = "width")]
    pub height: Option<u32>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=lens_composite=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = cli::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Inspect { calibration } => cli::inspect(&config, calibration),
        Commands::Projection {
            calibration,
            projection,
        } => cli::print_projection(&config, calibration, &projection),
        Commands::Composite {
            calibration,
            layer,
            frame,
            output,
            projection,
        } => cli::composite(&config, calibration, &layer, frame, output, &projection),
    }
}
