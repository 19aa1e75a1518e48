//! Interframe CLI: drive the interpolation engine on synthetic footage.
//!
//! Usage:
//!   interframe synth [OPTIONS]    Interpolate one synthetic frame pair
//!   interframe batch [OPTIONS]    Run many interpolation jobs concurrently
//!   interframe config             Print the effective configuration

use clap::{Parser, Subcommand, ValueEnum};

use interframe_common::config::AppConfig;
use interframe_processing_core::InterpolationMode;

mod commands;
mod pattern;

#[derive(Parser)]
#[command(
    name = "interframe",
    about = "Motion-compensated frame interpolation",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Blend,
    Shift,
}

impl From<ModeArg> for InterpolationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Blend => InterpolationMode::Blend,
            ModeArg::Shift => InterpolationMode::ShiftOnly,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Interpolate between two synthetic frames and report the result
    Synth {
        /// Frame width
        #[arg(long, default_value = "640")]
        width: u32,

        /// Frame height
        #[arg(long, default_value = "360")]
        height: u32,

        /// Horizontal displacement of the second frame (pixels)
        #[arg(long, default_value = "6.0", allow_hyphen_values = true)]
        dx: f64,

        /// Vertical displacement of the second frame (pixels)
        #[arg(long, default_value = "2.0", allow_hyphen_values = true)]
        dy: f64,

        /// Fraction of the way from the first frame to the second
        #[arg(long, default_value = "0.5")]
        pct: f64,

        /// Which outputs to synthesize
        #[arg(long, value_enum, default_value = "blend")]
        mode: ModeArg,

        /// Sharpen the outputs with this unsharp-mask strength
        #[arg(long)]
        sharpen: Option<f32>,
    },

    /// Run interpolation jobs at evenly spaced fractions through one shared cache
    Batch {
        /// Number of jobs
        #[arg(short, long, default_value = "8")]
        jobs: usize,

        /// Frame width
        #[arg(long, default_value = "640")]
        width: u32,

        /// Frame height
        #[arg(long, default_value = "360")]
        height: u32,

        /// Horizontal displacement of the second frame (pixels)
        #[arg(long, default_value = "6.0", allow_hyphen_values = true)]
        dx: f64,

        /// Vertical displacement of the second frame (pixels)
        #[arg(long, default_value = "2.0", allow_hyphen_values = true)]
        dy: f64,

        /// Which outputs to synthesize
        #[arg(long, value_enum, default_value = "blend")]
        mode: ModeArg,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    interframe_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Synth {
            width,
            height,
            dx,
            dy,
            pct,
            mode,
            sharpen,
        } => commands::synth::run(
            &config,
            commands::synth::SynthArgs {
                width,
                height,
                dx,
                dy,
                pct,
                mode: mode.into(),
                sharpen,
            },
        ),
        Commands::Batch {
            jobs,
            width,
            height,
            dx,
            dy,
            mode,
        } => commands::batch::run(&config, jobs, width, height, (dx, dy), mode.into()).await,
        Commands::Config => commands::config::run(&config),
    }
}
