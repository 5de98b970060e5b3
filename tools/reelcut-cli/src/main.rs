//! Reelcut CLI: assemble a timeline from the command line, then preview or export it.
//!
//! Usage:
//!   reelcut export --clip PATH ... -o OUT    Export a timeline to video
//!   reelcut preview --clip PATH ... --at T   Render one preview frame to PNG
//!   reelcut probe <PATH>                     Show source duration and tracks
//!   reelcut check                            Check ffmpeg and export formats
//!   reelcut config [--write]                 Show or write the configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use reelcut_common::config::AppConfig;

mod commands;

use commands::timeline_args::TimelineArgs;

#[derive(Parser)]
#[command(
    name = "reelcut",
    about = "Timeline compositor: trim, layer, annotate, and export video",
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

#[derive(Subcommand)]
enum Commands {
    /// Export a timeline to video
    Export {
        #[command(flatten)]
        timeline: TimelineArgs,

        /// Output file path (extension follows the selected container)
        #[arg(short, long)]
        output: PathBuf,

        /// Output width
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Output height
        #[arg(long, default_value = "1080")]
        height: u32,

        /// Output frame rate (defaults to the configured export fps)
        #[arg(long)]
        fps: Option<u32>,

        /// Audio headroom policy: none|hard-clip|peak-normalize
        #[arg(long)]
        headroom: Option<String>,

        /// Export only the first clip's trimmed range
        #[arg(long)]
        trimmed: bool,
    },

    /// Render a single preview frame to an image file
    Preview {
        #[command(flatten)]
        timeline: TimelineArgs,

        /// Timeline time to render (seconds)
        #[arg(long, default_value = "0.0")]
        at: f64,

        /// Output image path
        #[arg(short, long, default_value = "frame.png")]
        output: PathBuf,

        /// Preview width (defaults to the configured preview size)
        #[arg(long)]
        width: Option<u32>,

        /// Preview height (defaults to the configured preview size)
        #[arg(long)]
        height: Option<u32>,
    },

    /// Show duration and tracks of a media file
    Probe {
        /// Path to the media file
        path: PathBuf,

        /// Print the probe result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check ffmpeg availability and the export format that would be used
    Check,

    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    reelcut_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Export {
            timeline,
            output,
            width,
            height,
            fps,
            headroom,
            trimmed,
        } => {
            commands::export::run(
                timeline, output, width, height, fps, headroom, trimmed, &config,
            )
            .await
        }
        Commands::Preview {
            timeline,
            at,
            output,
            width,
            height,
        } => commands::preview::run(timeline, at, output, width, height, &config).await,
        Commands::Probe { path, json } => commands::probe::run(path, json, &config).await,
        Commands::Check => commands::check::run(&config).await,
        Commands::Config { write } => commands::config::run(write, &config),
    }
}
