use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "videoscheme")]
#[command(author, version, about = "Preview frames and container conversion on top of ffmpeg")]
pub struct Cli {
    /// Path to config file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract a preview frame and print its file URL
    Screenshot {
        /// file://, http(s):// URL or local path of the video
        input: String,

        #[command(flatten)]
        job: JobArgs,
    },

    /// Convert a video into the configured container and print its file URL
    Convert {
        /// file://, http(s):// URL or local path of the video
        input: String,

        #[command(flatten)]
        job: JobArgs,

        /// Always re-encode, skipping the codec probe
        #[arg(long)]
        enforce_slow: bool,
    },

    /// Print the video codec of an input
    Codec {
        /// file://, http(s):// URL or local path of the video
        input: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the ffmpeg binary is available
    Check,
}

/// Options shared by every job.
#[derive(Args)]
pub struct JobArgs {
    /// Directory for the output file
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Scheduling priority, 0 (lowest) to 100 (highest)
    #[arg(long)]
    pub priority: Option<f64>,
}
