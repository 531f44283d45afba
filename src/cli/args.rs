//! CLI argument definitions.

use crate::cli::validators::parse_confidence;
use crate::config::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Species tagging for audio, image and video files.
#[derive(Debug, Parser)]
#[command(name = "birdtag")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Input files or directories to analyze (object keys with --bucket).
    pub inputs: Vec<PathBuf>,

    /// Common options for analysis.
    #[command(flatten)]
    pub analyze: AnalyzeArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Inspect configured models.
    Models {
        /// Models action to perform.
        #[command(subcommand)]
        action: ModelsAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Models subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ModelsAction {
    /// List configured models.
    List,
    /// Verify model and labels files exist.
    Check,
}

/// Arguments for analysis.
#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct AnalyzeArgs {
    /// Confidence threshold for image and video detections (0.0-1.0).
    #[arg(short = 'c', long, value_parser = parse_confidence, env = "BIRDTAG_CONFIDENCE")]
    pub confidence: Option<f32>,

    /// Output formats (comma-separated: json,csv).
    #[arg(short, long, value_delimiter = ',', env = "BIRDTAG_FORMAT")]
    pub format: Option<Vec<OutputFormat>>,

    /// Output directory (default: same as input).
    #[arg(short, long, env = "BIRDTAG_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Treat inputs as object keys in this bucket and download them.
    #[arg(long, env = "BIRDTAG_BUCKET")]
    pub bucket: Option<String>,

    /// Write annotated copies of images and videos.
    #[arg(long)]
    pub annotate: bool,

    /// Print storage records as JSON lines on stdout instead of writing files.
    #[arg(long, conflicts_with = "format")]
    pub stdout: bool,

    /// Omit the UTF-8 BOM from CSV files.
    #[arg(long)]
    pub no_csv_bom: bool,

    /// Stop on first error.
    #[arg(long)]
    pub fail_fast: bool,

    /// Disable progress bars.
    #[arg(long)]
    pub no_progress: bool,

    /// Suppress progress output and informational logs.
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
