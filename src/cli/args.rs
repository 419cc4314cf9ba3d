use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Main CLI application arguments and command structure
#[derive(Parser)]
#[clap(
    version,
    about = "Day-canvas note-taking application",
    long_about = "Notes as typed blocks on daily canvases, with tag collections for cross-day retrieval"
)]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Override the directory holding the archive document
    #[clap(long, value_parser)]
    pub data_dir: Option<PathBuf>,

    /// Override the backup directory
    #[clap(long, value_parser)]
    pub backup_dir: Option<PathBuf>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the canvasnotes application
    #[clap(subcommand)]
    pub command: Commands,
}
