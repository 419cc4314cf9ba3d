//! Shared types for the canvasnotes application.
//!
//! This module contains the crate-wide `Result` alias, operation summaries,
//! and the CLI command structure.

use std::path::PathBuf;

use clap::Subcommand;

use crate::CnError;

/// A specialized Result type for canvasnotes operations.
pub type Result<T> = std::result::Result<T, CnError>;

/// Summary of a backup restoration operation
#[derive(Debug, Clone)]
pub struct RestoreSummary {
    /// Path to the backup file that was restored
    pub backup_file: PathBuf,
    /// Number of canvases in the restored document
    pub canvases: usize,
    /// Total number of blocks across those canvases
    pub blocks: usize,
}

/// Available subcommands for the canvasnotes application
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add a block to today's canvas
    Add {
        /// Type of block to create
        #[clap(short = 'b', long, value_parser = ["text", "todo", "image", "voice", "quote", "locked"], default_value = "text")]
        block_type: String,

        /// Title or primary text (falls back to the type's default title)
        #[clap(short = 'C', long)]
        content: Option<String>,

        /// Secondary free text (text, voice, and quote blocks)
        #[clap(short = 'B', long)]
        body: Option<String>,

        /// Tags to attach (comma-separated)
        #[clap(short, long)]
        tags: Option<String>,

        /// Path to an image file to inline into the block
        #[clap(short, long)]
        image: Option<PathBuf>,

        /// Layout span in canvas units
        #[clap(short, long, value_parser = clap::value_parser!(u8).range(1..=2))]
        width: Option<u8>,

        /// Display color hint
        #[clap(long)]
        color: Option<String>,

        /// Target date; anything but today is refused
        #[clap(short, long)]
        date: Option<String>,
    },

    /// List blocks for a day or a collection
    List {
        /// Day to list (default: today)
        #[clap(short, long)]
        date: Option<String>,

        /// List a cross-day collection (tag) instead of a single day
        #[clap(short = 'k', long)]
        collection: Option<String>,

        /// Filter by a case-insensitive substring of content or body
        #[clap(short, long)]
        query: Option<String>,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,

        /// Only show block IDs and titles
        #[clap(short, long)]
        brief: bool,
    },

    /// View a block by ID
    View {
        /// ID of the block to view
        id: String,

        /// Format output as raw JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Edit an existing block (full-value replacement)
    Edit {
        /// ID of the block to edit
        id: String,

        /// New title or primary text
        #[clap(short = 'C', long)]
        content: Option<String>,

        /// New secondary text
        #[clap(short = 'B', long)]
        body: Option<String>,

        /// New layout span
        #[clap(short, long, value_parser = clap::value_parser!(u8).range(1..=2))]
        width: Option<u8>,

        /// New explicit pixel height
        #[clap(long)]
        height: Option<u32>,

        /// Clear the explicit height and auto-size again
        #[clap(long)]
        auto_height: bool,

        /// New display color hint
        #[clap(long)]
        color: Option<String>,
    },

    /// Tag operations (add, remove, list)
    Tag {
        /// ID of the block to modify
        id: String,

        /// Tags to add (comma-separated)
        #[clap(short, long)]
        add: Option<String>,

        /// Tags to remove (comma-separated, exact match)
        #[clap(short, long)]
        remove: Option<String>,

        /// List all tags for the block
        #[clap(short, long)]
        list: bool,
    },

    /// Checklist operations on a checklist block
    Todo {
        /// ID of the checklist block
        id: String,

        /// Add an entry with the given text
        #[clap(short, long)]
        add: Option<String>,

        /// Toggle the entry with the given ID
        #[clap(short, long)]
        toggle: Option<String>,

        /// Remove the entry with the given ID
        #[clap(short, long)]
        remove: Option<String>,

        /// List all entries
        #[clap(short, long)]
        list: bool,
    },

    /// Image operations on a block
    Image {
        /// ID of the block
        id: String,

        /// Attach an image file, inlined into the document
        #[clap(short, long)]
        attach: Option<PathBuf>,

        /// Remove the image at the given position (0-based)
        #[clap(short, long)]
        remove: Option<usize>,

        /// List attached images
        #[clap(short, long)]
        list: bool,
    },

    /// Delete a block by ID
    Delete {
        /// ID of the block to delete
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// List collections (tags) with record counts
    Collections,

    /// Month overview: days with entries and goal progress
    Calendar {
        /// Month to show as YYYY-MM (default: current month)
        #[clap(short, long)]
        month: Option<String>,
    },

    /// List archived days, newest first
    History,

    /// Create a full backup of the archive
    Backup {
        /// Path for the backup file (default uses config setting)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Restore the archive from a backup
    Restore {
        /// Path to the backup file
        backup_file: PathBuf,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Configuration management
    Config {
        /// Show current configuration
        #[clap(short = 'S', long)]
        show: bool,

        /// Update a configuration setting (key=value)
        #[clap(short, long)]
        set: Option<String>,

        /// Reset configuration to defaults
        #[clap(short, long)]
        reset: bool,
    },
}
