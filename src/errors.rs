//! Error types for the canvasnotes application.
//!
//! This module defines custom error types that categorize different failures
//! that can occur while managing the day-canvas archive.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the canvasnotes application.
#[derive(Error, Debug)]
pub enum CnError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors related to zip operations.
    #[error("Zip error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    /// No canvas in the archive owns the block being mutated.
    #[error("Block not found: {id}")]
    BlockNotFound { id: String },

    /// A string that should be a `YYYY-MM-DD` day key is not one.
    #[error("Not a valid calendar date: {value}")]
    InvalidDate { value: String },

    /// A mutation targeted a canvas other than today's.
    #[error("Canvas for {date} is read-only; only today's canvas accepts new blocks")]
    ReadOnlyCanvas { date: String },

    /// Invalid document format or content.
    #[error("Invalid document format: {message}")]
    InvalidFormat { message: String },

    /// Errors related to backup operations.
    #[error("Backup failed: {message}")]
    BackupFailed { message: String },

    /// Error when attempting to restore from backup.
    #[error("Restore failed: {message}")]
    RestoreFailed { message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },
}
