//! Persistence adapter for the day-canvas archive.
//!
//! The entire application state is one JSON document. Every write serializes
//! and atomically replaces the whole file; there are no partial updates. The
//! adapter assumes a single writer, so `update_canvas` simply re-reads the
//! document before writing and the last writer wins.

use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
    time::SystemTime,
};

use chrono::Utc;
use log::{debug, error, info, warn};
use tempfile::NamedTempFile;
use walkdir::WalkDir;
use zip::{write::FileOptions, ZipArchive, ZipWriter};

use crate::{
    parse_date_key, today_string, AppState, Block, CnError, Config, RestoreSummary, Result,
    SCHEMA_VERSION,
};

/// File name of the archive document inside the data directory.
const STATE_FILE: &str = "canvases.json";
/// Entry name of the document inside a full-backup archive.
const BACKUP_ENTRY: &str = "canvases.json";
/// Prefix of full-backup archives, used by retention pruning.
const BACKUP_PREFIX: &str = "canvasnotes_backup_";

/// Reads and writes the single persisted [`AppState`] document.
pub struct CanvasStorage {
    /// Application configuration
    config: Config,
}

impl CanvasStorage {
    /// Creates the storage adapter, ensuring the data directory exists.
    pub fn new(config: Config) -> Result<Self> {
        if !config.data_dir.exists() {
            debug!(
                "Data directory does not exist, creating: {}",
                config.data_dir.display()
            );
            fs::create_dir_all(&config.data_dir).map_err(|e| {
                error!("Failed to create data directory: {}", e);
                CnError::DirectoryError {
                    path: config.data_dir.clone(),
                }
            })?;
        }

        Ok(Self { config })
    }

    /// Path of the archive document.
    pub fn state_path(&self) -> PathBuf {
        self.config.data_dir.join(STATE_FILE)
    }

    /// Loads the archive document with day rollover applied.
    ///
    /// Never fails: a missing file, unreadable JSON, and a document written
    /// by a newer schema are all treated as a first run, yielding a fresh
    /// state with one empty canvas dated today. The rolled-over state only
    /// reaches disk with the next save.
    pub fn load(&self) -> AppState {
        let today = today_string();
        let path = self.state_path();

        let mut state = match self.read_state(&path) {
            Ok(Some(state)) => state,
            Ok(None) => {
                info!("No archive document at {}, starting fresh", path.display());
                return AppState::first_run(&today);
            }
            Err(e) => {
                warn!(
                    "Unreadable archive document at {}: {}. Starting fresh",
                    path.display(),
                    e
                );
                return AppState::first_run(&today);
            }
        };

        if state.rollover(&today) {
            info!("Rolled archive over to {}", today);
        }
        state
    }

    /// Reads and validates the stored document; `None` when no file exists.
    fn read_state(&self, path: &Path) -> Result<Option<AppState>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        let state: AppState = serde_json::from_str(&content)?;

        if state.schema_version > SCHEMA_VERSION {
            return Err(CnError::InvalidFormat {
                message: format!(
                    "Document schema version {} is newer than supported version {}",
                    state.schema_version, SCHEMA_VERSION
                ),
            });
        }

        Ok(Some(state))
    }

    /// Serializes the whole document and atomically replaces the stored copy.
    pub fn save(&self, state: &AppState) -> Result<()> {
        let path = self.state_path();
        debug!("Saving archive document to {}", path.display());

        if self.config.auto_backup && path.exists() {
            if let Err(e) = self.snapshot_current(&path) {
                warn!("Failed to snapshot document before overwrite: {}", e);
            }
        }

        let json = serde_json::to_string_pretty(state).map_err(|e| {
            error!("Failed to serialize archive document: {}", e);
            CnError::Serialization(e)
        })?;

        // Write to a temporary file in the same directory, then move it into
        // place, so a crash mid-write cannot leave a truncated document.
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            CnError::Io(e)
        })?;

        temp_file.write_all(json.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            CnError::Io(e)
        })?;
        temp_file.flush().map_err(|e| {
            error!("Failed to flush temporary file: {}", e);
            CnError::Io(e)
        })?;

        temp_file.persist(&path).map_err(|e| {
            error!("Failed to persist file {}: {}", path.display(), e.error);
            CnError::Io(e.error)
        })?;

        info!("Archive document saved ({} canvases)", state.archive.len());
        Ok(())
    }

    /// Copies the current document into the backup directory, timestamped.
    fn snapshot_current(&self, path: &Path) -> Result<()> {
        self.ensure_backup_dir()?;
        let snapshot_path = self
            .config
            .backup_dir
            .join(format!("canvases_{}.json", Utc::now().timestamp()));
        fs::copy(path, &snapshot_path)?;
        debug!("Snapshot written to {}", snapshot_path.display());
        Ok(())
    }

    /// Replaces (or inserts) the canvas for `date` and persists the result.
    ///
    /// This is the sole write path for block-collection changes. The
    /// document is re-read before writing, so overlapping writers would lose
    /// updates; acceptable under the single-writer assumption.
    pub fn update_canvas(&self, date: &str, blocks: Vec<Block>) -> Result<AppState> {
        parse_date_key(date)?;
        info!("Updating canvas {} ({} blocks)", date, blocks.len());

        let mut state = self.load();
        state.upsert_canvas(date, blocks);
        self.save(&state)?;
        Ok(state)
    }

    /// Replaces a block wherever it lives in the archive.
    ///
    /// The caller supplies the full updated block value, built by copying
    /// the stored block and overriding changed fields; field-level patches
    /// are not part of the contract. When no canvas owns the block the
    /// mutation fails with [`CnError::BlockNotFound`].
    pub fn update_block(&self, updated: Block) -> Result<AppState> {
        let state = self.load();

        let canvas = match state
            .archive
            .iter()
            .find(|c| c.blocks.iter().any(|b| b.id == updated.id))
        {
            Some(canvas) => canvas,
            None => {
                warn!("Cannot update block {}: no canvas owns it", updated.id);
                return Err(CnError::BlockNotFound { id: updated.id });
            }
        };

        let date = canvas.date.clone();
        let blocks: Vec<Block> = canvas
            .blocks
            .iter()
            .map(|b| {
                if b.id == updated.id {
                    updated.clone()
                } else {
                    b.clone()
                }
            })
            .collect();

        self.update_canvas(&date, blocks)
    }

    /// Removes a block from its owning canvas.
    pub fn delete_block(&self, id: &str) -> Result<AppState> {
        let state = self.load();

        let canvas = match state
            .archive
            .iter()
            .find(|c| c.blocks.iter().any(|b| b.id == id))
        {
            Some(canvas) => canvas,
            None => {
                warn!("Cannot delete block {}: no canvas owns it", id);
                return Err(CnError::BlockNotFound { id: id.to_string() });
            }
        };

        let date = canvas.date.clone();
        let blocks: Vec<Block> = canvas
            .blocks
            .iter()
            .filter(|b| b.id != id)
            .cloned()
            .collect();

        info!("Deleting block {} from canvas {}", id, date);
        self.update_canvas(&date, blocks)
    }

    fn ensure_backup_dir(&self) -> Result<()> {
        if !self.config.backup_dir.exists() {
            debug!(
                "Creating backup directory: {}",
                self.config.backup_dir.display()
            );
            fs::create_dir_all(&self.config.backup_dir).map_err(|e| {
                error!("Failed to create backup directory: {}", e);
                CnError::DirectoryError {
                    path: self.config.backup_dir.clone(),
                }
            })?;
        }
        Ok(())
    }

    /// Creates a timestamped ZIP backup of the archive document.
    ///
    /// # Returns
    ///
    /// The path to the created backup file in case of success or an error
    pub fn create_full_backup(&self, output: Option<PathBuf>) -> Result<PathBuf> {
        self.ensure_backup_dir()?;

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let backup_path = output.unwrap_or_else(|| {
            self.config
                .backup_dir
                .join(format!("{}{}.zip", BACKUP_PREFIX, timestamp))
        });

        let state = self.load();
        let json = serde_json::to_string_pretty(&state)?;

        let file = File::create(&backup_path).map_err(|e| CnError::BackupFailed {
            message: e.to_string(),
        })?;
        let mut zip = ZipWriter::new(file);

        let options = FileOptions::<zip::write::ExtendedFileOptions>::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(0o644);
        zip.start_file(BACKUP_ENTRY, options)?;
        zip.write_all(json.as_bytes())
            .map_err(|e| CnError::BackupFailed {
                message: format!("Failed to write document to backup: {}", e),
            })?;
        zip.finish()?;

        self.cleanup_old_backups()?;

        info!(
            "Full backup created with {} canvases at {}",
            state.archive.len(),
            backup_path.display()
        );
        Ok(backup_path)
    }

    /// Removes old backup archives if the number of backups exceeds the
    /// configured limit. Uses a min-heap so only the newest `max_backups`
    /// files survive a single pass.
    fn cleanup_old_backups(&self) -> Result<()> {
        // If max_backups is 0, keep all backups
        if self.config.max_backups == 0 {
            return Ok(());
        }

        // Wrapper to order backup files by modification time
        #[derive(Debug, Eq)]
        struct BackupFile {
            path: PathBuf,
            modified_time: SystemTime,
        }

        impl PartialEq for BackupFile {
            fn eq(&self, other: &Self) -> bool {
                self.modified_time.eq(&other.modified_time)
            }
        }

        impl PartialOrd for BackupFile {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for BackupFile {
            fn cmp(&self, other: &Self) -> Ordering {
                self.modified_time.cmp(&other.modified_time)
            }
        }

        // Reverse turns this into a min-heap: the oldest file sits on top.
        let mut newest_backups: BinaryHeap<Reverse<BackupFile>> =
            BinaryHeap::with_capacity((self.config.max_backups + 1) as usize);
        let mut removed = 0usize;

        for entry in WalkDir::new(&self.config.backup_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
        {
            let path = entry.path();

            if !path.is_file()
                || !path.extension().is_some_and(|ext| ext == "zip")
                || !path
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with(BACKUP_PREFIX))
            {
                continue;
            }

            let modified_time = match entry.metadata().ok().and_then(|m| m.modified().ok()) {
                Some(time) => time,
                None => continue,
            };

            newest_backups.push(Reverse(BackupFile {
                path: path.to_path_buf(),
                modified_time,
            }));

            if newest_backups.len() > self.config.max_backups as usize {
                if let Some(Reverse(oldest)) = newest_backups.pop() {
                    match fs::remove_file(&oldest.path) {
                        Ok(_) => {
                            removed += 1;
                            debug!("Removed old backup: {}", oldest.path.display());
                        }
                        Err(e) => {
                            warn!(
                                "Failed to remove old backup {}: {}",
                                oldest.path.display(),
                                e
                            );
                        }
                    }
                }
            }
        }

        if removed > 0 {
            debug!(
                "Backup cleanup complete: kept {}, removed {}",
                newest_backups.len(),
                removed
            );
        }

        Ok(())
    }

    /// Restores the archive document from a full-backup ZIP, replacing the
    /// current document.
    ///
    /// # Arguments
    ///
    /// * `backup_path` - Path to the backup ZIP file to restore from
    ///
    /// # Returns
    ///
    /// A summary of the restoration in case of success or an error
    pub fn restore_full_backup(&self, backup_path: &Path) -> Result<RestoreSummary> {
        if !backup_path.exists() || !backup_path.is_file() {
            return Err(CnError::RestoreFailed {
                message: format!("Backup file not found: {}", backup_path.display()),
            });
        }

        if backup_path.extension().map_or(true, |ext| ext != "zip") {
            return Err(CnError::RestoreFailed {
                message: format!("Not a valid ZIP file: {}", backup_path.display()),
            });
        }

        let backup_file = File::open(backup_path).map_err(|e| CnError::RestoreFailed {
            message: format!("Failed to open backup file: {}", e),
        })?;
        let mut archive = ZipArchive::new(backup_file)?;

        let mut entry = archive
            .by_name(BACKUP_ENTRY)
            .map_err(|e| CnError::RestoreFailed {
                message: format!("Backup does not contain {}: {}", BACKUP_ENTRY, e),
            })?;
        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(|e| CnError::RestoreFailed {
                message: format!("Failed to read document from backup: {}", e),
            })?;

        let mut state: AppState = serde_json::from_str(&content)?;
        if state.schema_version > SCHEMA_VERSION {
            return Err(CnError::RestoreFailed {
                message: format!(
                    "Backup schema version {} is newer than supported version {}",
                    state.schema_version, SCHEMA_VERSION
                ),
            });
        }

        state.rollover(&today_string());
        self.save(&state)?;

        let summary = RestoreSummary {
            backup_file: backup_path.to_path_buf(),
            canvases: state.archive.len(),
            blocks: state.archive.iter().map(|c| c.blocks.len()).sum(),
        };

        info!(
            "Restored {} canvases ({} blocks) from {}",
            summary.canvases,
            summary.blocks,
            backup_path.display()
        );
        Ok(summary)
    }
}
