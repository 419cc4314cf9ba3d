//! The day-keyed archive document.
//!
//! [`AppState`] is the root of everything persisted: the full set of daily
//! canvases plus the last-known "today". All mutation happens by value here;
//! durability is the storage adapter's job.

use serde::{Deserialize, Serialize};

use crate::Block;

/// Current version of the persisted document schema.
///
/// Documents written before versioning existed carry no field and read as
/// version 1; the shape is otherwise identical.
pub const SCHEMA_VERSION: u32 = 1;

fn schema_version_default() -> u32 {
    1
}

/// One calendar day's block collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    /// Same value as `date`; kept for document compatibility.
    pub id: String,
    /// ISO `YYYY-MM-DD` day key, the true identity of the canvas. At most
    /// one canvas per distinct date exists in the archive.
    pub date: String,
    /// Blocks in display order; new blocks prepend.
    pub blocks: Vec<Block>,
}

impl Canvas {
    /// An empty canvas for the given day.
    pub fn empty(date: impl Into<String>) -> Self {
        let date = date.into();
        Canvas {
            id: date.clone(),
            date,
            blocks: Vec::new(),
        }
    }
}

/// Root persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default = "schema_version_default")]
    pub schema_version: u32,
    /// Day key of the last-known "today".
    pub current_canvas_id: String,
    /// All canvases, unordered with respect to date; sorting is a view
    /// concern. New canvases are prepended.
    pub archive: Vec<Canvas>,
}

impl AppState {
    /// First-run state: a single empty canvas dated `today`.
    pub fn first_run(today: &str) -> Self {
        AppState {
            schema_version: SCHEMA_VERSION,
            current_canvas_id: today.to_string(),
            archive: vec![Canvas::empty(today)],
        }
    }

    /// Applies the day-rollover rule.
    ///
    /// When the stored `current_canvas_id` no longer matches the real
    /// current date, an empty canvas for today is inserted (unless one
    /// already exists) and the current id advances. Other canvases are never
    /// touched. Returns whether anything changed.
    pub fn rollover(&mut self, today: &str) -> bool {
        if self.current_canvas_id == today {
            return false;
        }
        if self.canvas_for(today).is_none() {
            self.archive.insert(0, Canvas::empty(today));
        }
        self.current_canvas_id = today.to_string();
        true
    }

    /// The canvas for `date`, if one exists.
    pub fn canvas_for(&self, date: &str) -> Option<&Canvas> {
        self.archive.iter().find(|c| c.date == date)
    }

    /// Replaces the block list of the canvas for `date`, or inserts a new
    /// canvas at the front of the archive when none exists yet.
    pub fn upsert_canvas(&mut self, date: &str, blocks: Vec<Block>) {
        match self.archive.iter_mut().find(|c| c.date == date) {
            Some(canvas) => canvas.blocks = blocks,
            None => {
                let mut canvas = Canvas::empty(date);
                canvas.blocks = blocks;
                self.archive.insert(0, canvas);
            }
        }
    }

    /// Finds a block anywhere in the archive.
    pub fn find_block(&self, id: &str) -> Option<&Block> {
        self.all_blocks().find(|b| b.id == id)
    }

    /// Day key of the canvas owning the block with `id`, if any.
    pub fn owner_of(&self, id: &str) -> Option<&str> {
        self.archive
            .iter()
            .find(|c| c.blocks.iter().any(|b| b.id == id))
            .map(|c| c.date.as_str())
    }

    /// Every block in the archive, in archive order.
    pub fn all_blocks(&self) -> impl Iterator<Item = &Block> {
        self.archive.iter().flat_map(|c| c.blocks.iter())
    }
}
