//! Core block types for the canvasnotes application.
//!
//! A block is one discrete content unit on a day's canvas. The type-specific
//! payload lives in [`BlockKind`], a tagged variant, so that only checklist
//! blocks carry todos, only image-bearing blocks carry images, and so on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::generate_id;

/// A single checklist entry inside a checklist block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

impl TodoItem {
    /// Creates a new, uncompleted checklist entry.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            text: text.into(),
            completed: false,
        }
    }
}

/// The type-specific payload of a block, tagged on the wire by `type`.
///
/// Every payload field defaults to empty on deserialization; a missing field
/// and an empty one are equivalent everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockKind {
    /// Free-text note; may carry captured images alongside the text.
    Text {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        body: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        images: Vec<String>,
    },
    /// Checklist block.
    Todo {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        todos: Vec<TodoItem>,
    },
    /// Image block; `content` acts as the caption.
    Image {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        images: Vec<String>,
    },
    /// Voice memo; `body` holds a transcript or note about the recording.
    Voice {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        body: String,
    },
    /// Quote; the quote text is `content`, attribution goes in `body`.
    Quote {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        body: String,
    },
    /// Locked placeholder with no payload.
    Locked,
}

impl BlockKind {
    /// Builds a fresh payload for the given type name, or `None` when the
    /// name is not a block type. Checklist blocks start with one seed entry.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(BlockKind::Text {
                body: String::new(),
                images: Vec::new(),
            }),
            "todo" => Some(BlockKind::Todo {
                todos: vec![TodoItem::new("First task")],
            }),
            "image" => Some(BlockKind::Image { images: Vec::new() }),
            "voice" => Some(BlockKind::Voice { body: String::new() }),
            "quote" => Some(BlockKind::Quote { body: String::new() }),
            "locked" => Some(BlockKind::Locked),
            _ => None,
        }
    }

    /// The wire name of this block type.
    pub fn type_name(&self) -> &'static str {
        match self {
            BlockKind::Text { .. } => "text",
            BlockKind::Todo { .. } => "todo",
            BlockKind::Image { .. } => "image",
            BlockKind::Voice { .. } => "voice",
            BlockKind::Quote { .. } => "quote",
            BlockKind::Locked => "locked",
        }
    }

    /// Title used when a block is created without content.
    pub fn default_title(&self) -> &'static str {
        match self {
            BlockKind::Text { .. } => "Untitled",
            BlockKind::Todo { .. } => "Today's Checklist",
            BlockKind::Image { .. } => "",
            BlockKind::Voice { .. } => "Audio Memo",
            BlockKind::Quote { .. } => "Daily Wisdom",
            BlockKind::Locked => "Private",
        }
    }
}

fn default_width() -> u8 {
    1
}

/// One discrete content unit on a canvas.
///
/// Serialized camelCase with `createdAt` as epoch milliseconds, the shape of
/// the persisted archive document. Only `id`, `type`, `content`, and
/// `createdAt` are required on the wire; everything else defaults to empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Opaque unique identifier, stable for the block's lifetime.
    pub id: String,

    /// Type tag and type-specific payload.
    #[serde(flatten)]
    pub kind: BlockKind,

    /// Grid position carried by the document shape; never interpreted.
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,

    /// Layout span, 1 or 2 units.
    #[serde(default = "default_width")]
    pub width: u8,

    /// Explicit pixel height; `None` means auto-size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Title, caption, or sole content depending on the block type.
    pub content: String,

    /// Tags, stored as typed by the user; consumers compare
    /// case-insensitively, so duplicates across case are possible.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Display-only styling hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Creation timestamp, immutable.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Block {
    /// Creates a new block of the given kind. An empty `content` falls back
    /// to the kind's default title.
    pub fn new(kind: BlockKind, content: impl Into<String>) -> Self {
        let mut content = content.into();
        if content.is_empty() {
            content = kind.default_title().to_string();
        }

        // Stored timestamps are epoch milliseconds; keep the in-memory value
        // at the same precision so blocks compare equal across a save/load
        // cycle.
        let now = Utc::now();
        let created_at = DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);

        Block {
            id: generate_id(),
            kind,
            x: 0.0,
            y: 0.0,
            width: 1,
            height: None,
            content,
            tags: Vec::new(),
            color: None,
            created_at,
        }
    }

    /// Secondary free text; empty for kinds that have none.
    pub fn body(&self) -> &str {
        match &self.kind {
            BlockKind::Text { body, .. }
            | BlockKind::Voice { body }
            | BlockKind::Quote { body } => body,
            _ => "",
        }
    }

    /// Replaces the secondary text. Returns `false` for kinds that have no
    /// body field.
    pub fn set_body(&mut self, new_body: impl Into<String>) -> bool {
        match &mut self.kind {
            BlockKind::Text { body, .. }
            | BlockKind::Voice { body }
            | BlockKind::Quote { body } => {
                *body = new_body.into();
                true
            }
            _ => false,
        }
    }

    /// Attached image payloads in display order; empty for kinds without.
    pub fn images(&self) -> &[String] {
        match &self.kind {
            BlockKind::Text { images, .. } | BlockKind::Image { images } => images,
            _ => &[],
        }
    }

    /// Mutable image list, `None` for kinds that cannot carry images.
    pub fn images_mut(&mut self) -> Option<&mut Vec<String>> {
        match &mut self.kind {
            BlockKind::Text { images, .. } | BlockKind::Image { images } => Some(images),
            _ => None,
        }
    }

    /// Checklist entries in order; empty for non-checklist kinds.
    pub fn todos(&self) -> &[TodoItem] {
        match &self.kind {
            BlockKind::Todo { todos } => todos,
            _ => &[],
        }
    }

    /// Mutable checklist, `None` for non-checklist kinds.
    pub fn todos_mut(&mut self) -> Option<&mut Vec<TodoItem>> {
        match &mut self.kind {
            BlockKind::Todo { todos } => Some(todos),
            _ => None,
        }
    }

    /// Case-insensitive substring match over `content` and `body`. An empty
    /// query matches every block.
    pub fn matches_query(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let needle = query.to_lowercase();
        self.content.to_lowercase().contains(&needle)
            || self.body().to_lowercase().contains(&needle)
    }

    /// Case-insensitive tag membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        let needle = tag.trim().to_lowercase();
        self.tags.iter().any(|t| t.trim().to_lowercase() == needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_falls_back_to_default_title() {
        let block = Block::new(BlockKind::from_type_name("quote").unwrap(), "");
        assert_eq!(block.content, "Daily Wisdom");

        let block = Block::new(BlockKind::from_type_name("text").unwrap(), "Groceries");
        assert_eq!(block.content, "Groceries");
    }

    #[test]
    fn new_checklist_is_seeded() {
        let block = Block::new(BlockKind::from_type_name("todo").unwrap(), "");
        assert_eq!(block.content, "Today's Checklist");
        assert_eq!(block.todos().len(), 1);
        assert!(!block.todos()[0].completed);
    }

    #[test]
    fn query_match_is_case_insensitive_over_content_and_body() {
        let mut block = Block::new(BlockKind::from_type_name("text").unwrap(), "Morning Pages");
        assert!(block.set_body("wrote about the GARDEN"));

        assert!(block.matches_query(""));
        assert!(block.matches_query("morning"));
        assert!(block.matches_query("garden"));
        assert!(!block.matches_query("harvest"));
    }

    #[test]
    fn locked_blocks_have_no_body_or_payload() {
        let mut block = Block::new(BlockKind::Locked, "");
        assert_eq!(block.content, "Private");
        assert_eq!(block.body(), "");
        assert!(!block.set_body("nope"));
        assert!(block.images_mut().is_none());
        assert!(block.todos_mut().is_none());
    }

    #[test]
    fn tag_membership_ignores_case() {
        let mut block = Block::new(BlockKind::from_type_name("text").unwrap(), "x");
        block.tags = vec!["Love".to_string()];
        assert!(block.has_tag("LOVE"));
        assert!(block.has_tag("love"));
        assert!(!block.has_tag("loves"));
    }

    #[test]
    fn wire_shape_is_tagged_and_camel_case() {
        let mut block = Block::new(BlockKind::from_type_name("todo").unwrap(), "Chores");
        block.tags = vec!["home".to_string()];

        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "todo");
        assert_eq!(value["content"], "Chores");
        assert!(value["createdAt"].is_i64() || value["createdAt"].is_u64());
        assert!(value["todos"].is_array());
        // Absent optionals stay off the wire entirely.
        assert!(value.get("height").is_none());
        assert!(value.get("color").is_none());
    }

    #[test]
    fn minimal_document_block_deserializes_with_defaults() {
        let json = r#"{"id":"abc","type":"text","content":"hi","createdAt":1700000000000}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.id, "abc");
        assert_eq!(block.width, 1);
        assert_eq!(block.height, None);
        assert!(block.tags.is_empty());
        assert_eq!(block.body(), "");
        assert!(block.images().is_empty());
    }

    #[test]
    fn locked_round_trips() {
        let block = Block::new(BlockKind::Locked, "");
        let json = serde_json::to_string(&block).unwrap();
        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(back, block);
    }
}
