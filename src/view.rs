//! Read-only projections over the archive.
//!
//! Everything here is recomputed from scratch on demand; there is no
//! incremental maintenance. The archive is small enough that linear scans
//! are the whole story.

use std::collections::BTreeMap;

use crate::{AppState, Block, Canvas};

/// Starter collection names surfaced even before any block uses them.
pub const DEFAULT_COLLECTIONS: [&str; 5] = ["love", "projects", "health", "ideas", "archive"];

/// The three resting view states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// The canvas for the real current date.
    Today,
    /// A canvas for some other date, presented read-only.
    Historical,
    /// A cross-archive tag collection.
    Collection,
}

/// View selection: the active date, the optional active collection, and the
/// search query composed over either projection.
///
/// Selecting a date clears the collection; selecting a collection keeps the
/// date remembered for when the collection is cleared again.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub active_date: String,
    pub active_collection: Option<String>,
    pub query: String,
}

impl ViewState {
    /// A fresh view resting on today's canvas.
    pub fn new(today: &str) -> Self {
        Self {
            active_date: today.to_string(),
            active_collection: None,
            query: String::new(),
        }
    }

    pub fn select_date(&mut self, date: &str) {
        self.active_date = date.to_string();
        self.active_collection = None;
    }

    pub fn select_collection(&mut self, tag: &str) {
        self.active_collection = Some(tag.to_string());
    }

    pub fn clear_collection(&mut self) {
        self.active_collection = None;
    }

    /// Which of the three states the view rests in.
    pub fn mode(&self, today: &str) -> ViewMode {
        if self.active_collection.is_some() {
            ViewMode::Collection
        } else if self.active_date == today {
            ViewMode::Today
        } else {
            ViewMode::Historical
        }
    }

    /// Any day other than the real current date is read-only. Enforcement is
    /// the caller's job; the data layer never checks.
    pub fn is_read_only(&self, today: &str) -> bool {
        self.active_date != today
    }

    /// The blocks this view presents.
    ///
    /// Base set: the active day's canvas (an absent canvas presents as
    /// empty), or every block in the archive carrying the active collection
    /// tag. The search filter composes on top; an empty query keeps
    /// everything.
    pub fn visible_blocks<'a>(&self, state: &'a AppState) -> Vec<&'a Block> {
        let base: Vec<&Block> = match &self.active_collection {
            Some(tag) => state.all_blocks().filter(|b| b.has_tag(tag)).collect(),
            None => state
                .canvas_for(&self.active_date)
                .map(|c| c.blocks.iter().collect())
                .unwrap_or_default(),
        };

        base.into_iter()
            .filter(|b| b.matches_query(&self.query))
            .collect()
    }
}

/// Cross-archive tag map: lowercased tag name to the blocks carrying it.
pub fn collections(state: &AppState) -> BTreeMap<String, Vec<&Block>> {
    let mut map: BTreeMap<String, Vec<&Block>> = BTreeMap::new();
    for block in state.all_blocks() {
        for tag in &block.tags {
            let key = tag.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            map.entry(key).or_default().push(block);
        }
    }
    map
}

/// Collection names for listing: every tag in use plus the starter folders,
/// deduplicated and sorted.
pub fn collection_names(state: &AppState) -> Vec<String> {
    let mut names: Vec<String> = DEFAULT_COLLECTIONS.iter().map(|s| s.to_string()).collect();
    for name in collections(state).keys() {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    names.sort();
    names
}

/// Day keys whose canvases contain at least one block.
pub fn dates_with_entries(state: &AppState) -> Vec<String> {
    state
        .archive
        .iter()
        .filter(|c| !c.blocks.is_empty())
        .map(|c| c.date.clone())
        .collect()
}

/// Number of days in the given month with at least one block.
pub fn month_entry_count(state: &AppState, year: i32, month: u32) -> usize {
    let prefix = format!("{:04}-{:02}", year, month);
    state
        .archive
        .iter()
        .filter(|c| c.date.starts_with(&prefix) && !c.blocks.is_empty())
        .count()
}

/// Canvases sorted date-descending, for the history listing.
pub fn history(state: &AppState) -> Vec<&Canvas> {
    let mut canvases: Vec<&Canvas> = state.archive.iter().collect();
    canvases.sort_by(|a, b| b.date.cmp(&a.date));
    canvases
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Block, BlockKind};

    fn tagged_block(content: &str, tags: &[&str]) -> Block {
        let mut block = Block::new(BlockKind::from_type_name("text").unwrap(), content);
        block.tags = tags.iter().map(|t| t.to_string()).collect();
        block
    }

    fn two_day_state() -> AppState {
        let mut state = AppState::first_run("2024-01-02");
        state.upsert_canvas("2024-01-01", vec![tagged_block("first", &["Love"])]);
        state.upsert_canvas("2024-01-02", vec![tagged_block("second", &["love"])]);
        state
    }

    #[test]
    fn collection_view_unions_across_days_case_insensitively() {
        let state = two_day_state();
        let mut view = ViewState::new("2024-01-02");
        view.select_collection("LOVE");

        let blocks = view.visible_blocks(&state);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn untagged_blocks_never_appear_in_collections() {
        let mut state = two_day_state();
        state.upsert_canvas("2024-01-03", vec![tagged_block("plain", &[])]);

        let mut view = ViewState::new("2024-01-03");
        view.select_collection("love");
        assert_eq!(view.visible_blocks(&state).len(), 2);

        let map = collections(&state);
        assert_eq!(map.len(), 1);
        assert_eq!(map["love"].len(), 2);
    }

    #[test]
    fn search_composes_over_the_base_projection() {
        let state = two_day_state();
        let mut view = ViewState::new("2024-01-02");

        // Empty query keeps the full base set.
        assert_eq!(view.visible_blocks(&state).len(), 1);

        view.query = "SEC".to_string();
        assert_eq!(view.visible_blocks(&state).len(), 1);

        view.query = "no such thing".to_string();
        assert!(view.visible_blocks(&state).is_empty());

        // Composed with the collection projection too.
        view.select_collection("love");
        view.query = "first".to_string();
        let blocks = view.visible_blocks(&state);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content, "first");
    }

    #[test]
    fn missing_canvas_presents_as_empty() {
        let state = two_day_state();
        let mut view = ViewState::new("2024-01-02");
        view.select_date("2019-06-01");
        assert!(view.visible_blocks(&state).is_empty());
    }

    #[test]
    fn date_selection_clears_collection_but_not_vice_versa() {
        let mut view = ViewState::new("2024-01-02");

        view.select_collection("ideas");
        assert_eq!(view.mode("2024-01-02"), ViewMode::Collection);
        // The date stays remembered behind the collection.
        assert_eq!(view.active_date, "2024-01-02");

        view.select_date("2024-01-01");
        assert_eq!(view.active_collection, None);
        assert_eq!(view.mode("2024-01-02"), ViewMode::Historical);

        view.select_date("2024-01-02");
        assert_eq!(view.mode("2024-01-02"), ViewMode::Today);
    }

    #[test]
    fn only_today_is_writable() {
        let mut view = ViewState::new("2024-01-02");
        assert!(!view.is_read_only("2024-01-02"));
        view.select_date("2024-01-01");
        assert!(view.is_read_only("2024-01-02"));
    }

    #[test]
    fn starter_collections_are_always_listed() {
        let state = two_day_state();
        let names = collection_names(&state);
        for name in DEFAULT_COLLECTIONS {
            assert!(names.contains(&name.to_string()));
        }
        assert!(names.contains(&"love".to_string()));
        assert_eq!(names.len(), DEFAULT_COLLECTIONS.len());
    }

    #[test]
    fn month_stats_skip_empty_canvases() {
        let mut state = two_day_state();
        state.upsert_canvas("2024-01-15", Vec::new());
        state.upsert_canvas("2024-02-01", vec![tagged_block("feb", &[])]);

        assert_eq!(month_entry_count(&state, 2024, 1), 2);
        assert_eq!(month_entry_count(&state, 2024, 2), 1);
        assert_eq!(month_entry_count(&state, 2023, 12), 0);

        let dates = dates_with_entries(&state);
        assert!(!dates.contains(&"2024-01-15".to_string()));
    }

    #[test]
    fn history_is_sorted_newest_first() {
        let state = two_day_state();
        let ordered = history(&state);
        assert_eq!(ordered[0].date, "2024-01-02");
        assert_eq!(ordered[1].date, "2024-01-01");
    }
}
