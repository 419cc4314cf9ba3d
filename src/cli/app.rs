//! Command handler for the canvasnotes CLI.
//!
//! Translates parsed commands into state-model operations: reads go through
//! the view projections, writes through the storage adapter's
//! replace-and-persist paths.

use std::{
    collections::HashSet,
    io::{stdin, stdout, Write},
    path::PathBuf,
};

use chrono::{Datelike, NaiveDate, Utc};
use console::style;
use log::debug;

use crate::{
    collection_names, collections, dates_with_entries, encode_image_file, history,
    month_entry_count, parse_date_key, parse_tags, today_string, Block, BlockKind, CanvasStorage,
    CnError, Commands, Config, Result, TodoItem, ViewMode, ViewState,
};

/// CLI application handler - executes commands against the canvas storage
pub struct App {
    /// The archive storage backend
    storage: CanvasStorage,

    /// Application configuration
    config: Config,

    /// Where the configuration file lives (for the config command)
    config_path: PathBuf,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    /// Create a new CLI application with the given storage backend and config
    pub fn new(storage: CanvasStorage, config: Config, config_path: PathBuf, verbose: bool) -> Self {
        Self {
            storage,
            config,
            config_path,
            verbose,
        }
    }

    /// Run the CLI application with the given command
    pub fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Add {
                block_type,
                content,
                body,
                tags,
                image,
                width,
                color,
                date,
            } => self.add_block(block_type, content, body, tags, image, width, color, date),

            Commands::List {
                date,
                collection,
                query,
                json,
                brief,
            } => self.list_blocks(date, collection, query, json, brief),

            Commands::View { id, json } => self.view_block(&id, json),

            Commands::Edit {
                id,
                content,
                body,
                width,
                height,
                auto_height,
                color,
            } => self.edit_block(&id, content, body, width, height, auto_height, color),

            Commands::Tag {
                id,
                add,
                remove,
                list,
            } => self.tag_block(&id, add, remove, list),

            Commands::Todo {
                id,
                add,
                toggle,
                remove,
                list,
            } => self.todo_block(&id, add, toggle, remove, list),

            Commands::Image {
                id,
                attach,
                remove,
                list,
            } => self.image_block(&id, attach, remove, list),

            Commands::Delete { id, force } => self.delete_block(&id, force),

            Commands::Collections => self.list_collections(),

            Commands::Calendar { month } => self.show_calendar(month),

            Commands::History => self.show_history(),

            Commands::Backup { output } => self.create_backup(output),

            Commands::Restore { backup_file, force } => self.restore_backup(backup_file, force),

            Commands::Config { show, set, reset } => self.handle_config(show, set, reset),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn add_block(
        &self,
        block_type: String,
        content: Option<String>,
        body: Option<String>,
        tags: Option<String>,
        image: Option<PathBuf>,
        width: Option<u8>,
        color: Option<String>,
        date: Option<String>,
    ) -> Result<()> {
        let today = today_string();

        // Read-only gating lives here, with the caller: the data layer
        // accepts writes for any date.
        if let Some(requested) = date {
            parse_date_key(&requested)?;
            if requested != today {
                return Err(CnError::ReadOnlyCanvas { date: requested });
            }
        }

        let kind = BlockKind::from_type_name(&block_type).ok_or_else(|| {
            CnError::ApplicationError {
                message: format!("Unknown block type: {}", block_type),
            }
        })?;

        let mut block = Block::new(kind, content.unwrap_or_default());

        if let Some(text) = body {
            if !block.set_body(text) {
                return Err(CnError::ApplicationError {
                    message: format!(
                        "{} blocks do not hold a body",
                        block.kind.type_name()
                    ),
                });
            }
        }

        if let Some(path) = image {
            let payload = encode_image_file(&path)?;
            match block.images_mut() {
                Some(images) => images.push(payload),
                None => {
                    return Err(CnError::ApplicationError {
                        message: format!(
                            "{} blocks cannot hold images",
                            block.kind.type_name()
                        ),
                    })
                }
            }
        }

        block.tags = parse_tags(tags);
        if let Some(width) = width {
            block.width = width;
        }
        block.color = color;

        let state = self.storage.load();
        let mut blocks = state
            .canvas_for(&today)
            .map(|c| c.blocks.clone())
            .unwrap_or_default();
        // New blocks go to the front of the canvas.
        blocks.insert(0, block.clone());
        self.storage.update_canvas(&today, blocks)?;

        println!("Block created with ID: {}", block.id);
        Ok(())
    }

    fn list_blocks(
        &self,
        date: Option<String>,
        collection: Option<String>,
        query: Option<String>,
        json: bool,
        brief: bool,
    ) -> Result<()> {
        let today = today_string();
        let state = self.storage.load();

        if self.verbose {
            println!("Archive: {}", self.storage.state_path().display());
        }

        let mut view = ViewState::new(&today);
        if let Some(date) = date {
            parse_date_key(&date)?;
            view.select_date(&date);
        }
        if let Some(tag) = collection {
            view.select_collection(&tag);
        }
        view.query = query.unwrap_or_default();

        let blocks = view.visible_blocks(&state);

        if json {
            println!("{}", serde_json::to_string_pretty(&blocks)?);
            return Ok(());
        }

        match view.mode(&today) {
            ViewMode::Today => println!("{}", style(format!("Canvas {}", view.active_date)).bold()),
            ViewMode::Historical => println!(
                "{} {}",
                style(format!("Canvas {}", view.active_date)).bold(),
                style("(read-only)").dim()
            ),
            ViewMode::Collection => {
                let tag = view.active_collection.as_deref().unwrap_or_default();
                println!("{}", style(format!("Collection #{}", tag.to_lowercase())).bold())
            }
        }

        self.display_blocks(&blocks, brief)
    }

    fn view_block(&self, id: &str, json: bool) -> Result<()> {
        let state = self.storage.load();
        let block = state.find_block(id).ok_or_else(|| CnError::BlockNotFound {
            id: id.to_string(),
        })?;

        if json {
            println!("{}", serde_json::to_string_pretty(block)?);
        } else {
            self.display_block(block);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn edit_block(
        &self,
        id: &str,
        content: Option<String>,
        body: Option<String>,
        width: Option<u8>,
        height: Option<u32>,
        auto_height: bool,
        color: Option<String>,
    ) -> Result<()> {
        let state = self.storage.load();
        let stored = state.find_block(id).ok_or_else(|| CnError::BlockNotFound {
            id: id.to_string(),
        })?;

        // Full-value replacement: copy the stored block, override the
        // changed fields, hand the whole thing back.
        let mut updated = stored.clone();
        if let Some(content) = content {
            updated.content = content;
        }
        if let Some(text) = body {
            if !updated.set_body(text) {
                return Err(CnError::ApplicationError {
                    message: format!("{} blocks do not hold a body", updated.kind.type_name()),
                });
            }
        }
        if let Some(width) = width {
            updated.width = width;
        }
        if auto_height {
            updated.height = None;
        } else if let Some(height) = height {
            updated.height = Some(height);
        }
        if let Some(color) = color {
            updated.color = Some(color);
        }

        self.storage.update_block(updated)?;
        println!("Block {} updated", id);
        Ok(())
    }

    fn tag_block(
        &self,
        id: &str,
        add: Option<String>,
        remove: Option<String>,
        list: bool,
    ) -> Result<()> {
        let state = self.storage.load();
        let stored = state.find_block(id).ok_or_else(|| CnError::BlockNotFound {
            id: id.to_string(),
        })?;

        let mut updated = stored.clone();
        let mutating = add.is_some() || remove.is_some();

        for tag in parse_tags(add) {
            // Exact-duplicate check only; differing case stays possible,
            // consumers match tags case-insensitively anyway.
            if !updated.tags.contains(&tag) {
                updated.tags.push(tag);
            }
        }
        let to_remove = parse_tags(remove);
        if !to_remove.is_empty() {
            updated.tags.retain(|t| !to_remove.contains(t));
        }

        if mutating {
            self.storage.update_block(updated.clone())?;
        }

        if list || !mutating {
            if updated.tags.is_empty() {
                println!("No tags on block {}", id);
            } else {
                for tag in &updated.tags {
                    println!("#{}", tag);
                }
            }
        } else {
            println!("Block {} now has {} tag(s)", id, updated.tags.len());
        }
        Ok(())
    }

    fn todo_block(
        &self,
        id: &str,
        add: Option<String>,
        toggle: Option<String>,
        remove: Option<String>,
        list: bool,
    ) -> Result<()> {
        let state = self.storage.load();
        let stored = state.find_block(id).ok_or_else(|| CnError::BlockNotFound {
            id: id.to_string(),
        })?;

        let mut updated = stored.clone();
        let mutating = add.is_some() || toggle.is_some() || remove.is_some();

        {
            let todos = updated.todos_mut().ok_or_else(|| CnError::ApplicationError {
                message: format!("Block {} is not a checklist block", id),
            })?;

            if let Some(text) = add {
                let item = TodoItem::new(text);
                println!("Added entry {}", item.id);
                todos.push(item);
            }

            if let Some(todo_id) = toggle {
                let item = todos.iter_mut().find(|t| t.id == todo_id).ok_or_else(|| {
                    CnError::ApplicationError {
                        message: format!("No entry {} on block {}", todo_id, id),
                    }
                })?;
                item.completed = !item.completed;
            }

            if let Some(todo_id) = remove {
                let before = todos.len();
                todos.retain(|t| t.id != todo_id);
                if todos.len() == before {
                    return Err(CnError::ApplicationError {
                        message: format!("No entry {} on block {}", todo_id, id),
                    });
                }
            }
        }

        if mutating {
            self.storage.update_block(updated.clone())?;
        }

        if list || !mutating {
            if updated.todos().is_empty() {
                println!("No entries on block {}", id);
            }
            for todo in updated.todos() {
                let mark = if todo.completed { "x" } else { " " };
                println!("[{}] {}  {}", mark, todo.id, todo.text);
            }
        }
        Ok(())
    }

    fn image_block(
        &self,
        id: &str,
        attach: Option<PathBuf>,
        remove: Option<usize>,
        list: bool,
    ) -> Result<()> {
        let state = self.storage.load();
        let stored = state.find_block(id).ok_or_else(|| CnError::BlockNotFound {
            id: id.to_string(),
        })?;

        let mut updated = stored.clone();
        let mutating = attach.is_some() || remove.is_some();

        {
            let images = updated
                .images_mut()
                .ok_or_else(|| CnError::ApplicationError {
                    message: format!("Block {} cannot hold images", id),
                })?;

            if let Some(path) = attach {
                images.push(encode_image_file(&path)?);
            }

            if let Some(index) = remove {
                if index >= images.len() {
                    return Err(CnError::ApplicationError {
                        message: format!(
                            "Block {} has {} image(s); no index {}",
                            id,
                            images.len(),
                            index
                        ),
                    });
                }
                images.remove(index);
            }
        }

        if mutating {
            self.storage.update_block(updated.clone())?;
        }

        if list || !mutating {
            if updated.images().is_empty() {
                println!("No images on block {}", id);
            }
            for (i, payload) in updated.images().iter().enumerate() {
                let mime = payload
                    .strip_prefix("data:")
                    .and_then(|rest| rest.split(';').next())
                    .unwrap_or("unknown");
                println!("{}: {} ({} bytes inline)", i, mime, payload.len());
            }
        }
        Ok(())
    }

    fn delete_block(&self, id: &str, force: bool) -> Result<()> {
        let state = self.storage.load();
        let block = state.find_block(id).ok_or_else(|| CnError::BlockNotFound {
            id: id.to_string(),
        })?;

        if !force {
            let prompt = format!("Delete block '{}' ({})?", block.content, id);
            if !self.confirm(&prompt)? {
                println!("Aborted.");
                return Ok(());
            }
        }

        self.storage.delete_block(id)?;
        println!("Block {} deleted", id);
        Ok(())
    }

    fn list_collections(&self) -> Result<()> {
        let state = self.storage.load();
        let map = collections(&state);

        for name in collection_names(&state) {
            let count = map.get(&name).map(|blocks| blocks.len()).unwrap_or(0);
            println!(
                "{:<16} {}",
                style(name.to_uppercase()).bold(),
                style(format!("{} record(s)", count)).dim()
            );
        }
        Ok(())
    }

    fn show_calendar(&self, month: Option<String>) -> Result<()> {
        let today = today_string();
        let state = self.storage.load();

        let first = match month {
            Some(m) => NaiveDate::parse_from_str(&format!("{}-01", m), "%Y-%m-%d")
                .map_err(|_| CnError::InvalidDate { value: m })?,
            None => {
                let now = Utc::now();
                NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
                    .unwrap_or_else(|| now.date_naive())
            }
        };
        let month_num = first.month();

        let entry_dates: HashSet<String> = dates_with_entries(&state).into_iter().collect();

        println!("{}", style(first.format("%B %Y").to_string()).bold());
        println!("Su Mo Tu We Th Fr Sa");

        let mut line = String::new();
        for _ in 0..first.weekday().num_days_from_sunday() {
            line.push_str("   ");
        }
        let mut day = first;
        loop {
            let key = day.format("%Y-%m-%d").to_string();
            let cell = if key == today {
                style(format!("{:>2}", day.day())).bold().underlined().to_string()
            } else if entry_dates.contains(&key) {
                style(format!("{:>2}", day.day())).cyan().to_string()
            } else {
                format!("{:>2}", day.day())
            };
            line.push_str(&cell);
            line.push(' ');

            if day.weekday().num_days_from_sunday() == 6 {
                println!("{}", line.trim_end());
                line.clear();
            }
            day = match day.succ_opt() {
                Some(next) if next.month() == month_num => next,
                _ => break,
            };
        }
        if !line.trim().is_empty() {
            println!("{}", line.trim_end());
        }

        let entries = month_entry_count(&state, first.year(), month_num);
        let goal = self.config.monthly_goal.max(1) as usize;
        let filled = (entries * 20 / goal).min(20);
        println!(
            "\n[{}{}] {}/{} days with entries",
            "#".repeat(filled),
            "-".repeat(20 - filled),
            entries,
            goal
        );
        Ok(())
    }

    fn show_history(&self) -> Result<()> {
        let state = self.storage.load();

        let canvases = history(&state);
        if canvases.is_empty() {
            println!("No archives yet.");
            return Ok(());
        }

        for canvas in canvases {
            let label = parse_date_key(&canvas.date)
                .map(|d| d.format("%b %d, %Y").to_string())
                .unwrap_or_else(|_| canvas.date.clone());
            println!(
                "{}  {}",
                style(format!("{:<14}", label)).bold(),
                style(format!("{} item(s)", canvas.blocks.len())).dim()
            );
        }
        Ok(())
    }

    fn create_backup(&self, output: Option<PathBuf>) -> Result<()> {
        let path = self.storage.create_full_backup(output)?;
        println!("Backup created at: {}", path.display());
        Ok(())
    }

    fn restore_backup(&self, backup_file: PathBuf, force: bool) -> Result<()> {
        if !force {
            let prompt = format!(
                "Replace the current archive with the backup at {}?",
                backup_file.display()
            );
            if !self.confirm(&prompt)? {
                println!("Aborted.");
                return Ok(());
            }
        }

        let summary = self.storage.restore_full_backup(&backup_file)?;
        println!(
            "Restored {} canvas(es), {} block(s) from {}",
            summary.canvases,
            summary.blocks,
            summary.backup_file.display()
        );
        Ok(())
    }

    fn handle_config(&self, show: bool, set: Option<String>, reset: bool) -> Result<()> {
        if reset {
            let config = Config::default();
            config.save(&self.config_path)?;
            println!("Configuration reset to defaults");
            return Ok(());
        }

        if let Some(assignment) = set {
            let mut config = self.config.clone();
            config.set(&assignment)?;
            config.save(&self.config_path)?;
            println!("Configuration updated");
            return Ok(());
        }

        // Plain `config` and `config --show` both print the current settings.
        if !show {
            debug!("No config action given, showing current settings");
        }
        println!("{}", serde_json::to_string_pretty(&self.config)?);
        Ok(())
    }

    /// Display blocks in text format
    fn display_blocks(&self, blocks: &[&Block], brief: bool) -> Result<()> {
        if blocks.is_empty() {
            println!("No blocks found.");
            return Ok(());
        }

        if brief {
            for block in blocks {
                println!("{}  [{}] {}", block.id, block.kind.type_name(), block.content);
            }
        } else {
            // Use terminal width for formatting if available
            let term_width = terminal_size::terminal_size()
                .map(|(w, _)| w.0 as usize)
                .unwrap_or(80);

            for (i, block) in blocks.iter().enumerate() {
                if i > 0 {
                    println!("{}", "-".repeat(term_width.min(50)));
                }
                self.display_block(block);
            }
        }

        println!(
            "\nFound {} block{}",
            blocks.len(),
            if blocks.len() == 1 { "" } else { "s" }
        );
        Ok(())
    }

    /// Display a single block in text format
    fn display_block(&self, block: &Block) {
        let created_at = block.created_at.format("%Y-%m-%d %H:%M");
        println!(
            "ID: {} | Type: {} | Created: {}",
            block.id,
            block.kind.type_name(),
            created_at
        );
        println!("Title: {}", style(&block.content).bold());

        if !block.body().is_empty() {
            println!("\n{}", block.body());
        }

        for todo in block.todos() {
            let mark = if todo.completed { "x" } else { " " };
            println!("  [{}] {}  {}", mark, todo.id, todo.text);
        }

        if !block.images().is_empty() {
            println!("Images: {}", block.images().len());
        }

        if !block.tags.is_empty() {
            let tags = block
                .tags
                .iter()
                .map(|tag| format!("#{}", tag))
                .collect::<Vec<_>>()
                .join(" ");
            println!("Tags: {}", style(tags).cyan());
        }
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        print!("{} [y/N]: ", prompt);
        stdout().flush()?;
        let mut input = String::new();
        stdin().read_line(&mut input)?;
        Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}
