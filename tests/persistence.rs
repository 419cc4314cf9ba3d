use std::fs;

use canvasnotes::{
    today_string, AppState, Block, BlockKind, CanvasStorage, CnError, Config, ViewState,
};
use tempfile::TempDir;

fn test_storage(dir: &TempDir) -> CanvasStorage {
    let config = Config {
        data_dir: dir.path().join("data"),
        backup_dir: dir.path().join("backups"),
        max_backups: 2,
        auto_backup: false,
        monthly_goal: 20,
    };
    CanvasStorage::new(config).unwrap()
}

fn text_block(content: &str) -> Block {
    Block::new(BlockKind::from_type_name("text").unwrap(), content)
}

#[test]
fn update_canvas_round_trips_blocks_exactly() {
    let dir = TempDir::new().unwrap();
    let storage = test_storage(&dir);

    let blocks = vec![text_block("first"), text_block("second")];
    storage.update_canvas("2020-05-05", blocks.clone()).unwrap();

    let reloaded = storage.load();
    let canvas = reloaded.canvas_for("2020-05-05").unwrap();
    assert_eq!(canvas.blocks, blocks);
}

#[test]
fn update_canvas_rejects_malformed_dates() {
    let dir = TempDir::new().unwrap();
    let storage = test_storage(&dir);

    let result = storage.update_canvas("not-a-date", Vec::new());
    assert!(matches!(result, Err(CnError::InvalidDate { .. })));
}

#[test]
fn stale_current_id_rolls_over_to_today() {
    let dir = TempDir::new().unwrap();
    let storage = test_storage(&dir);
    let today = today_string();

    let mut state = AppState::first_run("2020-01-01");
    state.upsert_canvas("2020-01-01", vec![text_block("old entry")]);
    storage.save(&state).unwrap();

    let loaded = storage.load();
    assert_eq!(loaded.current_canvas_id, today);
    assert_eq!(loaded.archive.len(), 2);
    assert!(loaded.canvas_for(&today).unwrap().blocks.is_empty());

    // The historical canvas is untouched.
    let old = loaded.canvas_for("2020-01-01").unwrap();
    assert_eq!(old.blocks.len(), 1);
    assert_eq!(old.blocks[0].content, "old entry");
}

#[test]
fn rollover_does_not_duplicate_an_existing_today_canvas() {
    let dir = TempDir::new().unwrap();
    let storage = test_storage(&dir);
    let today = today_string();

    let mut state = AppState::first_run("2020-01-01");
    state.upsert_canvas(&today, vec![text_block("already here")]);
    storage.save(&state).unwrap();

    let loaded = storage.load();
    assert_eq!(loaded.current_canvas_id, today);
    assert_eq!(
        loaded.archive.iter().filter(|c| c.date == today).count(),
        1
    );
    assert_eq!(loaded.canvas_for(&today).unwrap().blocks.len(), 1);
}

#[test]
fn missing_document_loads_as_first_run() {
    let dir = TempDir::new().unwrap();
    let storage = test_storage(&dir);
    let today = today_string();

    let state = storage.load();
    assert_eq!(state.current_canvas_id, today);
    assert_eq!(state.archive.len(), 1);
    assert_eq!(state.archive[0].date, today);
    assert!(state.archive[0].blocks.is_empty());
}

#[test]
fn corrupt_document_loads_as_first_run() {
    let dir = TempDir::new().unwrap();
    let storage = test_storage(&dir);

    fs::write(storage.state_path(), "{ this is not json").unwrap();

    let state = storage.load();
    assert_eq!(state.current_canvas_id, today_string());
    assert_eq!(state.archive.len(), 1);
    assert!(state.archive[0].blocks.is_empty());
}

#[test]
fn newer_schema_version_loads_as_first_run() {
    let dir = TempDir::new().unwrap();
    let storage = test_storage(&dir);

    fs::write(
        storage.state_path(),
        r#"{"schemaVersion":99,"currentCanvasId":"2024-01-01","archive":[]}"#,
    )
    .unwrap();

    let state = storage.load();
    assert_eq!(state.current_canvas_id, today_string());
    assert_eq!(state.archive.len(), 1);
}

#[test]
fn tagged_block_shows_in_today_view_and_collection_view() {
    let dir = TempDir::new().unwrap();
    let storage = test_storage(&dir);
    let today = today_string();

    let block = text_block("brainstorm");
    let id = block.id.clone();
    storage.update_canvas(&today, vec![block]).unwrap();

    let state = storage.load();
    let mut updated = state.find_block(&id).unwrap().clone();
    updated.tags = vec!["ideas".to_string()];
    storage.update_block(updated).unwrap();

    let reloaded = storage.load();

    let view = ViewState::new(&today);
    assert!(view.visible_blocks(&reloaded).iter().any(|b| b.id == id));

    let mut view = ViewState::new(&today);
    view.select_collection("ideas");
    assert!(view.visible_blocks(&reloaded).iter().any(|b| b.id == id));
}

#[test]
fn cross_day_collection_matches_tags_case_insensitively() {
    let dir = TempDir::new().unwrap();
    let storage = test_storage(&dir);

    let mut first = text_block("from january first");
    first.tags = vec!["Love".to_string()];
    let mut second = text_block("from january second");
    second.tags = vec!["love".to_string()];

    storage.update_canvas("2024-01-01", vec![first]).unwrap();
    storage.update_canvas("2024-01-02", vec![second]).unwrap();

    let state = storage.load();
    let mut view = ViewState::new(&today_string());
    view.select_collection("LOVE");
    assert_eq!(view.visible_blocks(&state).len(), 2);
}

#[test]
fn mutating_an_unowned_block_is_an_explicit_error() {
    let dir = TempDir::new().unwrap();
    let storage = test_storage(&dir);

    let orphan = text_block("never persisted");
    let result = storage.update_block(orphan);
    assert!(matches!(result, Err(CnError::BlockNotFound { .. })));

    let result = storage.delete_block("no-such-id");
    assert!(matches!(result, Err(CnError::BlockNotFound { .. })));
}

#[test]
fn deleting_a_block_only_touches_its_owner() {
    let dir = TempDir::new().unwrap();
    let storage = test_storage(&dir);

    let keep = text_block("keep");
    let gone = text_block("gone");
    let gone_id = gone.id.clone();
    storage
        .update_canvas("2024-01-01", vec![keep.clone(), gone])
        .unwrap();
    storage
        .update_canvas("2024-01-02", vec![text_block("other day")])
        .unwrap();

    storage.delete_block(&gone_id).unwrap();

    let state = storage.load();
    let canvas = state.canvas_for("2024-01-01").unwrap();
    assert_eq!(canvas.blocks, vec![keep]);
    assert_eq!(state.canvas_for("2024-01-02").unwrap().blocks.len(), 1);
}

#[test]
fn backup_and_restore_round_trip() {
    let dir = TempDir::new().unwrap();
    let storage = test_storage(&dir);
    let today = today_string();

    storage
        .update_canvas(&today, vec![text_block("today's note")])
        .unwrap();
    storage
        .update_canvas("2024-01-01", vec![text_block("history")])
        .unwrap();
    let before = storage.load();

    let backup_path = storage.create_full_backup(None).unwrap();
    assert!(backup_path.exists());

    // Wreck the live document, then restore.
    fs::write(storage.state_path(), "garbage").unwrap();
    let summary = storage.restore_full_backup(&backup_path).unwrap();
    assert_eq!(summary.canvases, before.archive.len());
    assert_eq!(summary.blocks, 2);

    let after = storage.load();
    assert_eq!(after, before);
}

#[test]
fn restore_rejects_non_backup_files() {
    let dir = TempDir::new().unwrap();
    let storage = test_storage(&dir);

    let bogus = dir.path().join("not-a-backup.txt");
    fs::write(&bogus, "hello").unwrap();
    assert!(matches!(
        storage.restore_full_backup(&bogus),
        Err(CnError::RestoreFailed { .. })
    ));

    let missing = dir.path().join("missing.zip");
    assert!(matches!(
        storage.restore_full_backup(&missing),
        Err(CnError::RestoreFailed { .. })
    ));
}

#[test]
fn backup_retention_keeps_only_the_newest_archives() {
    let dir = TempDir::new().unwrap();
    let storage = test_storage(&dir);

    storage
        .update_canvas(&today_string(), vec![text_block("note")])
        .unwrap();

    let first = storage.create_full_backup(None).unwrap();
    let mut paths = vec![first];
    for _ in 0..2 {
        // Timestamped names collide within a second; spread them out.
        std::thread::sleep(std::time::Duration::from_millis(1100));
        paths.push(storage.create_full_backup(None).unwrap());
    }

    let remaining: Vec<_> = fs::read_dir(dir.path().join("backups"))
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .starts_with("canvasnotes_backup_")
        })
        .collect();
    assert_eq!(remaining.len(), 2);
    // The first (oldest) backup is the one that was pruned.
    assert!(!paths[0].exists());
    assert!(paths[2].exists());
}
