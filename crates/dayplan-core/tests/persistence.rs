//! Integration tests for on-disk settings and plan storage.
//!
//! Walks the full workflow: settings file, imported to-dos and events,
//! regeneration, a manual move, reload from disk and iCalendar export.

use chrono::{NaiveDate, TimeZone, Utc};
use dayplan_core::calendar::export_ics;
use dayplan_core::integrations::{events_to_blocks, parse_events, parse_todos, todos_to_tasks};
use dayplan_core::{PlanDb, Repositioner, ScheduleStore, Settings};

#[test]
fn test_full_planning_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let settings_path = dir.path().join("settings.toml");
    let db_path = dir.path().join("dayplan.db");
    let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

    let mut settings = Settings::load_from(&settings_path).unwrap();
    settings.set("day_start", "09:00").unwrap();
    settings.set("day_end", "12:00").unwrap();
    settings.set("buffer_minutes", "0").unwrap();
    settings.set("break_window", "none").unwrap();
    settings.save_to(&settings_path).unwrap();
    let settings = Settings::load_from(&settings_path).unwrap();
    assert_eq!(settings.day_end, 720);
    assert!(settings.break_window.is_none());

    let db = PlanDb::open_at(&db_path).unwrap();
    let todos = parse_todos(
        r#"[
            {"id": "ext-1", "title": "Write report 90m", "due": "2026-10-19"},
            {"id": "ext-2", "title": "Inbox", "notes": "takes 30 min"}
        ]"#,
    )
    .unwrap();
    for task in todos_to_tasks(&todos, settings.default_task_minutes) {
        db.upsert_task_from_source(&task).unwrap();
    }
    // second import of the same feed must not duplicate
    for task in todos_to_tasks(&todos, settings.default_task_minutes) {
        db.upsert_task_from_source(&task).unwrap();
    }
    let tasks = db.list_tasks().unwrap();
    assert_eq!(tasks.len(), 2);

    let events = parse_events(
        r#"[{"id": "cal-1", "title": "Standup", "start_minutes": 630, "end_minutes": 645}]"#,
    )
    .unwrap();
    let mut store = ScheduleStore::new(date);
    store.upsert_fixed_events(events_to_blocks(&events));
    store.regenerate(&tasks, &settings).unwrap();
    db.save_schedule(&store).unwrap();

    // report (deadline today) first at 09:00, inbox after the standup
    let spans: Vec<_> = store
        .blocks()
        .iter()
        .map(|b| (b.start, b.end, b.title.as_str()))
        .collect();
    assert_eq!(
        spans,
        vec![
            (540, 630, "Write report 90m"),
            (630, 645, "Standup"),
            (645, 675, "Inbox"),
        ]
    );

    let inbox = store.blocks()[2].id.clone();
    let mut mover = Repositioner::new(settings.day_window().unwrap());
    assert!(mover.move_to(&mut store, &inbox, 690).unwrap().is_committed());
    db.save_schedule(&store).unwrap();
    drop(db);

    let db = PlanDb::open_at(&db_path).unwrap();
    let reloaded = db.load_schedule(date).unwrap();
    assert_eq!(reloaded, store);
    assert_eq!(reloaded.block(&inbox).unwrap().start, 690);

    let ics = export_ics(date, reloaded.blocks(), Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap());
    assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
    assert!(ics.contains("DTSTART:20261019T113000\r\n"));
    assert!(!ics.contains("Standup"));
}

#[test]
fn test_malformed_settings_fall_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "day_start = [not toml").unwrap();

    assert!(Settings::load_from(&path).is_err());
    assert_eq!(Settings::load_from_or_default(&path), Settings::default());
}

#[test]
fn test_oversized_hour_in_settings_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "day_start = \"99999999:00\"\n").unwrap();

    assert!(Settings::load_from(&path).is_err());
    assert_eq!(Settings::load_from_or_default(&path), Settings::default());

    let mut settings = Settings::default();
    assert!(settings.set("day_start", "99999999:00").is_err());
    assert_eq!(settings, Settings::default());
}
