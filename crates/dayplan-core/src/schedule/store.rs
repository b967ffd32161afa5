//! The day's schedule: the single owner of its blocks.
//!
//! Regeneration replaces every non-fixed block in one step; the
//! [`Repositioner`](super::Repositioner) patches individual blocks. Both take
//! the store by `&mut`, so there is exactly one writer at a time.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Block, BlockKind, Unplaced};
use crate::clock::Minute;
use crate::error::ConfigError;
use crate::scheduler::{Allocation, Allocator, SchedulerConfig};
use crate::storage::{Settings, BREAK_BLOCK_ID};
use crate::task::Task;

/// Blocks and unplaced work for one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleStore {
    date: NaiveDate,
    blocks: Vec<Block>,
    unplaced: Vec<Unplaced>,
}

/// The "current schedule" artifact handed to rendering and export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleSnapshot {
    pub date: NaiveDate,
    pub blocks: Vec<Block>,
    pub unplaced: Vec<Unplaced>,
    pub settings: Settings,
}

impl ScheduleStore {
    /// An empty schedule.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            blocks: Vec::new(),
            unplaced: Vec::new(),
        }
    }

    /// Rebuild from persisted parts.
    pub fn from_parts(date: NaiveDate, mut blocks: Vec<Block>, unplaced: Vec<Unplaced>) -> Self {
        blocks.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| b.fixed.cmp(&a.fixed)));
        Self {
            date,
            blocks,
            unplaced,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn unplaced(&self) -> &[Unplaced] {
        &self.unplaced
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn fixed_blocks(&self) -> Vec<Block> {
        self.blocks.iter().filter(|b| b.fixed).cloned().collect()
    }

    /// Add or replace imported calendar events.
    ///
    /// Events are matched by id, so re-importing the same feed updates in
    /// place. Every event is stored as fixed.
    ///
    /// Returns the ids of placed blocks that now overlap an event; they stay
    /// where they are until the next regeneration.
    pub fn upsert_fixed_events(&mut self, events: impl IntoIterator<Item = Block>) -> Vec<String> {
        for mut event in events {
            event.fixed = true;
            event.task_id = None;
            match self.blocks.iter_mut().find(|b| b.id == event.id) {
                Some(existing) => *existing = event,
                None => self.blocks.push(event),
            }
        }
        self.sort_blocks();

        let overlapped: Vec<String> = self
            .blocks
            .iter()
            .filter(|b| !b.fixed)
            .filter(|b| {
                self.blocks
                    .iter()
                    .any(|other| other.fixed && other.overlaps(b.start, b.end))
            })
            .map(|b| b.id.clone())
            .collect();
        if !overlapped.is_empty() {
            tracing::warn!(date = %self.date, blocks = ?overlapped, "imported events overlap placed blocks");
        }
        overlapped
    }

    /// Discard every placed block and allocate again from the fixed blocks.
    ///
    /// The break block is refreshed from the settings first. Fixed blocks are
    /// kept as stored, even where they reach outside the day window; only the
    /// part inside the window is reserved. Manual moves of non-fixed blocks
    /// are not preserved.
    ///
    /// # Errors
    /// Returns the configuration error, leaving the store untouched, when the
    /// settings are invalid.
    pub fn regenerate(&mut self, tasks: &[Task], settings: &Settings) -> Result<(), ConfigError> {
        let config = SchedulerConfig::from_settings(settings)?;

        let mut fixed: Vec<Block> = self
            .blocks
            .iter()
            .filter(|b| b.fixed && !(b.kind == BlockKind::Break && b.id == BREAK_BLOCK_ID))
            .cloned()
            .collect();
        if let Some(brk) = settings.break_block() {
            fixed.push(brk);
        }

        let Allocation { blocks, unplaced } = Allocator::with_config(config).allocate(tasks, &fixed);
        self.blocks = fixed;
        self.blocks.extend(blocks.into_iter().filter(|b| !b.fixed));
        self.sort_blocks();
        self.unplaced = unplaced;
        tracing::info!(date = %self.date, blocks = self.blocks.len(), unplaced = self.unplaced.len(), "schedule regenerated");
        Ok(())
    }

    /// Remove a block. Returns it if it existed.
    pub fn remove_block(&mut self, id: &str) -> Option<Block> {
        let idx = self.blocks.iter().position(|b| b.id == id)?;
        Some(self.blocks.remove(idx))
    }

    /// Set the done flag. Returns `None` for an unknown id.
    pub fn set_done(&mut self, id: &str, done: bool) -> Option<&Block> {
        let block = self.blocks.iter_mut().find(|b| b.id == id)?;
        block.done = done;
        Some(block)
    }

    /// Flip the done flag, returning the new value.
    pub fn toggle_done(&mut self, id: &str) -> Option<bool> {
        let block = self.blocks.iter_mut().find(|b| b.id == id)?;
        block.done = !block.done;
        Some(block.done)
    }

    /// Drop every block and unplaced entry of a deleted task.
    ///
    /// Returns how many blocks were removed.
    pub fn remove_task(&mut self, task_id: &str) -> usize {
        let before = self.blocks.len();
        self.blocks.retain(|b| b.task_id.as_deref() != Some(task_id));
        self.unplaced.retain(|u| u.task_id != task_id);
        before - self.blocks.len()
    }

    /// Whether `[start, end)` intersects any block other than `except`.
    pub fn overlaps_other(&self, except: &str, start: Minute, end: Minute) -> bool {
        self.blocks
            .iter()
            .any(|b| b.id != except && b.overlaps(start, end))
    }

    pub(crate) fn move_block(&mut self, id: &str, start: Minute, end: Minute) -> bool {
        let Some(block) = self.blocks.iter_mut().find(|b| b.id == id) else {
            return false;
        };
        block.start = start;
        block.end = end;
        self.sort_blocks();
        true
    }

    /// Bundle the schedule with the settings that produced it.
    pub fn snapshot(&self, settings: &Settings) -> ScheduleSnapshot {
        ScheduleSnapshot {
            date: self.date,
            blocks: self.blocks.clone(),
            unplaced: self.unplaced.clone(),
            settings: settings.clone(),
        }
    }

    fn sort_blocks(&mut self) {
        self.blocks
            .sort_by(|a, b| a.start.cmp(&b.start).then_with(|| b.fixed.cmp(&a.fixed)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Priority;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn settings() -> Settings {
        Settings {
            day_start: 540,
            day_end: 720,
            buffer_minutes: 0,
            break_window: None,
            ..Settings::default()
        }
    }

    fn task(id: &str, minutes: u32) -> Task {
        let mut task = Task::new(format!("Task {id}"), minutes, Priority::Medium);
        task.id = id.to_string();
        task
    }

    #[test]
    fn regenerate_places_tasks_around_fixed_events() {
        let mut store = ScheduleStore::new(date());
        store.upsert_fixed_events([Block::fixed("ev", BlockKind::Calendar, "Standup", 540, 570)]);
        store.regenerate(&[task("a", 60)], &settings()).unwrap();

        let spans: Vec<_> = store.blocks().iter().map(|b| (b.start, b.end, b.fixed)).collect();
        assert_eq!(spans, vec![(540, 570, true), (570, 630, false)]);
    }

    #[test]
    fn regenerate_keeps_fixed_events_outside_the_window() {
        let mut store = ScheduleStore::new(date());
        store.upsert_fixed_events([
            Block::fixed("event-late", BlockKind::Calendar, "Dinner", 1140, 1200),
            Block::fixed("event-early", BlockKind::Calendar, "Gym", 480, 570),
        ]);
        store.regenerate(&[task("a", 60)], &settings()).unwrap();
        store.regenerate(&[task("a", 60)], &settings()).unwrap();

        let spans: Vec<_> = store
            .blocks()
            .iter()
            .map(|b| (b.task_id.as_deref().unwrap_or(&b.id), b.start, b.end))
            .collect();
        assert_eq!(
            spans,
            vec![("event-early", 480, 570), ("a", 570, 630), ("event-late", 1140, 1200)]
        );
    }

    #[test]
    fn upsert_fixed_events_reports_overlapped_placements() {
        let mut store = ScheduleStore::new(date());
        store.regenerate(&[task("a", 60), task("b", 30)], &settings()).unwrap();

        let overlapped =
            store.upsert_fixed_events([Block::fixed("ev", BlockKind::Calendar, "Call", 600, 620)]);
        assert_eq!(overlapped.len(), 1);
        let hit = store.block(&overlapped[0]).unwrap();
        assert_eq!(hit.task_id.as_deref(), Some("b"));
        assert_eq!((hit.start, hit.end), (600, 630));

        let clear =
            store.upsert_fixed_events([Block::fixed("ev2", BlockKind::Calendar, "Late", 700, 720)]);
        assert!(clear.is_empty());
    }

    #[test]
    fn regenerate_discards_previous_placements() {
        let mut store = ScheduleStore::new(date());
        store.regenerate(&[task("a", 60)], &settings()).unwrap();
        let first_id = store.blocks()[0].id.clone();

        store.regenerate(&[task("b", 30)], &settings()).unwrap();
        assert!(store.block(&first_id).is_none());
        assert_eq!(store.blocks().len(), 1);
        assert_eq!(store.blocks()[0].task_id.as_deref(), Some("b"));
    }

    #[test]
    fn regenerate_refreshes_break_from_settings() {
        let mut store = ScheduleStore::new(date());
        let mut with_break = settings();
        with_break.set("break_window", "10:00-10:30").unwrap();
        store.regenerate(&[], &with_break).unwrap();
        assert_eq!(store.fixed_blocks().len(), 1);

        with_break.set("break_window", "11:00-11:30").unwrap();
        store.regenerate(&[], &with_break).unwrap();
        let fixed = store.fixed_blocks();
        assert_eq!(fixed.len(), 1);
        assert_eq!((fixed[0].start, fixed[0].end), (660, 690));

        store.regenerate(&[], &settings()).unwrap();
        assert!(store.fixed_blocks().is_empty());
    }

    #[test]
    fn invalid_settings_leave_store_untouched() {
        let mut store = ScheduleStore::new(date());
        store.regenerate(&[task("a", 60)], &settings()).unwrap();
        let before = store.clone();

        let mut bad = settings();
        bad.day_end = bad.day_start;
        assert!(store.regenerate(&[task("b", 30)], &bad).is_err());
        assert_eq!(store, before);
    }

    #[test]
    fn remove_task_cascades_to_blocks_and_unplaced() {
        let mut store = ScheduleStore::new(date());
        let big = task("big", 600).splittable(true);
        store.regenerate(&[big, task("x", 30)], &settings()).unwrap();
        assert!(!store.unplaced().is_empty());

        let removed = store.remove_task("big");
        assert_eq!(removed, 3);
        assert!(store.unplaced().iter().all(|u| u.task_id != "big"));
        assert!(store.blocks().iter().all(|b| b.task_id.as_deref() != Some("big")));
    }

    #[test]
    fn done_and_remove_are_direct_transitions() {
        let mut store = ScheduleStore::new(date());
        store.regenerate(&[task("a", 30)], &settings()).unwrap();
        let id = store.blocks()[0].id.clone();

        assert_eq!(store.toggle_done(&id), Some(true));
        assert!(store.block(&id).unwrap().done);
        assert_eq!(store.set_done(&id, false).map(|b| b.done), Some(false));
        assert_eq!(store.toggle_done("missing"), None);

        assert!(store.remove_block(&id).is_some());
        assert!(store.remove_block(&id).is_none());
    }

    #[test]
    fn upsert_fixed_events_replaces_by_id() {
        let mut store = ScheduleStore::new(date());
        store.upsert_fixed_events([Block::fixed("ev", BlockKind::Calendar, "Old", 600, 630)]);
        store.upsert_fixed_events([Block::fixed("ev", BlockKind::Calendar, "New", 610, 640)]);
        assert_eq!(store.blocks().len(), 1);
        assert_eq!(store.blocks()[0].title, "New");
    }

    #[test]
    fn snapshot_carries_settings() {
        let store = ScheduleStore::new(date());
        let snapshot = store.snapshot(&settings());
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["date"], "2026-10-19");
        assert_eq!(json["settings"]["day_start"], "09:00");
    }
}
