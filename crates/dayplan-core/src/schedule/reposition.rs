//! Manual block moves.
//!
//! A drag gesture follows strict transitions:
//!
//!   IDLE ──begin──> DRAGGING ──end──> IDLE (committed | reverted)
//!                      │  ^
//!                      └──┘ drag (candidate updated)
//!                      │
//!                      └──cancel──> IDLE
//!
//! While dragging only the candidate position changes; the store is written
//! once, on a successful `end`. A move that would overlap another block is
//! reverted, which leaves the store exactly as it was.

use std::fmt;

use super::{DayWindow, ScheduleStore};
use crate::clock::{format_hhmm, snap_displacement, Minute};

/// Why a gesture could not start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveRejection {
    /// No block with this id
    NotFound(String),
    /// Fixed blocks are immovable
    Fixed(String),
    /// Another gesture is still open
    AlreadyDragging(String),
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveRejection::NotFound(id) => write!(f, "block {id} does not exist"),
            MoveRejection::Fixed(id) => write!(f, "block {id} is fixed and cannot be moved"),
            MoveRejection::AlreadyDragging(id) => write!(f, "block {id} is already being moved"),
        }
    }
}

impl std::error::Error for MoveRejection {}

/// Result of releasing a drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The block now occupies the candidate range
    Committed { id: String, start: Minute, end: Minute },
    /// The block stayed at its original range
    Reverted {
        id: String,
        start: Minute,
        end: Minute,
        notice: String,
    },
    /// `end` was called with no open gesture
    Idle,
}

impl MoveOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, MoveOutcome::Committed { .. })
    }
}

/// An open gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub block_id: String,
    pub original_start: Minute,
    pub original_end: Minute,
    pub candidate_start: Minute,
}

impl DragSession {
    fn duration(&self) -> u32 {
        self.original_end - self.original_start
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Applies drag gestures to a [`ScheduleStore`].
pub struct Repositioner {
    window: DayWindow,
    state: DragState,
}

impl Repositioner {
    pub fn new(window: DayWindow) -> Self {
        Self {
            window,
            state: DragState::Idle,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Start moving a block, capturing its current range.
    ///
    /// # Errors
    /// Refuses unknown or fixed blocks and a second concurrent gesture.
    pub fn begin(&mut self, store: &ScheduleStore, block_id: &str) -> Result<(), MoveRejection> {
        if let DragState::Dragging(session) = &self.state {
            return Err(MoveRejection::AlreadyDragging(session.block_id.clone()));
        }
        let block = store
            .block(block_id)
            .ok_or_else(|| MoveRejection::NotFound(block_id.to_string()))?;
        if block.fixed {
            return Err(MoveRejection::Fixed(block_id.to_string()));
        }

        self.state = DragState::Dragging(DragSession {
            block_id: block.id.clone(),
            original_start: block.start,
            original_end: block.end,
            candidate_start: block.start,
        });
        Ok(())
    }

    /// Update the candidate from the pointer displacement since `begin`.
    ///
    /// The displacement is snapped to the 5-minute grid and the result is
    /// clamped so the whole block stays inside the day window. Returns the
    /// candidate start, or `None` when no gesture is open.
    pub fn drag(&mut self, displacement_minutes: i32) -> Option<Minute> {
        let DragState::Dragging(session) = &mut self.state else {
            return None;
        };
        let snapped = i64::from(session.original_start) + i64::from(snap_displacement(displacement_minutes));
        let latest = i64::from(self.window.end.saturating_sub(session.duration()));
        let earliest = i64::from(self.window.start);
        let clamped = snapped.min(latest).max(earliest);
        session.candidate_start = clamped as Minute;
        Some(session.candidate_start)
    }

    /// Release the gesture, committing the candidate if it overlaps nothing.
    pub fn end(&mut self, store: &mut ScheduleStore) -> MoveOutcome {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return MoveOutcome::Idle;
        };

        let start = session.candidate_start;
        let end = start + session.duration();
        let revert = |notice: String| {
            tracing::warn!(block = %session.block_id, %notice, "move reverted");
            MoveOutcome::Reverted {
                id: session.block_id.clone(),
                start: session.original_start,
                end: session.original_end,
                notice,
            }
        };

        if !self.window.contains(start, end) {
            return revert(format!(
                "{}-{} is outside the day",
                format_hhmm(start),
                format_hhmm(end)
            ));
        }
        if store.overlaps_other(&session.block_id, start, end) {
            return revert(format!(
                "{}-{} overlaps another block",
                format_hhmm(start),
                format_hhmm(end)
            ));
        }
        if !store.move_block(&session.block_id, start, end) {
            return revert("block was removed during the move".to_string());
        }

        tracing::info!(block = %session.block_id, start, end, "move committed");
        MoveOutcome::Committed {
            id: session.block_id,
            start,
            end,
        }
    }

    /// Abandon the gesture without touching the store.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// Run a full gesture: begin, drag to `new_start`, end.
    ///
    /// # Errors
    /// Same as [`Repositioner::begin`].
    pub fn move_to(
        &mut self,
        store: &mut ScheduleStore,
        block_id: &str,
        new_start: Minute,
    ) -> Result<MoveOutcome, MoveRejection> {
        self.begin(store, block_id)?;
        let original = match &self.state {
            DragState::Dragging(session) => session.original_start,
            DragState::Idle => return Ok(MoveOutcome::Idle),
        };
        let delta = i64::from(new_start) - i64::from(original);
        self.drag(delta.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32);
        Ok(self.end(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{Block, BlockKind};
    use crate::task::{Priority, Task};
    use chrono::NaiveDate;

    fn store_with(blocks: Vec<Block>) -> ScheduleStore {
        ScheduleStore::from_parts(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(), blocks, Vec::new())
    }

    fn task_block(id: &str, start: Minute, end: Minute) -> Block {
        let task = Task::new("Work", end - start, Priority::Medium);
        let mut block = Block::for_task(&task, "Work".into(), start, end);
        block.id = id.to_string();
        block
    }

    fn window() -> DayWindow {
        DayWindow::new(540, 720).unwrap()
    }

    #[test]
    fn committed_move_updates_store() {
        let mut store = store_with(vec![task_block("a", 540, 600)]);
        let mut mover = Repositioner::new(window());

        mover.begin(&store, "a").unwrap();
        assert_eq!(mover.drag(32), Some(570));
        let outcome = mover.end(&mut store);

        assert_eq!(
            outcome,
            MoveOutcome::Committed {
                id: "a".into(),
                start: 570,
                end: 630
            }
        );
        let block = store.block("a").unwrap();
        assert_eq!((block.start, block.end), (570, 630));
        assert_eq!(mover.state(), &DragState::Idle);
    }

    #[test]
    fn overlapping_move_is_reverted() {
        let mut store = store_with(vec![task_block("a", 540, 600), task_block("b", 630, 690)]);
        let before = store.clone();
        let mut mover = Repositioner::new(window());

        mover.begin(&store, "a").unwrap();
        mover.drag(60);
        let outcome = mover.end(&mut store);

        assert!(matches!(outcome, MoveOutcome::Reverted { start: 540, end: 600, .. }));
        assert_eq!(store, before);
    }

    #[test]
    fn manual_move_may_touch_neighbors_without_buffer() {
        let mut store = store_with(vec![task_block("a", 540, 600), task_block("b", 630, 690)]);
        let mut mover = Repositioner::new(window());

        let outcome = mover.move_to(&mut store, "a", 570).unwrap();
        assert!(outcome.is_committed());
        assert_eq!(store.block("a").unwrap().end, 630);
    }

    #[test]
    fn drag_clamps_to_day_window() {
        let store = store_with(vec![task_block("a", 600, 660)]);
        let mut mover = Repositioner::new(window());
        mover.begin(&store, "a").unwrap();

        assert_eq!(mover.drag(-500), Some(540));
        assert_eq!(mover.drag(500), Some(660));
        assert_eq!(mover.drag(-2), Some(600));
    }

    #[test]
    fn fixed_and_unknown_blocks_are_refused() {
        let store = store_with(vec![Block::fixed("lunch", BlockKind::Break, "Lunch", 720, 780)]);
        let mut mover = Repositioner::new(window());

        assert_eq!(mover.begin(&store, "lunch"), Err(MoveRejection::Fixed("lunch".into())));
        assert_eq!(mover.begin(&store, "nope"), Err(MoveRejection::NotFound("nope".into())));
        assert_eq!(mover.state(), &DragState::Idle);
    }

    #[test]
    fn overlapping_a_fixed_block_is_reverted() {
        let mut store = store_with(vec![
            task_block("a", 540, 600),
            Block::fixed("ev", BlockKind::Calendar, "Call", 600, 630),
        ]);
        let mut mover = Repositioner::new(window());

        let outcome = mover.move_to(&mut store, "a", 585).unwrap();
        assert!(!outcome.is_committed());
        assert_eq!(store.block("a").unwrap().start, 540);
    }

    #[test]
    fn second_gesture_is_refused_until_end() {
        let mut store = store_with(vec![task_block("a", 540, 600), task_block("b", 630, 660)]);
        let mut mover = Repositioner::new(window());

        mover.begin(&store, "a").unwrap();
        assert_eq!(mover.begin(&store, "b"), Err(MoveRejection::AlreadyDragging("a".into())));
        mover.cancel();
        assert_eq!(mover.end(&mut store), MoveOutcome::Idle);
        assert!(mover.begin(&store, "b").is_ok());
    }

    #[test]
    fn drag_without_gesture_is_ignored() {
        let mut mover = Repositioner::new(window());
        assert_eq!(mover.drag(10), None);
    }
}
