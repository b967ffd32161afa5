//! Schedule types: blocks on a day timeline and the store that owns them.

mod reposition;
mod store;

pub use reposition::{DragState, MoveOutcome, MoveRejection, Repositioner};
pub use store::{ScheduleSnapshot, ScheduleStore};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::clock::{format_hhmm, Minute};
use crate::error::ConfigError;
use crate::task::Task;
use crate::timeline::Interval;

/// Shortest day window accepted by validation.
pub const MIN_DAY_WINDOW_MINUTES: u32 = 60;

/// The schedulable hours of a day, `[start, end)` in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub start: Minute,
    pub end: Minute,
}

impl DayWindow {
    /// Build a validated window.
    ///
    /// # Errors
    /// Fails when `end <= start` or the window is shorter than an hour.
    pub fn new(start: Minute, end: Minute) -> Result<Self, ConfigError> {
        if end <= start {
            return Err(ConfigError::InvertedDayWindow { start, end });
        }
        let minutes = end - start;
        if minutes < MIN_DAY_WINDOW_MINUTES {
            return Err(ConfigError::DayWindowTooShort {
                start,
                end,
                minutes,
                min: MIN_DAY_WINDOW_MINUTES,
            });
        }
        Ok(Self { start, end })
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn contains(&self, start: Minute, end: Minute) -> bool {
        self.start <= start && start < end && end <= self.end
    }

    /// Intersect a range with the window. `None` when nothing remains.
    pub fn clip(&self, start: Minute, end: Minute) -> Option<(Minute, Minute)> {
        let s = start.max(self.start);
        let e = end.min(self.end);
        (s < e).then_some((s, e))
    }
}

/// Category label of a block.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// Work placed by the allocator
    Task,
    /// Configured break window
    Break,
    /// Imported calendar event
    Calendar,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Task => "task",
            BlockKind::Break => "break",
            BlockKind::Calendar => "calendar",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "task" => Some(BlockKind::Task),
            "break" => Some(BlockKind::Break),
            "calendar" => Some(BlockKind::Calendar),
            _ => None,
        }
    }
}

/// A placed or fixed time range on the day's timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub id: String,
    pub kind: BlockKind,
    /// Originating task; `None` for breaks and imported events
    pub task_id: Option<String>,
    pub title: String,
    pub start: Minute,
    pub end: Minute,
    /// Fixed blocks survive regeneration and cannot be dragged
    pub fixed: bool,
    pub done: bool,
}

impl Block {
    /// A block placed for a task.
    pub fn for_task(task: &Task, title: String, start: Minute, end: Minute) -> Self {
        Self {
            id: format!("block-{}", uuid::Uuid::new_v4()),
            kind: BlockKind::Task,
            task_id: Some(task.id.clone()),
            title,
            start,
            end,
            fixed: false,
            done: false,
        }
    }

    /// An immovable block that is not tied to a task.
    pub fn fixed(
        id: impl Into<String>,
        kind: BlockKind,
        title: impl Into<String>,
        start: Minute,
        end: Minute,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            task_id: None,
            title: title.into(),
            start,
            end,
            fixed: true,
            done: false,
        }
    }

    /// Get duration in minutes
    pub fn duration_minutes(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }

    pub fn overlaps(&self, start: Minute, end: Minute) -> bool {
        self.start < end && start < self.end
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{} {}",
            format_hhmm(self.start),
            format_hhmm(self.end),
            self.title
        )
    }
}

/// Work the allocator could not fit into the day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Unplaced {
    pub task_id: String,
    pub title: String,
    pub remaining_minutes: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_window_validation() {
        assert!(DayWindow::new(540, 1020).is_ok());
        assert!(DayWindow::new(540, 600).is_ok());
        assert!(matches!(
            DayWindow::new(600, 540),
            Err(ConfigError::InvertedDayWindow { .. })
        ));
        assert!(matches!(
            DayWindow::new(540, 540),
            Err(ConfigError::InvertedDayWindow { .. })
        ));
        assert!(matches!(
            DayWindow::new(540, 595),
            Err(ConfigError::DayWindowTooShort { minutes: 55, .. })
        ));
    }

    #[test]
    fn day_window_clip() {
        let window = DayWindow::new(540, 720).unwrap();
        assert_eq!(window.clip(500, 600), Some((540, 600)));
        assert_eq!(window.clip(700, 800), Some((700, 720)));
        assert_eq!(window.clip(720, 800), None);
        assert_eq!(window.clip(600, 600), None);
        assert!(window.contains(540, 720));
        assert!(!window.contains(530, 600));
    }

    #[test]
    fn block_display_uses_wall_clock() {
        let block = Block::fixed("lunch", BlockKind::Break, "Lunch", 720, 780);
        assert_eq!(block.to_string(), "12:00-13:00 Lunch");
        assert_eq!(block.duration_minutes(), 60);
        assert!(block.overlaps(750, 800));
        assert!(!block.overlaps(780, 800));
    }

    #[test]
    fn block_kind_serializes_lowercase() {
        let block = Block::fixed("ev-1", BlockKind::Calendar, "Standup", 600, 615);
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["kind"], "calendar");
        assert_eq!(json["task_id"], serde_json::Value::Null);
        assert_eq!(BlockKind::parse("break"), Some(BlockKind::Break));
    }
}
