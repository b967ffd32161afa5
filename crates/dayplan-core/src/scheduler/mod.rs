//! Block allocator.
//!
//! Places ranked tasks into the free time of a day:
//! - Fixed blocks (breaks, imported events) are clipped to the day window
//!   and carved out of the free intervals first
//! - Tasks are taken in rank order and placed first-fit, never backtracking
//! - Splittable tasks are cut into chunks; whatever does not fit is reported
//!   as unplaced
//!
//! The allocator is a pure function of its inputs: identical tasks, settings
//! and fixed blocks always yield the same placement.

use serde::{Deserialize, Serialize};

use crate::clock::{normalize_duration, GRID_MINUTES};
use crate::error::ConfigError;
use crate::schedule::{Block, DayWindow, Unplaced};
use crate::storage::Settings;
use crate::task::Task;
use crate::timeline::{IntervalSet, RankStrategy, TaskRanker};

/// Smallest chunk a split task is cut into, unless less remains.
pub const DEFAULT_MIN_CHUNK_MINUTES: u32 = 30;

/// Largest chunk handed to a split task whose remainder does not fit.
pub const DEFAULT_MAX_CHUNK_MINUTES: u32 = 60;

/// Marker appended to the title of a chunk that has more parts after it.
pub const CONTINUATION_SUFFIX: &str = " (cont.)";

/// Allocator configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Schedulable hours
    pub window: DayWindow,
    /// Minutes kept free after every occupied region
    pub buffer_minutes: u32,
    /// Task ordering policy
    pub strategy: RankStrategy,
    /// Smallest split chunk
    pub min_chunk_minutes: u32,
    /// Largest split chunk when the remainder does not fit
    pub max_chunk_minutes: u32,
}

impl SchedulerConfig {
    /// Build from settings.
    ///
    /// # Errors
    /// Fails when the settings do not validate; allocation must not run then.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let window = settings.validate()?;
        Ok(Self {
            window,
            buffer_minutes: settings.buffer_minutes,
            strategy: settings.strategy,
            min_chunk_minutes: DEFAULT_MIN_CHUNK_MINUTES,
            max_chunk_minutes: DEFAULT_MAX_CHUNK_MINUTES,
        })
    }
}

/// Result of one allocation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Fixed and placed blocks sorted by start
    pub blocks: Vec<Block>,
    /// Tasks, or remainders of split tasks, that found no room
    pub unplaced: Vec<Unplaced>,
}

impl Allocation {
    /// Minutes placed for a task across all of its blocks.
    pub fn placed_minutes(&self, task_id: &str) -> u32 {
        self.blocks
            .iter()
            .filter(|b| b.task_id.as_deref() == Some(task_id))
            .map(Block::duration_minutes)
            .sum()
    }

    /// Unplaced remainder for a task, zero when fully placed.
    pub fn unplaced_minutes(&self, task_id: &str) -> u32 {
        self.unplaced
            .iter()
            .filter(|u| u.task_id == task_id)
            .map(|u| u.remaining_minutes)
            .sum()
    }
}

/// First-fit block allocator
pub struct Allocator {
    config: SchedulerConfig,
}

impl Allocator {
    /// Create with custom config
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Allocate tasks around the given fixed blocks.
    ///
    /// # Arguments
    /// * `tasks` - Task list; completed tasks are skipped
    /// * `fixed` - Breaks and imported events; non-fixed entries are ignored
    ///
    /// # Returns
    /// Fixed blocks (clipped to the window) plus placed blocks, and the
    /// unplaced remainders
    pub fn allocate(&self, tasks: &[Task], fixed: &[Block]) -> Allocation {
        let window = self.config.window;
        let mut free =
            IntervalSet::new(window.start, window.end).with_buffer(self.config.buffer_minutes);
        let mut allocation = Allocation::default();

        for block in fixed.iter().filter(|b| b.fixed) {
            match window.clip(block.start, block.end) {
                Some((start, end)) => {
                    free.carve(start, end);
                    let mut clipped = block.clone();
                    clipped.start = start;
                    clipped.end = end;
                    allocation.blocks.push(clipped);
                }
                None => {
                    tracing::warn!(block = %block.id, "fixed block lies outside the day window, dropped");
                }
            }
        }

        let ranked = TaskRanker::new(self.config.strategy).rank(tasks);
        for task in ranked {
            if task.splittable {
                self.place_split(task, &mut free, &mut allocation);
            } else {
                self.place_whole(task, &mut free, &mut allocation);
            }
        }

        allocation
            .blocks
            .sort_by(|a, b| a.start.cmp(&b.start).then_with(|| b.fixed.cmp(&a.fixed)));

        tracing::info!(
            placed = allocation.blocks.iter().filter(|b| !b.fixed).count(),
            unplaced = allocation.unplaced.len(),
            free_minutes = free.free_minutes(),
            "allocation finished"
        );
        allocation
    }

    fn place_whole(&self, task: &Task, free: &mut IntervalSet, allocation: &mut Allocation) {
        let duration = normalize_duration(task.duration_minutes);
        match free.first_gap_of_size(duration) {
            Some(start) => {
                let end = start + duration;
                free.carve(start, end);
                tracing::debug!(task = %task.id, start, end, "placed task");
                allocation
                    .blocks
                    .push(Block::for_task(task, task.title.clone(), start, end));
            }
            None => {
                tracing::debug!(task = %task.id, duration, "no gap for task");
                allocation.unplaced.push(unplaced(task, duration));
            }
        }
    }

    /// Cut a splittable task into chunks.
    ///
    /// Each chunk goes to the earliest position that can take at least the
    /// smallest chunk. There the whole remainder is placed when it fits;
    /// otherwise the largest chunk when the room allows it, else the room
    /// itself (floored to the grid). Chunks are sized from the room at the
    /// earliest position, so a short early gap is filled before a later gap
    /// that could hold the whole task.
    fn place_split(&self, task: &Task, free: &mut IntervalSet, allocation: &mut Allocation) {
        let mut remaining = normalize_duration(task.duration_minutes);
        let max_chunk = self.config.max_chunk_minutes.max(GRID_MINUTES);

        while remaining > 0 {
            let min_chunk = self
                .config
                .min_chunk_minutes
                .clamp(GRID_MINUTES, max_chunk)
                .min(remaining);
            let Some(start) = free.first_gap_of_size(min_chunk) else {
                tracing::debug!(task = %task.id, remaining, "no gap for remaining chunk");
                allocation.unplaced.push(unplaced(task, remaining));
                return;
            };

            let room = free.room_at(start);
            let chunk = if room >= remaining {
                remaining
            } else if room >= max_chunk {
                max_chunk
            } else {
                room / GRID_MINUTES * GRID_MINUTES
            };

            let end = start + chunk;
            free.carve(start, end);

            let title = if remaining > chunk {
                format!("{}{}", task.title, CONTINUATION_SUFFIX)
            } else {
                task.title.clone()
            };
            tracing::debug!(task = %task.id, start, end, remaining, "placed chunk");
            allocation.blocks.push(Block::for_task(task, title, start, end));
            remaining -= chunk;
        }
    }
}

fn unplaced(task: &Task, remaining_minutes: u32) -> Unplaced {
    Unplaced {
        task_id: task.id.clone(),
        title: task.title.clone(),
        remaining_minutes,
    }
}

/// Validate settings and allocate in one step.
///
/// # Errors
/// Returns the configuration error and performs no allocation when the
/// settings are invalid.
pub fn generate_schedule(
    tasks: &[Task],
    settings: &Settings,
    fixed: &[Block],
) -> Result<Allocation, ConfigError> {
    let config = SchedulerConfig::from_settings(settings)?;
    Ok(Allocator::with_config(config).allocate(tasks, fixed))
}
