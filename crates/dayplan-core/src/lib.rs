//! # Dayplan Core Library
//!
//! This library provides the scheduling logic for `dayplan`, a single-day
//! task block planner. It follows a CLI-first layout: everything the
//! `dayplan` binary does is available here as plain function calls.
//!
//! ## Architecture
//!
//! - **Timeline**: free-interval bookkeeping and the task ordering policy
//! - **Scheduler**: greedy first-fit allocation of ranked tasks into free
//!   time, splitting tasks into chunks where allowed
//! - **Schedule**: the day's blocks, owned by a single [`ScheduleStore`], and
//!   the drag [`Repositioner`] for manual moves
//! - **Storage**: SQLite persistence for tasks and schedules, TOML settings
//! - **Integrations / Calendar**: JSON imports and iCalendar export
//!
//! ## Key Components
//!
//! - [`IntervalSet`]: free ranges of the day with buffer-aware gap search
//! - [`TaskRanker`]: deadline-first or priority-first ordering
//! - [`Allocator`]: `(tasks, settings, fixed blocks) -> Allocation`
//! - [`PlanDb`]: task and schedule persistence
//! - [`Settings`]: day window, buffer, strategy and break configuration

pub mod calendar;
pub mod clock;
pub mod error;
pub mod integrations;
pub mod schedule;
pub mod scheduler;
pub mod storage;
pub mod task;
pub mod timeline;

pub use clock::Minute;
pub use error::{ConfigError, CoreError, DatabaseError, ImportError, Result, ValidationError};
pub use schedule::{
    Block, BlockKind, DayWindow, DragState, MoveOutcome, MoveRejection, Repositioner,
    ScheduleSnapshot, ScheduleStore, Unplaced,
};
pub use scheduler::{generate_schedule, Allocation, Allocator, SchedulerConfig};
pub use storage::{BreakWindow, PlanDb, Settings};
pub use task::{Deadline, Priority, Task, TaskEdit};
pub use timeline::{Interval, IntervalSet, RankStrategy, TaskRanker};
