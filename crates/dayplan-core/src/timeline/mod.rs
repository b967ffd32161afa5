//! Day timeline primitives.
//!
//! This module provides:
//! - Free-interval bookkeeping for a day window
//! - Deterministic task ranking

mod interval;
mod rank;

pub use interval::{Interval, IntervalSet};
pub use rank::{rank_tasks, RankStrategy, TaskRanker};
