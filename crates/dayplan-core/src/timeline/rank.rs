//! Deterministic task ordering.
//!
//! Two strategies are supported:
//! - deadline first: deadline, then priority, then creation time
//! - priority first: priority, then deadline, then creation time
//!
//! Tasks without a deadline sort after every task that has one. A final
//! comparison on id makes the order total, so ranking the same input twice
//! always yields the same sequence.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::task::Task;

/// Ordering policy for pending tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RankStrategy {
    #[default]
    DeadlineFirst,
    PriorityFirst,
}

impl RankStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankStrategy::DeadlineFirst => "deadline_first",
            RankStrategy::PriorityFirst => "priority_first",
        }
    }
}

impl fmt::Display for RankStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "deadline_first" | "deadline" => Ok(RankStrategy::DeadlineFirst),
            "priority_first" | "priority" => Ok(RankStrategy::PriorityFirst),
            other => Err(format!("unknown strategy '{other}'")),
        }
    }
}

/// Orders the pending tasks of a day.
pub struct TaskRanker {
    strategy: RankStrategy,
}

impl TaskRanker {
    pub fn new(strategy: RankStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> RankStrategy {
        self.strategy
    }

    /// Return the incomplete tasks in scheduling order.
    pub fn rank<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        let mut pending: Vec<&Task> = tasks.iter().filter(|t| !t.completed).collect();
        pending.sort_by(|a, b| self.compare(a, b));
        pending
    }

    /// Total order between two tasks under the configured strategy.
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let by_deadline = || deadline_key(a).cmp(&deadline_key(b));
        // higher weight first
        let by_priority = || b.priority.weight().cmp(&a.priority.weight());

        let primary = match self.strategy {
            RankStrategy::DeadlineFirst => by_deadline().then_with(by_priority),
            RankStrategy::PriorityFirst => by_priority().then_with(by_deadline),
        };

        primary
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// `None` sorts after every concrete instant.
fn deadline_key(task: &Task) -> (bool, Option<NaiveDateTime>) {
    let instant = task.deadline.map(|d| d.instant());
    (instant.is_none(), instant)
}

/// Rank with a one-off ranker.
pub fn rank_tasks(tasks: &[Task], strategy: RankStrategy) -> Vec<&Task> {
    TaskRanker::new(strategy).rank(tasks)
}
