//! Task types: the user-defined work items the allocator places into a day.
//!
//! Durations are kept on the 5-minute grid from creation onward; every edit
//! goes back through [`normalize_duration`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::clock::normalize_duration;

/// Task importance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Ranking weight: high=3, medium=2, low=1.
    pub fn weight(&self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "h" | "3" => Ok(Priority::High),
            "medium" | "med" | "m" | "2" => Ok(Priority::Medium),
            "low" | "l" | "1" => Ok(Priority::Low),
            other => Err(format!("unknown priority '{other}' (expected high, medium or low)")),
        }
    }
}

/// A calendar-date deadline with an optional time of day.
///
/// A date without a time means end of day (23:59) when compared.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Deadline {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
}

impl Deadline {
    pub fn on(date: NaiveDate) -> Self {
        Self { date, time: None }
    }

    pub fn at(date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            date,
            time: Some(time),
        }
    }

    /// Instant used for ordering.
    pub fn instant(&self) -> NaiveDateTime {
        let time = self
            .time
            .or_else(|| NaiveTime::from_hms_opt(23, 59, 0))
            .unwrap_or_default();
        self.date.and_time(time)
    }

    /// Parse `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS]` or `YYYY-MM-DD HH:MM`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Some(Self::on(date));
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(Self::at(dt.date(), dt.time()));
            }
        }
        None
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.time {
            Some(time) => write!(f, "{} {}", self.date, time.format("%H:%M")),
            None => write!(f, "{}", self.date),
        }
    }
}

/// A unit of work to be scheduled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Unique identifier
    pub id: String,
    pub title: String,
    /// Required minutes, always a positive multiple of 5
    pub duration_minutes: u32,
    #[serde(default)]
    pub priority: Priority,
    /// Whether the work may be spread over several non-contiguous blocks
    #[serde(default)]
    pub splittable: bool,
    #[serde(default)]
    pub deadline: Option<Deadline>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    /// External id for items imported from another source
    #[serde(default)]
    pub source_id: Option<String>,
}

impl Task {
    /// Create a new task with a generated id.
    pub fn new(title: impl Into<String>, duration_minutes: u32, priority: Priority) -> Self {
        Self {
            id: format!("task-{}", uuid::Uuid::new_v4()),
            title: title.into(),
            duration_minutes: normalize_duration(duration_minutes),
            priority,
            splittable: false,
            deadline: None,
            completed: false,
            created_at: Utc::now(),
            source_id: None,
        }
    }

    pub fn splittable(mut self, splittable: bool) -> Self {
        self.splittable = splittable;
        self
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Apply an edit, keeping the duration on the grid.
    pub fn apply(&mut self, edit: TaskEdit) {
        if let Some(title) = edit.title {
            self.title = title;
        }
        if let Some(minutes) = edit.duration_minutes {
            self.duration_minutes = normalize_duration(minutes);
        }
        if let Some(priority) = edit.priority {
            self.priority = priority;
        }
        if let Some(splittable) = edit.splittable {
            self.splittable = splittable;
        }
        if let Some(deadline) = edit.deadline {
            self.deadline = deadline;
        }
    }

    /// Mark the task completed. Returns false if it already was.
    pub fn complete(&mut self) -> bool {
        !std::mem::replace(&mut self.completed, true)
    }
}

/// Partial update for [`Task::apply`].
///
/// `deadline: Some(None)` clears an existing deadline.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub duration_minutes: Option<u32>,
    pub priority: Option<Priority>,
    pub splittable: Option<bool>,
    pub deadline: Option<Option<Deadline>>,
}
