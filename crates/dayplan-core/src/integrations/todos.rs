//! External to-do items.
//!
//! A to-do payload is a JSON array of
//! `{id, title, notes?, due?, duration_minutes?}`. Each item becomes a task
//! whose `source_id` is the external id, so a second import of the same
//! item updates the task instead of adding another one.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ImportError;
use crate::task::{Deadline, Priority, Task};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

impl TodoRecord {
    /// Minutes for this item: explicit field, then title, then notes.
    pub fn duration_hint(&self) -> Option<u32> {
        self.duration_minutes
            .filter(|m| *m > 0)
            .or_else(|| parse_duration_text(&self.title))
            .or_else(|| self.notes.as_deref().and_then(parse_duration_text))
    }

    /// Build a task for this item.
    ///
    /// # Errors
    /// Fails when `due` is present but not a recognized date or datetime.
    pub fn to_task(&self, default_minutes: u32) -> Result<Task, ImportError> {
        let deadline = match &self.due {
            Some(raw) => Some(parse_due(raw).ok_or_else(|| ImportError::InvalidDue {
                id: self.id.clone(),
                value: raw.clone(),
            })?),
            None => None,
        };

        let minutes = self.duration_hint().unwrap_or(default_minutes);
        let mut task = Task::new(self.title.trim(), minutes, Priority::default());
        task.deadline = deadline;
        task.source_id = Some(self.id.clone());
        Ok(task)
    }
}

/// Parse a to-do payload.
pub fn parse_todos(json: &str) -> Result<Vec<TodoRecord>, ImportError> {
    Ok(serde_json::from_str(json)?)
}

/// Convert records to tasks, skipping items with an unreadable due date.
pub fn todos_to_tasks(records: &[TodoRecord], default_minutes: u32) -> Vec<Task> {
    records
        .iter()
        .filter_map(|record| match record.to_task(default_minutes) {
            Ok(task) => Some(task),
            Err(e) => {
                tracing::warn!(todo = %record.id, error = %e, "skipping to-do");
                None
            }
        })
        .collect()
}

/// Interpret a due value.
///
/// `YYYY-MM-DD` is a date-only deadline. RFC 3339 values keep their wall
/// clock time; the offset is dropped, not converted. Naive datetimes are
/// accepted as well.
pub fn parse_due(raw: &str) -> Option<Deadline> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Deadline::on(date));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        let local = dt.naive_local();
        return Some(Deadline::at(local.date(), local.time()));
    }
    Deadline::parse(raw)
}

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:(\d+(?:\.\d+)?)\s*h(?:ours?|rs?)?(?:\s*(\d+)\s*m(?:in(?:ute)?s?)?)?|(\d+)\s*m(?:in(?:ute)?s?)?)\b",
        )
        .expect("duration pattern is valid")
    })
}

/// Find a duration such as `90m`, `45 min`, `2h`, `1h30m` or `1.5h` in free text.
///
/// Returns whole minutes, or `None` when no positive duration is mentioned.
pub fn parse_duration_text(text: &str) -> Option<u32> {
    let caps = duration_pattern().captures(text)?;

    let minutes = if let Some(hours) = caps.get(1) {
        let hours: f64 = hours.as_str().parse().ok()?;
        let extra: f64 = match caps.get(2) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0.0,
        };
        (hours * 60.0 + extra).round()
    } else {
        caps.get(3)?.as_str().parse::<f64>().ok()?
    };

    if minutes >= 1.0 && minutes <= f64::from(u32::MAX) {
        Some(minutes as u32)
    } else {
        None
    }
}
