//! SQLite-based storage for tasks and per-day schedules.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use crate::error::{CoreError, DatabaseError};
use crate::schedule::{Block, BlockKind, ScheduleStore, Unplaced};
use crate::task::{Deadline, Priority, Task};

// === Helper Functions ===

/// Parse priority from database string
fn parse_priority(priority_str: &str) -> Priority {
    priority_str.parse().unwrap_or_default()
}

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Format deadline for database storage
fn format_deadline(deadline: Option<&Deadline>) -> Option<String> {
    deadline.map(|d| match d.time {
        Some(time) => format!("{}T{}", d.date, time.format("%H:%M")),
        None => d.date.to_string(),
    })
}

/// Build a Task from a database row
fn row_to_task(row: &rusqlite::Row) -> Result<Task, rusqlite::Error> {
    let priority_str: String = row.get(3)?;
    let deadline_str: Option<String> = row.get(5)?;
    let created_at_str: String = row.get(7)?;
    let duration: i64 = row.get(2)?;

    let deadline = match deadline_str {
        Some(raw) => Some(Deadline::parse(&raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                format!("invalid deadline '{raw}'").into(),
            )
        })?),
        None => None,
    };

    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        duration_minutes: u32::try_from(duration).unwrap_or(0),
        priority: parse_priority(&priority_str),
        splittable: row.get(4)?,
        deadline,
        completed: row.get(6)?,
        created_at: parse_datetime_fallback(&created_at_str),
        source_id: row.get(8)?,
    })
}

/// Build a Block from a database row
fn row_to_block(row: &rusqlite::Row) -> Result<Block, rusqlite::Error> {
    let kind_str: String = row.get(1)?;
    let kind = BlockKind::parse(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unknown block kind '{kind_str}'").into(),
        )
    })?;

    Ok(Block {
        id: row.get(0)?,
        kind,
        task_id: row.get(2)?,
        title: row.get(3)?,
        start: row.get(4)?,
        end: row.get(5)?,
        fixed: row.get(6)?,
        done: row.get(7)?,
    })
}

const TASK_COLUMNS: &str =
    "id, title, duration_minutes, priority, splittable, deadline, completed, created_at, source_id";

/// SQLite database for plan storage.
///
/// Stores tasks and, per date, the placed blocks and unplaced remainders.
pub struct PlanDb {
    conn: Connection,
}

impl PlanDb {
    /// Open the plan database at `<data dir>/dayplan.db`.
    ///
    /// Creates tables if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("dayplan.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tasks (
                id               TEXT PRIMARY KEY,
                title            TEXT NOT NULL,
                duration_minutes INTEGER NOT NULL,
                priority         TEXT NOT NULL DEFAULT 'medium',
                splittable       INTEGER NOT NULL DEFAULT 0,
                deadline         TEXT,
                completed        INTEGER NOT NULL DEFAULT 0,
                created_at       TEXT NOT NULL,
                source_id        TEXT
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_tasks_source_unique
                ON tasks(source_id) WHERE source_id IS NOT NULL;

            CREATE TABLE IF NOT EXISTS blocks (
                id           TEXT PRIMARY KEY,
                date         TEXT NOT NULL,
                kind         TEXT NOT NULL,
                task_id      TEXT,
                title        TEXT NOT NULL,
                start_minute INTEGER NOT NULL,
                end_minute   INTEGER NOT NULL,
                fixed        INTEGER NOT NULL DEFAULT 0,
                done         INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_blocks_date ON blocks(date);

            CREATE TABLE IF NOT EXISTS unplaced (
                date              TEXT NOT NULL,
                position          INTEGER NOT NULL,
                task_id           TEXT NOT NULL,
                title             TEXT NOT NULL,
                remaining_minutes INTEGER NOT NULL,
                PRIMARY KEY (date, position)
            );",
        )
    }

    // === Task CRUD ===

    /// Insert a new task.
    pub fn create_task(&self, task: &Task) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO tasks (id, title, duration_minutes, priority, splittable, deadline, completed, created_at, source_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                task.id,
                task.title,
                task.duration_minutes,
                task.priority.as_str(),
                task.splittable,
                format_deadline(task.deadline.as_ref()),
                task.completed,
                task.created_at.to_rfc3339(),
                task.source_id,
            ],
        )?;
        Ok(())
    }

    /// Get a task by id.
    pub fn get_task(&self, id: &str) -> Result<Option<Task>, rusqlite::Error> {
        self.conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                row_to_task,
            )
            .optional()
    }

    /// List all tasks in creation order.
    ///
    /// Rows that cannot be decoded are skipped with a warning.
    pub fn list_tasks(&self) -> Result<Vec<Task>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at ASC, id ASC"
        ))?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            match row_to_task(row) {
                Ok(task) => tasks.push(task),
                Err(e) => {
                    let id: Option<String> = row.get(0).ok();
                    tracing::warn!(task = ?id, error = %e, "skipping malformed task row");
                }
            }
        }
        Ok(tasks)
    }

    /// List tasks, falling back to an empty list when the table is unreadable.
    pub fn list_tasks_or_empty(&self) -> Vec<Task> {
        self.list_tasks().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read tasks, continuing with none");
            Vec::new()
        })
    }

    /// Overwrite a stored task. Returns false when the id is unknown.
    pub fn update_task(&self, task: &Task) -> Result<bool, rusqlite::Error> {
        let changed = self.conn.execute(
            "UPDATE tasks SET title = ?2, duration_minutes = ?3, priority = ?4, splittable = ?5,
                              deadline = ?6, completed = ?7, source_id = ?8
             WHERE id = ?1",
            params![
                task.id,
                task.title,
                task.duration_minutes,
                task.priority.as_str(),
                task.splittable,
                format_deadline(task.deadline.as_ref()),
                task.completed,
                task.source_id,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Mark a task completed. Returns false when it is unknown or already done.
    pub fn complete_task(&self, id: &str) -> Result<bool, rusqlite::Error> {
        let changed = self.conn.execute(
            "UPDATE tasks SET completed = 1 WHERE id = ?1 AND completed = 0",
            params![id],
        )?;
        Ok(changed > 0)
    }

    /// Delete a task together with its blocks and unplaced entries on every date.
    ///
    /// Returns false when the task did not exist.
    pub fn delete_task(&self, id: &str) -> Result<bool, rusqlite::Error> {
        self.in_transaction(|conn| {
            conn.execute("DELETE FROM blocks WHERE task_id = ?1", params![id])?;
            conn.execute("DELETE FROM unplaced WHERE task_id = ?1", params![id])?;
            let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
    }

    /// Upsert an imported task, deduplicated by its source id.
    ///
    /// If a task with the same `source_id` exists its title, duration and
    /// deadline are refreshed while the local id, priority, split flag and
    /// completion state are kept. Otherwise the task is inserted.
    ///
    /// Returns the id of the created or updated task.
    pub fn upsert_task_from_source(&self, task: &Task) -> Result<String, rusqlite::Error> {
        if let Some(source_id) = &task.source_id {
            let existing_id: Option<String> = self
                .conn
                .query_row(
                    "SELECT id FROM tasks WHERE source_id = ?1",
                    params![source_id],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(existing_id) = existing_id {
                self.conn.execute(
                    "UPDATE tasks SET title = ?2, duration_minutes = ?3, deadline = ?4 WHERE id = ?1",
                    params![
                        existing_id,
                        task.title,
                        task.duration_minutes,
                        format_deadline(task.deadline.as_ref()),
                    ],
                )?;
                return Ok(existing_id);
            }
        }

        self.create_task(task)?;
        Ok(task.id.clone())
    }

    // === Schedules ===

    /// Replace the stored schedule for the store's date in a single transaction.
    pub fn save_schedule(&self, store: &ScheduleStore) -> Result<(), rusqlite::Error> {
        let date = store.date().to_string();
        self.in_transaction(|conn| {
            conn.execute("DELETE FROM blocks WHERE date = ?1", params![date])?;
            conn.execute("DELETE FROM unplaced WHERE date = ?1", params![date])?;

            for block in store.blocks() {
                conn.execute(
                    "INSERT INTO blocks (id, date, kind, task_id, title, start_minute, end_minute, fixed, done)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        block.id,
                        date,
                        block.kind.as_str(),
                        block.task_id,
                        block.title,
                        block.start,
                        block.end,
                        block.fixed,
                        block.done,
                    ],
                )?;
            }
            for (position, entry) in store.unplaced().iter().enumerate() {
                conn.execute(
                    "INSERT INTO unplaced (date, position, task_id, title, remaining_minutes)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        date,
                        position as i64,
                        entry.task_id,
                        entry.title,
                        entry.remaining_minutes,
                    ],
                )?;
            }
            Ok(())
        })?;
        tracing::debug!(%date, blocks = store.blocks().len(), "schedule saved");
        Ok(())
    }

    /// Load the schedule stored for `date`; empty when none was saved.
    pub fn load_schedule(&self, date: NaiveDate) -> Result<ScheduleStore, rusqlite::Error> {
        let date_str = date.to_string();

        let mut stmt = self.conn.prepare(
            "SELECT id, kind, task_id, title, start_minute, end_minute, fixed, done
             FROM blocks WHERE date = ?1 ORDER BY start_minute ASC",
        )?;
        let mut rows = stmt.query(params![date_str])?;
        let mut blocks = Vec::new();
        while let Some(row) = rows.next()? {
            match row_to_block(row) {
                Ok(block) => blocks.push(block),
                Err(e) => tracing::warn!(error = %e, "skipping malformed block row"),
            }
        }

        let mut stmt = self.conn.prepare(
            "SELECT task_id, title, remaining_minutes FROM unplaced
             WHERE date = ?1 ORDER BY position ASC",
        )?;
        let unplaced = stmt
            .query_map(params![date_str], |row| {
                Ok(Unplaced {
                    task_id: row.get(0)?,
                    title: row.get(1)?,
                    remaining_minutes: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ScheduleStore::from_parts(date, blocks, unplaced))
    }

    /// Run `f` inside `BEGIN IMMEDIATE` / `COMMIT`, rolling back on error.
    fn in_transaction<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    ) -> Result<T, rusqlite::Error> {
        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        match f(&self.conn) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err)
            }
        }
    }
}
