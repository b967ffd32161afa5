//! Task management commands for CLI.

use clap::Subcommand;
use dayplan_core::{Deadline, PlanDb, Priority, Settings, Task, TaskEdit};

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task
    Add {
        /// Task title
        title: String,
        /// Required minutes (default: settings.default_task_minutes)
        #[arg(long)]
        minutes: Option<u32>,
        /// high, medium or low
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Allow the task to be split into several blocks
        #[arg(long)]
        splittable: bool,
        /// Deadline: YYYY-MM-DD or YYYY-MM-DDTHH:MM
        #[arg(long)]
        deadline: Option<String>,
    },
    /// List tasks
    List {
        /// Include completed tasks
        #[arg(long)]
        all: bool,
    },
    /// Edit a task
    Edit {
        /// Task ID (or unique prefix)
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        minutes: Option<u32>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        splittable: Option<bool>,
        /// New deadline, or "none" to clear it
        #[arg(long)]
        deadline: Option<String>,
    },
    /// Mark a task completed
    Complete {
        /// Task ID (or unique prefix)
        id: String,
    },
    /// Delete a task and its scheduled blocks
    Delete {
        /// Task ID (or unique prefix)
        id: String,
    },
}

fn parse_deadline(raw: &str) -> Result<Deadline, String> {
    Deadline::parse(raw).ok_or_else(|| format!("Invalid deadline '{raw}' (expected YYYY-MM-DD or YYYY-MM-DDTHH:MM)"))
}

fn resolve_task(db: &PlanDb, needle: &str) -> Result<Task, Box<dyn std::error::Error>> {
    if let Some(task) = db.get_task(needle)? {
        return Ok(task);
    }
    let mut matches: Vec<Task> = db
        .list_tasks()?
        .into_iter()
        .filter(|t| t.id.starts_with(needle))
        .collect();
    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => Err(format!("Task not found: {needle}").into()),
        n => Err(format!("Task id '{needle}' is ambiguous ({n} matches)").into()),
    }
}

fn describe(task: &Task) -> String {
    let mut line = format!(
        "{}  {:>4}m  {:<6}  {}",
        task.id, task.duration_minutes, task.priority, task.title
    );
    if task.splittable {
        line.push_str("  [split]");
    }
    if let Some(deadline) = &task.deadline {
        line.push_str(&format!("  due {deadline}"));
    }
    if task.completed {
        line.push_str("  (done)");
    }
    line
}

pub fn run(action: TaskAction, json: bool) -> CmdResult {
    let db = PlanDb::open()?;

    match action {
        TaskAction::Add {
            title,
            minutes,
            priority,
            splittable,
            deadline,
        } => {
            let minutes = match minutes {
                Some(m) => m,
                None => Settings::load_or_default().default_task_minutes,
            };
            let mut task = Task::new(title, minutes, priority).splittable(splittable);
            if let Some(raw) = deadline {
                task.deadline = Some(parse_deadline(&raw)?);
            }
            db.create_task(&task)?;
            if json {
                print_json(&task)?;
            } else {
                println!("Task created: {}", task.id);
            }
        }
        TaskAction::List { all } => {
            let tasks: Vec<Task> = db
                .list_tasks_or_empty()
                .into_iter()
                .filter(|t| all || !t.completed)
                .collect();
            if json {
                print_json(&tasks)?;
            } else if tasks.is_empty() {
                println!("No tasks");
            } else {
                for task in &tasks {
                    println!("{}", describe(task));
                }
            }
        }
        TaskAction::Edit {
            id,
            title,
            minutes,
            priority,
            splittable,
            deadline,
        } => {
            let mut task = resolve_task(&db, &id)?;
            let deadline = match deadline.as_deref() {
                None => None,
                Some(raw) if raw.eq_ignore_ascii_case("none") => Some(None),
                Some(raw) => Some(Some(parse_deadline(raw)?)),
            };
            task.apply(TaskEdit {
                title,
                duration_minutes: minutes,
                priority,
                splittable,
                deadline,
            });
            db.update_task(&task)?;
            if json {
                print_json(&task)?;
            } else {
                println!("Task updated: {}", describe(&task));
            }
        }
        TaskAction::Complete { id } => {
            let task = resolve_task(&db, &id)?;
            if db.complete_task(&task.id)? {
                println!("Task completed: {}", task.id);
            } else {
                println!("Task already completed: {}", task.id);
            }
        }
        TaskAction::Delete { id } => {
            let task = resolve_task(&db, &id)?;
            db.delete_task(&task.id)?;
            println!("Task deleted: {}", task.id);
        }
    }
    Ok(())
}
