use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Subcommand;
use dayplan_core::integrations::{events_to_blocks, parse_events, parse_todos, todos_to_tasks};
use dayplan_core::{PlanDb, Settings};

use super::{plan_date, print_json, CmdResult};

#[derive(Subcommand)]
pub enum ImportAction {
    /// Import fixed calendar events for a day from a JSON file
    Events {
        /// JSON array of {id, title, start_minutes, end_minutes}
        file: PathBuf,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Import external to-do items as tasks from a JSON file
    Todos {
        /// JSON array of {id, title, notes?, due?, duration_minutes?}
        file: PathBuf,
    },
}

pub fn run(action: ImportAction, json: bool) -> CmdResult {
    let db = PlanDb::open()?;
    let settings = Settings::load_or_default();

    match action {
        ImportAction::Events { file, date } => {
            let records = parse_events(&std::fs::read_to_string(&file)?)?;
            let blocks = events_to_blocks(&records);
            let count = blocks.len();

            let mut store = db.load_schedule(plan_date(date, &settings))?;
            let overlapped = store.upsert_fixed_events(blocks);
            db.save_schedule(&store)?;

            if json {
                print_json(&store.fixed_blocks())?;
            } else {
                println!("Imported {count} of {} events for {}", records.len(), store.date());
                if !overlapped.is_empty() {
                    println!(
                        "{} placed block(s) now overlap an event; run `dayplan plan generate` to re-plan",
                        overlapped.len()
                    );
                }
            }
        }
        ImportAction::Todos { file } => {
            let records = parse_todos(&std::fs::read_to_string(&file)?)?;
            let tasks = todos_to_tasks(&records, settings.default_task_minutes);
            let mut ids = Vec::with_capacity(tasks.len());
            for task in &tasks {
                ids.push(db.upsert_task_from_source(task)?);
            }

            if json {
                print_json(&ids)?;
            } else {
                println!("Imported {} of {} to-dos", ids.len(), records.len());
            }
        }
    }
    Ok(())
}
