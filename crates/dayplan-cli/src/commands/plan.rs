//! Schedule commands: generate, inspect and hand-edit the day's blocks.

use chrono::NaiveDate;
use clap::Subcommand;
use dayplan_core::clock::{format_hhmm, parse_hhmm};
use dayplan_core::{MoveOutcome, PlanDb, Repositioner, ScheduleStore, Settings};

use super::{plan_date, print_json, resolve_block, CmdResult};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Regenerate the schedule from the current tasks
    Generate {
        /// Date to plan (default: settings.date or today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show the stored schedule
    Show {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Move a block to a new start time
    Move {
        /// Block ID (or unique prefix)
        block: String,
        /// New start, HH:MM
        start: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Mark a block done
    Done {
        /// Block ID (or unique prefix)
        block: String,
        /// Clear the done flag instead
        #[arg(long)]
        undo: bool,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Remove a block from the schedule
    Remove {
        /// Block ID (or unique prefix)
        block: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn print_schedule(store: &ScheduleStore, settings: &Settings, json: bool) -> CmdResult {
    if json {
        return print_json(&store.snapshot(settings));
    }

    println!(
        "{}  {}-{}",
        store.date(),
        format_hhmm(settings.day_start),
        format_hhmm(settings.day_end)
    );
    if store.blocks().is_empty() {
        println!("  (no blocks)");
    }
    for block in store.blocks() {
        let mark = if block.done { "x" } else { " " };
        let short_id: String = block.id.chars().take(14).collect();
        let text = block.to_string();
        println!("  [{mark}] {text:<40} {:<8} {short_id}", block.kind.as_str());
    }
    if !store.unplaced().is_empty() {
        println!("Unplaced:");
        for entry in store.unplaced() {
            println!("  {} ({} min)", entry.title, entry.remaining_minutes);
        }
    }
    Ok(())
}

pub fn run(action: PlanAction, json: bool) -> CmdResult {
    let db = PlanDb::open()?;
    let settings = Settings::load_or_default();

    match action {
        PlanAction::Generate { date } => {
            let date = plan_date(date, &settings);
            let mut store = db.load_schedule(date)?;
            let tasks = db.list_tasks_or_empty();
            store.regenerate(&tasks, &settings)?;
            db.save_schedule(&store)?;
            print_schedule(&store, &settings, json)?;
        }
        PlanAction::Show { date } => {
            let store = db.load_schedule(plan_date(date, &settings))?;
            print_schedule(&store, &settings, json)?;
        }
        PlanAction::Move { block, start, date } => {
            let mut store = db.load_schedule(plan_date(date, &settings))?;
            let id = resolve_block(&store, &block)?;
            let new_start =
                parse_hhmm(&start).ok_or_else(|| format!("Invalid time '{start}' (expected HH:MM)"))?;

            let mut mover = Repositioner::new(settings.day_window()?);
            let outcome = mover.move_to(&mut store, &id, new_start)?;
            if outcome.is_committed() {
                db.save_schedule(&store)?;
            }
            if json {
                return print_json(&outcome_json(&outcome));
            }
            match outcome {
                MoveOutcome::Committed { id, start, end } => {
                    println!("Moved {id} to {}-{}", format_hhmm(start), format_hhmm(end));
                }
                MoveOutcome::Reverted { notice, .. } => println!("Move reverted: {notice}"),
                MoveOutcome::Idle => {}
            }
        }
        PlanAction::Done { block, undo, date } => {
            let mut store = db.load_schedule(plan_date(date, &settings))?;
            let id = resolve_block(&store, &block)?;
            let done = store
                .set_done(&id, !undo)
                .map(|b| b.done)
                .ok_or_else(|| format!("Block not found: {id}"))?;
            db.save_schedule(&store)?;
            println!("{id}: {}", if done { "done" } else { "not done" });
        }
        PlanAction::Remove { block, date } => {
            let mut store = db.load_schedule(plan_date(date, &settings))?;
            let id = resolve_block(&store, &block)?;
            store.remove_block(&id);
            db.save_schedule(&store)?;
            println!("Block removed: {id}");
        }
    }
    Ok(())
}

fn outcome_json(outcome: &MoveOutcome) -> serde_json::Value {
    match outcome {
        MoveOutcome::Committed { id, start, end } => serde_json::json!({
            "status": "committed",
            "id": id,
            "start": format_hhmm(*start),
            "end": format_hhmm(*end),
        }),
        MoveOutcome::Reverted {
            id,
            start,
            end,
            notice,
        } => serde_json::json!({
            "status": "reverted",
            "id": id,
            "start": format_hhmm(*start),
            "end": format_hhmm(*end),
            "notice": notice,
        }),
        MoveOutcome::Idle => serde_json::json!({ "status": "idle" }),
    }
}
