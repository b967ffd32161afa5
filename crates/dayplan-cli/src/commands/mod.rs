//! Subcommand handlers and the helpers they share.

pub mod export;
pub mod import;
pub mod plan;
pub mod settings;
pub mod task;

use chrono::NaiveDate;
use dayplan_core::{ScheduleStore, Settings};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `--date` when given, otherwise the configured or current date.
pub fn plan_date(date: Option<NaiveDate>, settings: &Settings) -> NaiveDate {
    date.unwrap_or_else(|| settings.target_date())
}

/// Match a block by full id or by a unique id prefix.
pub fn resolve_block(store: &ScheduleStore, needle: &str) -> Result<String, String> {
    if let Some(block) = store.block(needle) {
        return Ok(block.id.clone());
    }
    let matches: Vec<&str> = store
        .blocks()
        .iter()
        .filter(|b| b.id.starts_with(needle))
        .map(|b| b.id.as_str())
        .collect();
    match matches.as_slice() {
        [id] => Ok((*id).to_string()),
        [] => Err(format!("Block not found: {needle}")),
        _ => Err(format!("Block id '{needle}' is ambiguous ({} matches)", matches.len())),
    }
}
