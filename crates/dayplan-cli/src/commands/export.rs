use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use dayplan_core::calendar::export_ics;
use dayplan_core::{PlanDb, Settings};

use super::{plan_date, CmdResult};

#[derive(Subcommand)]
pub enum ExportAction {
    /// Write placed blocks as an iCalendar file
    Ics {
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

pub fn run(action: ExportAction) -> CmdResult {
    match action {
        ExportAction::Ics { date, output } => {
            let settings = Settings::load_or_default();
            let store = PlanDb::open()?.load_schedule(plan_date(date, &settings))?;
            let ics = export_ics(store.date(), store.blocks(), Utc::now());
            match output {
                Some(path) => {
                    std::fs::write(&path, ics)?;
                    println!("Wrote {}", path.display());
                }
                None => print!("{ics}"),
            }
        }
    }
    Ok(())
}
