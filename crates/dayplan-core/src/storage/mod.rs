mod config;
pub mod plan_db;

pub use config::{BreakWindow, Settings, BREAK_BLOCK_ID, MAX_BUFFER_MINUTES};
pub use plan_db::PlanDb;

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// `DAYPLAN_DATA_DIR` overrides the location. Otherwise this is
/// `~/.config/dayplan[-dev]/`, with `DAYPLAN_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("DAYPLAN_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("DAYPLAN_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("dayplan-dev")
            } else {
                base_dir.join("dayplan")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
