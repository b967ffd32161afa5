use clap::Subcommand;
use dayplan_core::Settings;

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show all settings
    Show,
    /// Get a settings value
    Get {
        /// Settings key (e.g. "day_start", "break_window.start")
        key: String,
    },
    /// Set a settings value
    Set {
        /// Settings key
        key: String,
        /// New value ("none" clears optional values)
        value: String,
    },
    /// Reset settings to defaults
    Reset,
}

pub fn run(action: SettingsAction, json: bool) -> CmdResult {
    match action {
        SettingsAction::Show => {
            let settings = Settings::load_or_default();
            if json {
                print_json(&settings)?;
            } else {
                print!("{}", toml::to_string_pretty(&settings)?);
            }
        }
        SettingsAction::Get { key } => {
            let settings = Settings::load_or_default();
            match settings.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        SettingsAction::Set { key, value } => {
            let mut settings = Settings::load_or_default();
            settings.set(&key, &value)?;
            settings.save()?;
            println!("ok");
        }
        SettingsAction::Reset => {
            Settings::default().save()?;
            println!("settings reset to defaults");
        }
    }
    Ok(())
}
