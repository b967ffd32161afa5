//! TOML-based planner settings.
//!
//! Stores the day window, buffer, ranking strategy, the optional break window
//! and import defaults. Settings live at `<data dir>/settings.toml`.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::clock::{hhmm, parse_hhmm, Minute, MINUTES_PER_DAY};
use crate::error::ConfigError;
use crate::schedule::{Block, BlockKind, DayWindow};
use crate::timeline::RankStrategy;

/// Id given to the block generated from the break window.
pub const BREAK_BLOCK_ID: &str = "break";

/// Largest buffer accepted between blocks.
pub const MAX_BUFFER_MINUTES: u32 = 240;

/// A fixed daily break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakWindow {
    #[serde(with = "hhmm")]
    pub start: Minute,
    #[serde(with = "hhmm")]
    pub end: Minute,
    #[serde(default = "default_break_title")]
    pub title: String,
}

/// Planner settings.
///
/// Serialized to/from TOML at `<data dir>/settings.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(with = "hhmm", default = "default_day_start")]
    pub day_start: Minute,
    #[serde(with = "hhmm", default = "default_day_end")]
    pub day_end: Minute,
    /// Minutes kept free after every automatically placed block
    #[serde(default = "default_buffer")]
    pub buffer_minutes: u32,
    #[serde(default)]
    pub strategy: RankStrategy,
    /// Day to plan; today when unset
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Duration for imported items that carry none
    #[serde(default = "default_task_minutes")]
    pub default_task_minutes: u32,
    /// Absent from the file means no break
    #[serde(default)]
    pub break_window: Option<BreakWindow>,
}

// Default functions
fn default_day_start() -> Minute {
    9 * 60
}
fn default_day_end() -> Minute {
    17 * 60
}
fn default_buffer() -> u32 {
    10
}
fn default_break_title() -> String {
    "Lunch".into()
}
fn default_break_window() -> Option<BreakWindow> {
    Some(BreakWindow {
        start: 12 * 60,
        end: 13 * 60,
        title: default_break_title(),
    })
}
fn default_task_minutes() -> u32 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            day_start: default_day_start(),
            day_end: default_day_end(),
            buffer_minutes: default_buffer(),
            strategy: RankStrategy::default(),
            break_window: default_break_window(),
            date: None,
            default_task_minutes: default_task_minutes(),
        }
    }
}

impl Settings {
    /// The validated day window.
    ///
    /// # Errors
    /// Returns a configuration error if end is not after start or the window
    /// is shorter than an hour.
    pub fn day_window(&self) -> Result<DayWindow, ConfigError> {
        DayWindow::new(self.day_start, self.day_end)
    }

    /// Check every setting, returning the day window on success.
    ///
    /// # Errors
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<DayWindow, ConfigError> {
        if self.day_end > MINUTES_PER_DAY {
            return Err(invalid("day_end", "must not be later than 24:00"));
        }
        let window = self.day_window()?;
        if self.buffer_minutes > MAX_BUFFER_MINUTES {
            return Err(invalid(
                "buffer_minutes",
                &format!("must be at most {MAX_BUFFER_MINUTES}"),
            ));
        }
        if self.default_task_minutes == 0 {
            return Err(invalid("default_task_minutes", "must be positive"));
        }
        if let Some(brk) = &self.break_window {
            if brk.end <= brk.start {
                return Err(invalid("break_window", "end must be after start"));
            }
        }
        Ok(window)
    }

    /// Fixed block for the configured break, if any.
    pub fn break_block(&self) -> Option<Block> {
        self.break_window.as_ref().map(|brk| {
            Block::fixed(BREAK_BLOCK_ID, BlockKind::Break, brk.title.clone(), brk.start, brk.end)
        })
    }

    /// The date being planned.
    pub fn target_date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("settings.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("settings.toml"))
    }

    /// Load from the data directory, writing defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed or fails
    /// validation, or if the default file cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults when the file is missing.
    ///
    /// # Errors
    ///
    /// Same as [`Settings::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let settings: Settings =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                settings.validate()?;
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let settings = Self::default();
                settings.save_to(path)?;
                Ok(settings)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Load from disk, returning defaults when the file is unreadable or malformed.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "settings unusable, falling back to defaults");
            Self::default()
        })
    }

    /// Like [`Settings::load_or_default`] for an explicit path.
    pub fn load_from_or_default(path: &Path) -> Self {
        Self::load_from(path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, path = %path.display(), "settings unusable, falling back to defaults");
            Self::default()
        })
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || invalid(key, "unknown settings key");
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(invalid(key, "settings key is empty"));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Number(_) => {
                    let n: u64 = value
                        .trim()
                        .parse()
                        .map_err(|_| invalid(key, &format!("cannot parse '{value}' as a number")))?;
                    serde_json::Value::Number(n.into())
                }
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .trim()
                        .parse()
                        .map_err(|_| invalid(key, &format!("cannot parse '{value}' as a bool")))?,
                ),
                serde_json::Value::Object(_) => serde_json::from_str(value)
                    .map_err(|e| invalid(key, &e.to_string()))?,
                // null and string slots take the raw text; "none" clears an optional
                serde_json::Value::Null | serde_json::Value::String(_)
                    if value.eq_ignore_ascii_case("none") =>
                {
                    serde_json::Value::Null
                }
                _ => serde_json::Value::String(value.to_string()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Get a settings value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key and re-validate. Does not persist.
    ///
    /// Setting `break_window` to a `HH:MM-HH:MM` range creates the window;
    /// `none` removes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed, or
    /// the resulting settings are invalid. On error `self` is unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(key, &e.to_string()))?;
        if key == "break_window" {
            json["break_window"] = parse_break_range(value)?;
        } else {
            Self::set_json_value_by_path(&mut json, key, value)?;
        }
        let updated: Settings =
            serde_json::from_value(json).map_err(|e| invalid(key, &e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn parse_break_range(value: &str) -> Result<serde_json::Value, ConfigError> {
    if value.trim().eq_ignore_ascii_case("none") {
        return Ok(serde_json::Value::Null);
    }
    let (start, end) = value
        .split_once('-')
        .and_then(|(s, e)| Some((parse_hhmm(s)?, parse_hhmm(e)?)))
        .ok_or_else(|| invalid("break_window", "expected HH:MM-HH:MM or none"))?;
    serde_json::to_value(BreakWindow {
        start,
        end,
        title: default_break_title(),
    })
    .map_err(|e| invalid("break_window", &e.to_string()))
}
