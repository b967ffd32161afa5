//! Minute-of-day arithmetic shared by the allocator and the repositioner.
//!
//! All schedule positions are expressed as minutes since local midnight
//! (`0..=1440`). Durations and drag displacements live on a 5-minute grid.

use chrono::{NaiveTime, Timelike};

/// Minutes since local midnight.
pub type Minute = u32;

/// Granularity of task durations and manual moves.
pub const GRID_MINUTES: u32 = 5;

/// Last minute boundary of a day.
pub const MINUTES_PER_DAY: Minute = 24 * 60;

/// Round a duration to the nearest grid step (ties round up).
///
/// The result is at least one step and at most a whole day.
pub fn normalize_duration(minutes: u32) -> u32 {
    let capped = minutes.min(MINUTES_PER_DAY);
    let rounded = (capped + GRID_MINUTES / 2) / GRID_MINUTES * GRID_MINUTES;
    rounded.clamp(GRID_MINUTES, MINUTES_PER_DAY)
}

/// Snap a signed displacement to the nearest grid step.
///
/// Halfway values snap away from zero, so a 3-minute nudge becomes 5 and
/// -3 becomes -5.
pub fn snap_displacement(minutes: i32) -> i32 {
    let step = GRID_MINUTES as i32;
    let magnitude = minutes.saturating_abs().saturating_add(step / 2) / step * step;
    magnitude * minutes.signum()
}

/// Convert a wall-clock time to minutes since midnight.
pub fn minute_of(time: NaiveTime) -> Minute {
    time.hour() * 60 + time.minute()
}

/// Convert minutes since midnight back to a wall-clock time.
///
/// `1440` (end of day) has no `NaiveTime` and yields `None`.
pub fn time_of(minute: Minute) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minute / 60, minute % 60, 0)
}

/// Parse an `HH:MM` string. `24:00` is accepted as end of day.
pub fn parse_hhmm(s: &str) -> Option<Minute> {
    let (h, m) = s.trim().split_once(':')?;
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    if minute >= 60 {
        return None;
    }
    let total = hour.checked_mul(60)?.checked_add(minute)?;
    (total <= MINUTES_PER_DAY).then_some(total)
}

/// Format minutes since midnight as `HH:MM`.
pub fn format_hhmm(minute: Minute) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

/// Serde adapter storing a minute-of-day as an `HH:MM` string.
pub mod hhmm {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{format_hhmm, parse_hhmm, Minute};

    pub fn serialize<S: Serializer>(minute: &Minute, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_hhmm(*minute))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Minute, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_hhmm(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("expected HH:MM, got '{raw}'")))
    }
}
