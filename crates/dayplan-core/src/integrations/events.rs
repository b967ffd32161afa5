//! Fixed calendar events for a single day.
//!
//! Events arrive as a JSON array of `{id, title, start_minutes, end_minutes}`
//! records and become fixed `calendar` blocks. Clipping to the day window is
//! left to the allocator.

use serde::{Deserialize, Serialize};

use crate::clock::{Minute, MINUTES_PER_DAY};
use crate::error::{ImportError, ValidationError};
use crate::schedule::{Block, BlockKind};

/// Prefix keeping event block ids apart from generated block ids.
pub const EVENT_ID_PREFIX: &str = "event-";

/// One imported event, as found in the payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixedEventRecord {
    pub id: String,
    pub title: String,
    pub start_minutes: Minute,
    pub end_minutes: Minute,
}

impl FixedEventRecord {
    /// Convert to a fixed calendar block.
    ///
    /// # Errors
    /// Rejects empty or inverted ranges and ranges past midnight.
    pub fn to_block(&self) -> Result<Block, ValidationError> {
        if self.end_minutes <= self.start_minutes || self.end_minutes > MINUTES_PER_DAY {
            return Err(ValidationError::InvalidTimeRange {
                start: self.start_minutes,
                end: self.end_minutes,
            });
        }
        Ok(Block::fixed(
            format!("{EVENT_ID_PREFIX}{}", self.id),
            BlockKind::Calendar,
            self.title.clone(),
            self.start_minutes,
            self.end_minutes,
        ))
    }
}

/// Parse an events payload.
pub fn parse_events(json: &str) -> Result<Vec<FixedEventRecord>, ImportError> {
    Ok(serde_json::from_str(json)?)
}

/// Convert records to blocks, skipping invalid ones with a warning.
pub fn events_to_blocks(records: &[FixedEventRecord]) -> Vec<Block> {
    records
        .iter()
        .filter_map(|record| match record.to_block() {
            Ok(block) => Some(block),
            Err(e) => {
                tracing::warn!(event = %record.id, error = %e, "skipping invalid event");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_converts_events() {
        let json = r#"[
            {"id": "a1", "title": "Standup", "start_minutes": 555, "end_minutes": 570},
            {"id": "a2", "title": "Broken", "start_minutes": 600, "end_minutes": 600}
        ]"#;
        let records = parse_events(json).unwrap();
        assert_eq!(records.len(), 2);

        let blocks = events_to_blocks(&records);
        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.id, "event-a1");
        assert_eq!(block.kind, BlockKind::Calendar);
        assert!(block.fixed);
        assert!(block.task_id.is_none());
        assert_eq!((block.start, block.end), (555, 570));
    }

    #[test]
    fn rejects_ranges_past_midnight() {
        let record = FixedEventRecord {
            id: "late".into(),
            title: "Late".into(),
            start_minutes: 1400,
            end_minutes: 1500,
        };
        assert!(matches!(
            record.to_block(),
            Err(ValidationError::InvalidTimeRange { .. })
        ));
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(matches!(
            parse_events(r#"{"id": "x"}"#),
            Err(ImportError::Malformed(_))
        ));
    }
}
