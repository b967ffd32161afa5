//! iCalendar (RFC 5545) export of a day's placed blocks.
//!
//! Only non-fixed blocks are written: fixed blocks came from a calendar or
//! from the break setting in the first place. Times are floating local
//! times on the schedule's date.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::clock::{Minute, MINUTES_PER_DAY};
use crate::schedule::Block;

pub const PRODID: &str = "-//dayplan//dayplan 0.1//EN";

const CRLF: &str = "\r\n";

/// Escape a TEXT value: backslash, semicolon, comma and newline.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(ch),
        }
    }
    out
}

/// `YYYYMMDDTHHMM00` for a minute on `date`. Minute 1440 rolls to the next day.
fn local_stamp(date: NaiveDate, minute: Minute) -> String {
    let day = date + Duration::days(i64::from(minute / MINUTES_PER_DAY));
    let minute = minute % MINUTES_PER_DAY;
    format!(
        "{}T{:02}{:02}00",
        day.format("%Y%m%d"),
        minute / 60,
        minute % 60
    )
}

/// Render the placed blocks of `date` as a VCALENDAR document.
///
/// `stamp` becomes every event's DTSTAMP.
pub fn export_ics(date: NaiveDate, blocks: &[Block], stamp: DateTime<Utc>) -> String {
    let mut placed: Vec<&Block> = blocks.iter().filter(|b| !b.fixed).collect();
    placed.sort_by_key(|b| b.start);

    let dtstamp = stamp.format("%Y%m%dT%H%M%SZ").to_string();
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{PRODID}"),
    ];
    for block in placed {
        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!("UID:{}@dayplan", block.id));
        lines.push(format!("DTSTAMP:{dtstamp}"));
        lines.push(format!("DTSTART:{}", local_stamp(date, block.start)));
        lines.push(format!("DTEND:{}", local_stamp(date, block.end)));
        lines.push(format!("SUMMARY:{}", escape_text(&block.title)));
        lines.push("END:VEVENT".to_string());
    }
    lines.push("END:VCALENDAR".to_string());

    let mut out = lines.join(CRLF);
    out.push_str(CRLF);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::BlockKind;
    use chrono::TimeZone;
    use indoc::indoc;

    fn task_block(id: &str, title: &str, start: Minute, end: Minute) -> Block {
        Block {
            id: id.to_string(),
            kind: BlockKind::Task,
            task_id: Some("task-1".into()),
            title: title.to_string(),
            start,
            end,
            fixed: false,
            done: false,
        }
    }

    #[test]
    fn exports_placed_blocks_in_start_order() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let stamp = Utc.with_ymd_and_hms(2026, 10, 19, 7, 30, 5).unwrap();
        let blocks = vec![
            task_block("b2", "Review, then merge", 660, 705),
            Block::fixed("break", BlockKind::Break, "Lunch", 720, 780),
            task_block("b1", "Write report", 540, 630),
        ];

        let expected = indoc! {"
            BEGIN:VCALENDAR
            VERSION:2.0
            PRODID:-//dayplan//dayplan 0.1//EN
            BEGIN:VEVENT
            UID:b1@dayplan
            DTSTAMP:20261019T073005Z
            DTSTART:20261019T090000
            DTEND:20261019T103000
            SUMMARY:Write report
            END:VEVENT
            BEGIN:VEVENT
            UID:b2@dayplan
            DTSTAMP:20261019T073005Z
            DTSTART:20261019T110000
            DTEND:20261019T114500
            SUMMARY:Review\\, then merge
            END:VEVENT
            END:VCALENDAR
        "}
        .replace('\n', "\r\n");

        assert_eq!(export_ics(date, &blocks, stamp), expected);
    }

    #[test]
    fn empty_schedule_is_a_bare_calendar() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let out = export_ics(date, &[], Utc::now());
        assert_eq!(
            out,
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//dayplan//dayplan 0.1//EN\r\nEND:VCALENDAR\r\n"
        );
    }

    #[test]
    fn escapes_text_values() {
        assert_eq!(escape_text(r"a\b;c,d"), r"a\\b\;c\,d");
        assert_eq!(escape_text("line one\r\nline two"), r"line one\nline two");
    }

    #[test]
    fn end_of_day_rolls_to_midnight() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        assert_eq!(local_stamp(date, 1440), "20270101T000000");
        assert_eq!(local_stamp(date, 5), "20261231T000500");
    }
}
