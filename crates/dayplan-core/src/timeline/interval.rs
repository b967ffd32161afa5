//! Free-time bookkeeping for a single day.
//!
//! The set holds the day's still-free ranges as a sorted list in which no two
//! intervals touch or overlap and every interval lies inside the day window.

use serde::{Deserialize, Serialize};

use crate::clock::Minute;

/// A half-open `[start, end)` range of minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: Minute,
    pub end: Minute,
}

impl Interval {
    pub fn new(start: Minute, end: Minute) -> Self {
        Self { start, end }
    }

    /// Get duration in minutes
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Check whether two ranges share at least one minute
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// The free ranges remaining in a day window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalSet {
    day_start: Minute,
    day_end: Minute,
    /// Minimum distance kept after every occupied region
    buffer: u32,
    free: Vec<Interval>,
}

impl IntervalSet {
    /// Create a set with one free interval spanning `[day_start, day_end)`.
    pub fn new(day_start: Minute, day_end: Minute) -> Self {
        let day = Interval::new(day_start, day_end);
        Self {
            day_start,
            day_end,
            buffer: 0,
            free: if day.is_empty() { Vec::new() } else { vec![day] },
        }
    }

    /// Set the buffer enforced after occupied regions by [`first_gap_of_size`](Self::first_gap_of_size).
    pub fn with_buffer(mut self, minutes: u32) -> Self {
        self.buffer = minutes;
        self
    }

    pub fn day_start(&self) -> Minute {
        self.day_start
    }

    pub fn day_end(&self) -> Minute {
        self.day_end
    }

    pub fn buffer(&self) -> u32 {
        self.buffer
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.free
    }

    /// Total free minutes.
    pub fn free_minutes(&self) -> u32 {
        self.free.iter().map(Interval::len).sum()
    }

    /// Remove `[busy_start, busy_end)` from every free interval it touches.
    ///
    /// An interval covering the busy range is split into its left and right
    /// remainders. Empty or inverted ranges leave the set unchanged.
    pub fn carve(&mut self, busy_start: Minute, busy_end: Minute) {
        let busy = Interval::new(busy_start, busy_end);
        if busy.is_empty() {
            return;
        }

        let mut next = Vec::with_capacity(self.free.len() + 1);
        for free in self.free.drain(..) {
            if !free.overlaps(&busy) {
                next.push(free);
                continue;
            }
            let left = Interval::new(free.start, busy.start.min(free.end));
            let right = Interval::new(busy.end.max(free.start), free.end);
            if !left.is_empty() {
                next.push(left);
            }
            if !right.is_empty() {
                next.push(right);
            }
        }
        next.sort_by_key(|i| i.start);
        self.free = next;
    }

    /// Find the earliest start at which `minutes` fit.
    ///
    /// A cursor walks the free intervals from day start. Every occupied region
    /// between two free intervals pushes the cursor to at least
    /// `occupied_end + buffer`; the first cursor position from which the
    /// request fits before the next occupied start (or day end) wins.
    pub fn first_gap_of_size(&self, minutes: u32) -> Option<Minute> {
        if minutes == 0 {
            return None;
        }

        let mut cursor = self.day_start;
        for free in &self.free {
            // free.start is where an occupied region (or the day) ends
            let ready_at = if free.start > self.day_start {
                free.start.saturating_add(self.buffer)
            } else {
                free.start
            };
            cursor = cursor.max(ready_at);
            if cursor.checked_add(minutes).is_some_and(|end| end <= free.end) {
                return Some(cursor);
            }
        }
        None
    }

    /// Contiguous free minutes from `at` to the end of the interval holding it.
    pub fn room_at(&self, at: Minute) -> u32 {
        self.free
            .iter()
            .find(|i| i.start <= at && at < i.end)
            .map_or(0, |i| i.end - at)
    }
}
