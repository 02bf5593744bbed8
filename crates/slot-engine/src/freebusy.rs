//! Merge busy intervals and compute the free gaps between them.
//!
//! Sorts intervals by start time, merges overlapping or adjacent periods, then
//! walks the gaps inside a window.

use serde::{Deserialize, Serialize};

use crate::interval::TimeInterval;

/// A free stretch of time inside a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeSlot {
    #[serde(flatten)]
    pub interval: TimeInterval,
    pub duration_minutes: i64,
}

impl FreeSlot {
    fn new(interval: TimeInterval) -> Self {
        Self {
            duration_minutes: interval.duration_minutes(),
            interval,
        }
    }
}

/// Merge overlapping or adjacent intervals, clipped to `window`.
///
/// Returns a sorted, non-overlapping list.
pub fn merge_busy(busy: &[TimeInterval], window: &TimeInterval) -> Vec<TimeInterval> {
    let mut clipped: Vec<TimeInterval> = busy
        .iter()
        .filter(|b| b.overlaps(window))
        .map(|b| TimeInterval::new(b.start.max(window.start), b.end.min(window.end)))
        .collect();

    clipped.sort();

    let mut merged: Vec<TimeInterval> = Vec::with_capacity(clipped.len());
    for interval in clipped {
        if let Some(last) = merged.last_mut() {
            if interval.start <= last.end {
                last.end = last.end.max(interval.end);
                continue;
            }
        }
        merged.push(interval);
    }
    merged
}

/// Free gaps of `window` not covered by any of `busy`, sorted by start.
pub fn free_slots(busy: &[TimeInterval], window: &TimeInterval) -> Vec<FreeSlot> {
    let mut slots = Vec::new();
    let mut cursor = window.start;

    for b in merge_busy(busy, window) {
        if cursor < b.start {
            slots.push(FreeSlot::new(TimeInterval::new(cursor, b.start)));
        }
        cursor = cursor.max(b.end);
    }

    if cursor < window.end {
        slots.push(FreeSlot::new(TimeInterval::new(cursor, window.end)));
    }
    slots
}
