//! Half-open time intervals.
//!
//! Every comparison in the engine goes through [`TimeInterval::overlaps`]:
//! two intervals overlap iff `a.start < b.end && b.start < a.end`, so an
//! interval ending exactly when another starts is NOT a conflict.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;

/// A `[start, end)` range of instants.
///
/// Well-formed intervals have `start < end`. The fields are public so that
/// intervals can cross the wire as plain `{start, end}` objects; callers that
/// accept untrusted input check [`TimeInterval::is_well_formed`] (the booking
/// policy reports a malformed candidate as `MALFORMED`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// An interval of `minutes` length beginning at `start`.
    pub fn starting_at(start: DateTime<Utc>, minutes: i64) -> Self {
        Self {
            start,
            end: start + Duration::minutes(minutes),
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }

    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// True when `other` lies entirely inside `self`.
    pub fn covers(&self, other: &TimeInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Minutes shared with `other`, zero when they do not overlap.
    pub fn overlap_minutes(&self, other: &TimeInterval) -> i64 {
        if !self.overlaps(other) {
            return 0;
        }
        (self.end.min(other.end) - self.start.max(other.start)).num_minutes()
    }

    /// Re-anchor this interval's local time-of-day onto `date` in `tz`.
    ///
    /// Only the wall-clock start and end times are carried over. If, after
    /// re-anchoring, `end <= start`, the interval spans into the next calendar
    /// day and one day is added to the end. This also applies when the
    /// source interval has `end == start` in local time, which therefore
    /// yields a 24 hour span.
    ///
    /// Returns `None` when `dst` is [`DstPolicy::Skip`] and either endpoint
    /// falls into a DST gap on that date.
    pub fn shifted_to(&self, date: NaiveDate, tz: Tz, dst: DstPolicy) -> Option<TimeInterval> {
        let start_time = self.start.with_timezone(&tz).time();
        let end_time = self.end.with_timezone(&tz).time();

        let local_start = date.and_time(start_time);
        let mut local_end = date.and_time(end_time);
        if local_end <= local_start {
            local_end += Duration::days(1);
        }

        let start = dst.resolve(tz, local_start)?;
        let mut end = dst.resolve(tz, local_end)?;
        // Both ends shifted onto the same instant by a DST gap.
        if end <= start {
            end = start + (local_end - local_start);
        }
        Some(TimeInterval { start, end })
    }
}
