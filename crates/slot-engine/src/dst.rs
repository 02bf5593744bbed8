//! DST transition policies for re-anchored local times.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Policy for local times that fall into a DST gap when an interval is
/// re-anchored onto another date.
///
/// Times that occur twice (fall-back) always resolve to the earlier instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DstPolicy {
    /// Drop occurrences that start or end inside the gap (e.g. 02:30 during spring forward).
    Skip,
    /// Move the time forward by the length of the gap.
    #[default]
    ShiftForward,
}

impl DstPolicy {
    /// Resolve a local wall-clock time in `tz` to a UTC instant.
    ///
    /// Returns `None` only under [`DstPolicy::Skip`] for a nonexistent time.
    pub fn resolve(self, tz: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        match tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earlier, _) => Some(earlier.with_timezone(&Utc)),
            LocalResult::None => match self {
                DstPolicy::Skip => None,
                DstPolicy::ShiftForward => shift_past_gap(tz, local),
            },
        }
    }
}

/// Walk forward in 15 minute steps until the wall clock exists again, then
/// keep the original distance from the gap start.
fn shift_past_gap(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    // Real-world gaps are at most two hours.
    for step in 1..=12 {
        let probe = local + Duration::minutes(15 * step);
        if let Some(dt) = tz.from_local_datetime(&probe).earliest() {
            let offset_before = tz
                .offset_from_utc_datetime(&(dt.naive_utc() - Duration::hours(3)))
                .fix();
            // Interpret the nonexistent time with the pre-transition offset.
            let utc = local - Duration::seconds(i64::from(offset_before.local_minus_utc()));
            return Some(Utc.from_utc_datetime(&utc));
        }
    }
    None
}
