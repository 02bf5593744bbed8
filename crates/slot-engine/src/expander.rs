//! Recurrence expansion -- turns a weekly pattern plus one canonical interval
//! into concrete occurrence intervals for a query window.
//!
//! Expansion walks calendar days in the resource's reference timezone, so the
//! result is identical wherever the engine runs (browser or server) as long as
//! the inputs are the same.

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use tracing::trace;

use crate::dst::DstPolicy;
use crate::error::Result;
use crate::interval::TimeInterval;
use crate::recurrence::Recurrence;

/// Expand `pattern` against `window`.
///
/// Days are visited from `max(window.start, canonical start)` through the
/// last day the window touches, as local dates in `tz`. A window ending
/// exactly at local midnight does not touch the following day. For each day
/// that the pattern matches (weekday listed, not after `endDate`), the
/// canonical interval is re-anchored onto that day with
/// [`TimeInterval::shifted_to`], which applies the overnight wrap rule.
///
/// Occurrences are returned in ascending day order. Every day-generated
/// instance is returned, including ones that only touch the window's first or
/// last day without intersecting it; callers intersect with their own
/// candidate. Pad the window by a day on the left to catch overnight
/// occurrences that start the day before.
///
/// # Errors
/// Returns `EngineError::InvalidConfiguration` if the pattern is malformed.
pub fn expand(
    pattern: &Recurrence,
    canonical: &TimeInterval,
    window: &TimeInterval,
    tz: Tz,
    dst: DstPolicy,
) -> Result<Vec<TimeInterval>> {
    pattern.validate()?;
    Ok(expand_validated(pattern, canonical, window, tz, dst))
}

/// [`expand`] for a pattern that has already passed [`Recurrence::validate`].
pub(crate) fn expand_validated(
    pattern: &Recurrence,
    canonical: &TimeInterval,
    window: &TimeInterval,
    tz: Tz,
    dst: DstPolicy,
) -> Vec<TimeInterval> {
    if !window.is_well_formed() {
        return Vec::new();
    }

    let pattern_start = canonical.start.with_timezone(&tz).date_naive();
    let first = window.start.with_timezone(&tz).date_naive().max(pattern_start);
    // Last local day the half-open window touches.
    let last = (window.end - Duration::nanoseconds(1))
        .with_timezone(&tz)
        .date_naive();

    let mut occurrences = Vec::new();
    for day in days_between(first, last) {
        if !pattern.matches(day) {
            continue;
        }
        match canonical.shifted_to(day, tz, dst) {
            Some(instance) => occurrences.push(instance),
            None => trace!(%day, "occurrence skipped in DST gap"),
        }
    }

    trace!(
        count = occurrences.len(),
        %first,
        %last,
        "expanded weekly recurrence"
    );
    occurrences
}

/// Inclusive day range; empty when `last < first`.
fn days_between(first: NaiveDate, last: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let span = (last - first).num_days();
    (0..=span).map(move |offset| first + Duration::days(offset))
}
