//! Detect reservations that an availability block would collide with.
//!
//! Used when a partner creates or edits a blackout: every live reservation of
//! the same robot that overlaps an occurrence of the block inside the window
//! is reported, so the caller can start refund or cancellation flows.
//! Adjacent intervals (one ends exactly when the other starts) are NOT conflicts.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;
use crate::error::Result;
use crate::interval::TimeInterval;
use crate::model::{AvailabilityBlock, Reservation};

/// One reservation colliding with one block occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub reservation_id: String,
    pub reservation: TimeInterval,
    pub occurrence: TimeInterval,
    pub overlap_minutes: i64,
}

/// Pair every occurrence of `block` within `window` with the live reservations
/// it overlaps.
///
/// Results follow occurrence order, then reservation start order. A
/// reservation spanning two occurrences appears once per occurrence.
///
/// # Errors
/// Returns `EngineError::InvalidConfiguration` if the block's pattern is malformed.
pub fn find_block_conflicts(
    block: &AvailabilityBlock,
    reservations: &[Reservation],
    window: &TimeInterval,
    tz: Tz,
    dst: DstPolicy,
) -> Result<Vec<Conflict>> {
    let occurrences = block.occurrences_within(window, tz, dst)?;

    let mut live: Vec<&Reservation> = reservations
        .iter()
        .filter(|r| r.resource_id == block.resource_id && r.status.is_live())
        .collect();
    live.sort_by_key(|r| r.interval.start);

    let mut conflicts = Vec::new();
    for occurrence in &occurrences {
        for r in &live {
            if r.interval.overlaps(occurrence) {
                conflicts.push(Conflict {
                    reservation_id: r.id.clone(),
                    reservation: r.interval,
                    occurrence: *occurrence,
                    overlap_minutes: r.interval.overlap_minutes(occurrence),
                });
            }
        }
    }
    Ok(conflicts)
}
