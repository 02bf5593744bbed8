//! Records the engine reads: reservations and availability blocks for one robot.
//!
//! These are snapshots handed in by the query collaborator. The engine never
//! mutates or persists them.

use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;
use crate::error::{EngineError, Result};
use crate::expander;
use crate::interval::TimeInterval;
use crate::recurrence::Recurrence;

/// Lifecycle state of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    /// Live statuses take part in conflict checks; terminal ones are inert.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            ReservationStatus::Pending | ReservationStatus::Confirmed | ReservationStatus::Active
        )
    }
}

/// A booking of a robot for one interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,
    pub resource_id: String,
    #[serde(flatten)]
    pub interval: TimeInterval,
    pub status: ReservationStatus,
}

/// Partner-declared unavailability, one-time or recurring.
///
/// For a recurring block, `interval` is only a template: its local
/// time-of-day and its start date (the first day the pattern may fire) are used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityBlock {
    pub id: String,
    pub resource_id: String,
    #[serde(flatten)]
    pub interval: TimeInterval,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
}

impl AvailabilityBlock {
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Concrete intervals of this block that intersect `window`, in day order.
    ///
    /// Recurring blocks are expanded over the window padded one day back so
    /// that overnight occurrences starting the previous evening are included.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidConfiguration` for a malformed pattern.
    pub fn occurrences_within(
        &self,
        window: &TimeInterval,
        tz: Tz,
        dst: DstPolicy,
    ) -> Result<Vec<TimeInterval>> {
        if let Some(pattern) = &self.recurrence {
            pattern.validate()?;
        }
        Ok(self.occurrences_validated(window, tz, dst))
    }

    pub(crate) fn occurrences_validated(
        &self,
        window: &TimeInterval,
        tz: Tz,
        dst: DstPolicy,
    ) -> Vec<TimeInterval> {
        let Some(pattern) = &self.recurrence else {
            return if self.interval.overlaps(window) {
                vec![self.interval]
            } else {
                Vec::new()
            };
        };

        let padded = TimeInterval::new(window.start - Duration::days(1), window.end);
        let mut occurrences = expander::expand_validated(pattern, &self.interval, &padded, tz, dst);
        occurrences.retain(|occ| occ.overlaps(window));
        occurrences
    }
}

/// Everything the query collaborator returns for `(resource_id, window)`.
///
/// Over-fetching is allowed; records for other resources or outside the
/// window are ignored by the index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSnapshot {
    #[serde(default)]
    pub reservations: Vec<Reservation>,
    #[serde(default)]
    pub blocks: Vec<AvailabilityBlock>,
}

impl ScheduleSnapshot {
    /// Parse a snapshot. A record that fails to parse (including a malformed
    /// recurrence pattern) is `InvalidConfiguration`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| EngineError::invalid(format!("schedule snapshot: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_confirmed_active_are_live() {
        use ReservationStatus::*;
        let live: Vec<_> = [Pending, Confirmed, Active, Completed, Cancelled]
            .into_iter()
            .filter(|s| s.is_live())
            .collect();
        assert_eq!(live, vec![Pending, Confirmed, Active]);
    }

    #[test]
    fn reservation_reads_flat_json() {
        let r: Reservation = serde_json::from_str(
            r#"{"id":"r1","resourceId":"R1","start":"2026-03-02T10:00:00Z","end":"2026-03-02T10:30:00Z","status":"confirmed"}"#,
        )
        .unwrap();
        assert_eq!(r.resource_id, "R1");
        assert_eq!(r.interval.duration_minutes(), 30);
        assert_eq!(r.status, ReservationStatus::Confirmed);
    }

    #[test]
    fn block_with_bad_recurrence_fails_to_parse() {
        let err = serde_json::from_str::<AvailabilityBlock>(
            r#"{"id":"b1","resourceId":"R1","start":"2026-03-02T09:00:00Z","end":"2026-03-02T10:00:00Z","recurrence":{"type":"weekly","daysOfWeek":[]}}"#,
        );
        assert!(err.is_err());
    }
}
