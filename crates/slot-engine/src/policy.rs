//! Booking-window policy: lead time, advance limit, minimum duration and the
//! selection grid.
//!
//! [`BookingWindowPolicy::validate`] is a pure predicate. It takes `now` as an
//! argument and never reads the system clock.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::interval::TimeInterval;

/// Upper bound for every configured duration: ten years.
pub(crate) const MAX_CONFIG_MINUTES: i64 = 10 * 366 * 24 * 60;

/// What the candidate interval is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingMode {
    /// A renter reserving the robot. Subject to the minimum lead time.
    #[default]
    Booking,
    /// A partner declaring unavailability. No lead-time floor.
    Availability,
}

/// A booking-window rule that a candidate failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyViolation {
    /// `end` is not after `start`.
    Malformed,
    TooShort,
    TooSoon,
    TooFar,
}

impl PolicyViolation {
    pub fn code(self) -> &'static str {
        match self {
            PolicyViolation::Malformed => "MALFORMED",
            PolicyViolation::TooShort => "TOO_SHORT",
            PolicyViolation::TooSoon => "TOO_SOON",
            PolicyViolation::TooFar => "TOO_FAR",
        }
    }
}

/// Booking-window configuration. Durations are whole minutes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingWindowPolicy {
    /// Earliest allowed start relative to now, booking mode only.
    #[serde(rename = "minLeadTimeMinutes", with = "minutes")]
    pub min_lead_time: Duration,
    /// Latest allowed start relative to now.
    #[serde(rename = "maxAdvanceMinutes", with = "minutes")]
    pub max_advance: Duration,
    #[serde(rename = "minDurationMinutes", with = "minutes")]
    pub min_duration: Duration,
    /// Granularity of interactive selections.
    #[serde(rename = "gridQuantumMinutes", with = "minutes")]
    pub grid_quantum: Duration,
}

impl Default for BookingWindowPolicy {
    fn default() -> Self {
        Self {
            min_lead_time: Duration::hours(1),
            max_advance: Duration::days(30),
            min_duration: Duration::minutes(15),
            grid_quantum: Duration::minutes(15),
        }
    }
}

impl BookingWindowPolicy {
    /// Reject settings that would make the rules meaningless.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidConfiguration` naming the offending field.
    pub fn check(&self) -> Result<()> {
        if self.grid_quantum <= Duration::zero() {
            return Err(EngineError::invalid("gridQuantumMinutes must be positive"));
        }
        if self.min_duration <= Duration::zero() {
            return Err(EngineError::invalid("minDurationMinutes must be positive"));
        }
        if self.min_lead_time < Duration::zero() {
            return Err(EngineError::invalid("minLeadTimeMinutes must not be negative"));
        }
        if self.max_advance < Duration::zero() {
            return Err(EngineError::invalid("maxAdvanceMinutes must not be negative"));
        }
        for (name, value) in [
            ("minLeadTimeMinutes", self.min_lead_time),
            ("maxAdvanceMinutes", self.max_advance),
            ("minDurationMinutes", self.min_duration),
            ("gridQuantumMinutes", self.grid_quantum),
        ] {
            if value.num_minutes() > MAX_CONFIG_MINUTES {
                return Err(EngineError::invalid(format!(
                    "{} must be at most {}",
                    name, MAX_CONFIG_MINUTES
                )));
            }
        }
        Ok(())
    }

    /// Apply the rules in order; the first failure wins.
    ///
    /// 1. well-formed (`end > start`), else `MALFORMED`
    /// 2. duration at least `min_duration`, else `TOO_SHORT`
    /// 3. booking mode only: starts no earlier than `now + min_lead_time`, else `TOO_SOON`
    /// 4. starts no later than `now + max_advance`, else `TOO_FAR`
    pub fn validate(
        &self,
        candidate: &TimeInterval,
        now: DateTime<Utc>,
        mode: BookingMode,
    ) -> Option<PolicyViolation> {
        if !candidate.is_well_formed() {
            return Some(PolicyViolation::Malformed);
        }
        if candidate.duration() < self.min_duration {
            return Some(PolicyViolation::TooShort);
        }
        self.start_violation(candidate.start, now, mode)
    }

    /// Rules 3 and 4 alone: may a selection begin at `start`?
    pub fn is_eligible_start(&self, start: DateTime<Utc>, now: DateTime<Utc>, mode: BookingMode) -> bool {
        self.start_violation(start, now, mode).is_none()
    }

    fn start_violation(
        &self,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
        mode: BookingMode,
    ) -> Option<PolicyViolation> {
        // Out-of-range bounds: an unreachable lead time, an unlimited advance.
        if mode == BookingMode::Booking {
            let too_soon = match now.checked_add_signed(self.min_lead_time) {
                Some(earliest) => start < earliest,
                None => true,
            };
            if too_soon {
                return Some(PolicyViolation::TooSoon);
            }
        }
        if let Some(latest) = now.checked_add_signed(self.max_advance) {
            if start > latest {
                return Some(PolicyViolation::TooFar);
            }
        }
        None
    }

    /// Start of the grid cell containing `instant`. Cells are aligned to
    /// multiples of the quantum since the Unix epoch.
    pub fn floor_to_grid(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        floor_to_quantum(instant, self.grid_quantum)
    }

    /// `ceil(duration / quantum) * quantum`; non-positive durations map to zero.
    pub fn round_up_to_grid(&self, duration: Duration) -> Duration {
        let quantum = self.grid_quantum.num_milliseconds().max(1);
        let ms = duration.num_milliseconds();
        if ms <= 0 {
            return Duration::zero();
        }
        let quanta = (ms + quantum - 1) / quantum;
        Duration::milliseconds(quanta * quantum)
    }

    /// The grid cell containing `instant`.
    pub fn cell_at(&self, instant: DateTime<Utc>) -> TimeInterval {
        let start = self.floor_to_grid(instant);
        TimeInterval::new(start, start + self.grid_quantum)
    }
}

/// Start of the epoch-aligned `quantum` cell containing `instant`.
pub(crate) fn floor_to_quantum(instant: DateTime<Utc>, quantum: Duration) -> DateTime<Utc> {
    let quantum = quantum.num_seconds().max(1);
    let into_cell = instant.timestamp().rem_euclid(quantum);
    instant
        - Duration::seconds(into_cell)
        - Duration::nanoseconds(i64::from(instant.timestamp_subsec_nanos()))
}

/// Serde adapter storing a `Duration` as whole minutes.
mod minutes {
    use chrono::Duration;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(d.num_minutes())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = i64::deserialize(d)?;
        Duration::try_minutes(raw).ok_or_else(|| D::Error::custom(format!("{} minutes is out of range", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, s).unwrap()
    }

    #[test]
    fn floor_to_grid_snaps_down() {
        let p = BookingWindowPolicy::default();
        assert_eq!(p.floor_to_grid(at(14, 22, 31)), at(14, 15, 0));
        assert_eq!(p.floor_to_grid(at(14, 15, 0)), at(14, 15, 0));
    }

    #[test]
    fn round_up_to_grid_ceils() {
        let p = BookingWindowPolicy::default();
        assert_eq!(p.round_up_to_grid(Duration::minutes(22)), Duration::minutes(30));
        assert_eq!(p.round_up_to_grid(Duration::minutes(30)), Duration::minutes(30));
        assert_eq!(p.round_up_to_grid(Duration::minutes(31)), Duration::minutes(45));
        assert_eq!(p.round_up_to_grid(Duration::zero()), Duration::zero());
    }

    #[test]
    fn reads_minutes_from_json() {
        let p: BookingWindowPolicy =
            serde_json::from_str(r#"{"minLeadTimeMinutes":0,"gridQuantumMinutes":30}"#).unwrap();
        assert_eq!(p.min_lead_time, Duration::zero());
        assert_eq!(p.grid_quantum, Duration::minutes(30));
        assert_eq!(p.max_advance, Duration::days(30));
    }

    #[test]
    fn zero_quantum_is_invalid() {
        let p = BookingWindowPolicy {
            grid_quantum: Duration::zero(),
            ..BookingWindowPolicy::default()
        };
        assert!(matches!(p.check(), Err(EngineError::InvalidConfiguration(_))));
    }
}
