//! Accept/reject decisions for candidate intervals.
//!
//! The client calls [`Scheduler::evaluate`] against an index it already holds
//! for instant feedback. The server calls [`Scheduler::authorize`], which
//! fetches a fresh snapshot and re-checks; only that answer is authoritative.
//! The engine does not serialize writers. The commit collaborator must call
//! `authorize` inside its per-robot critical section (single-writer lock or
//! conditional write) right before persisting.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::availability::AvailabilityIndex;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::interval::TimeInterval;
use crate::model::ScheduleSnapshot;
use crate::policy::BookingMode;
use crate::rejection::Rejection;

/// Outcome of checking one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Decision {
    Accepted { interval: TimeInterval },
    Rejected { rejection: Rejection },
}

impl Decision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Decision::Accepted { .. })
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Decision::Accepted { .. } => None,
            Decision::Rejected { rejection } => Some(rejection),
        }
    }
}

/// The query collaborator: reservations and blocks of a robot that may
/// intersect a window. Over-fetching is fine.
pub trait ScheduleSource {
    fn fetch(
        &self,
        resource_id: &str,
        window: &TimeInterval,
    ) -> std::result::Result<ScheduleSnapshot, Box<dyn std::error::Error + Send + Sync>>;
}

/// A fixed snapshot serves every query.
impl ScheduleSource for ScheduleSnapshot {
    fn fetch(
        &self,
        _resource_id: &str,
        _window: &TimeInterval,
    ) -> std::result::Result<ScheduleSnapshot, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    config: EngineConfig,
}

impl Scheduler {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Index `snapshot` for `resource_id` over `window` with this scheduler's
    /// timezone and DST policy.
    pub fn build_index(
        &self,
        resource_id: &str,
        window: TimeInterval,
        snapshot: &ScheduleSnapshot,
    ) -> Result<AvailabilityIndex> {
        AvailabilityIndex::from_snapshot(
            resource_id,
            window,
            snapshot,
            self.config.timezone,
            self.config.dst_policy,
        )
    }

    /// Booking policy first, then conflicts. Pure given its arguments.
    pub fn evaluate(
        &self,
        candidate: &TimeInterval,
        mode: BookingMode,
        now: DateTime<Utc>,
        index: &AvailabilityIndex,
    ) -> Decision {
        let decision = if let Some(violation) = self.config.policy.validate(candidate, now, mode) {
            Decision::Rejected {
                rejection: violation.into(),
            }
        } else if let Some(entry) = index.blocking_entry_for(candidate) {
            Decision::Rejected {
                rejection: entry.into(),
            }
        } else {
            Decision::Accepted {
                interval: *candidate,
            }
        };

        match &decision {
            Decision::Accepted { .. } => debug!(
                resource_id = index.resource_id(),
                start = %candidate.start,
                end = %candidate.end,
                "candidate accepted"
            ),
            Decision::Rejected { rejection } => debug!(
                resource_id = index.resource_id(),
                start = %candidate.start,
                end = %candidate.end,
                code = rejection.code(),
                "candidate rejected"
            ),
        }
        decision
    }

    /// Authoritative check: read the clock, fetch a fresh snapshot for the
    /// days around the candidate, and evaluate.
    ///
    /// Policy violations short-circuit before any fetch.
    ///
    /// # Errors
    /// `EngineError::Source` if the fetch fails, `InvalidConfiguration` if the
    /// fetched data holds a malformed recurrence pattern.
    pub fn authorize<S, C>(
        &self,
        resource_id: &str,
        candidate: &TimeInterval,
        mode: BookingMode,
        source: &S,
        clock: &C,
    ) -> Result<Decision>
    where
        S: ScheduleSource + ?Sized,
        C: Clock + ?Sized,
    {
        let now = clock.now();
        if let Some(violation) = self.config.policy.validate(candidate, now, mode) {
            debug!(resource_id, code = violation.code(), "candidate rejected by policy");
            return Ok(Decision::Rejected {
                rejection: violation.into(),
            });
        }

        let window = Self::query_window_for(candidate);
        let snapshot = source.fetch(resource_id, &window).map_err(EngineError::Source)?;
        let index = self.build_index(resource_id, window, &snapshot)?;
        Ok(self.evaluate(candidate, mode, now, &index))
    }

    /// A window covering every calendar day `candidate` touches, in any timezone.
    pub fn query_window_for(candidate: &TimeInterval) -> TimeInterval {
        TimeInterval::new(
            candidate.start - Duration::days(1),
            candidate.end + Duration::days(1),
        )
    }
}
