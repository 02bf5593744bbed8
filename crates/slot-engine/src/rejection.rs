//! The closed set of reasons a candidate interval is refused.
//!
//! Codes are stable strings shown verbatim by the UI: `MALFORMED`,
//! `TOO_SHORT`, `TOO_SOON`, `TOO_FAR`, `BLOCKED_BY_RESERVATION`,
//! `BLOCKED_BY_AVAILABILITY`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::interval::TimeInterval;
use crate::policy::PolicyViolation;

/// The entry that makes a candidate unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BlockingEntry {
    /// A live reservation overlaps the candidate.
    #[serde(rename_all = "camelCase")]
    Reservation {
        reservation_id: String,
        interval: TimeInterval,
    },
    /// A partner unavailability block (or one occurrence of it) overlaps.
    #[serde(rename_all = "camelCase")]
    Availability {
        block_id: String,
        occurrence: TimeInterval,
        reason: Option<String>,
    },
}

impl BlockingEntry {
    pub fn code(&self) -> &'static str {
        match self {
            BlockingEntry::Reservation { .. } => "BLOCKED_BY_RESERVATION",
            BlockingEntry::Availability { .. } => "BLOCKED_BY_AVAILABILITY",
        }
    }

    /// The concrete interval that collided with the candidate.
    pub fn interval(&self) -> &TimeInterval {
        match self {
            BlockingEntry::Reservation { interval, .. } => interval,
            BlockingEntry::Availability { occurrence, .. } => occurrence,
        }
    }
}

/// Why a candidate was refused: a policy violation or a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rejection {
    Malformed,
    TooShort,
    TooSoon,
    TooFar,
    #[serde(rename_all = "camelCase")]
    BlockedByReservation {
        reservation_id: String,
        interval: TimeInterval,
    },
    #[serde(rename_all = "camelCase")]
    BlockedByAvailability {
        block_id: String,
        occurrence: TimeInterval,
        reason: Option<String>,
    },
}

impl Rejection {
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::Malformed => PolicyViolation::Malformed.code(),
            Rejection::TooShort => PolicyViolation::TooShort.code(),
            Rejection::TooSoon => PolicyViolation::TooSoon.code(),
            Rejection::TooFar => PolicyViolation::TooFar.code(),
            Rejection::BlockedByReservation { .. } => "BLOCKED_BY_RESERVATION",
            Rejection::BlockedByAvailability { .. } => "BLOCKED_BY_AVAILABILITY",
        }
    }

    /// Policy violations can be fixed by picking another time; conflicts need
    /// a different slot altogether.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Rejection::BlockedByReservation { .. } | Rejection::BlockedByAvailability { .. }
        )
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<PolicyViolation> for Rejection {
    fn from(v: PolicyViolation) -> Self {
        match v {
            PolicyViolation::Malformed => Rejection::Malformed,
            PolicyViolation::TooShort => Rejection::TooShort,
            PolicyViolation::TooSoon => Rejection::TooSoon,
            PolicyViolation::TooFar => Rejection::TooFar,
        }
    }
}

impl From<BlockingEntry> for Rejection {
    fn from(entry: BlockingEntry) -> Self {
        match entry {
            BlockingEntry::Reservation {
                reservation_id,
                interval,
            } => Rejection::BlockedByReservation {
                reservation_id,
                interval,
            },
            BlockingEntry::Availability {
                block_id,
                occurrence,
                reason,
            } => Rejection::BlockedByAvailability {
                block_id,
                occurrence,
                reason,
            },
        }
    }
}
