//! Drag-to-select over the booking grid, independent of any UI toolkit.
//!
//! The toolkit binding translates pointer events into calls:
//! pointer-down -> [`SlotSelector::begin`], pointer-move -> [`SlotSelector::extend`],
//! pointer-up anywhere (global listener) -> [`SlotSelector::finalize`].
//!
//! State machine: `Idle -> Dragging -> Idle`. Invalid gestures never raise an
//! error; they simply end in `Idle` with nothing emitted.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::availability::AvailabilityIndex;
use crate::config::EngineConfig;
use crate::interval::TimeInterval;
use crate::policy::{BookingMode, BookingWindowPolicy};

/// A finalized, policy-checked selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[serde(flatten)]
    pub interval: TimeInterval,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    Idle,
    Dragging {
        anchor: DateTime<Utc>,
        far: DateTime<Utc>,
    },
}

#[derive(Debug, Clone)]
pub struct SlotSelector {
    policy: BookingWindowPolicy,
    mode: BookingMode,
    default_duration: Duration,
    state: SelectorState,
}

impl SlotSelector {
    pub fn new(policy: BookingWindowPolicy, mode: BookingMode, default_duration_minutes: i64) -> Self {
        Self {
            policy,
            mode,
            // An unrepresentable length yields empty clicks, which never pass policy.
            default_duration: Duration::try_minutes(default_duration_minutes).unwrap_or_else(Duration::zero),
            state: SelectorState::Idle,
        }
    }

    pub fn from_config(config: &EngineConfig, mode: BookingMode) -> Self {
        Self::new(config.policy, mode, config.default_duration_minutes)
    }

    pub fn state(&self) -> SelectorState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, SelectorState::Dragging { .. })
    }

    /// Pointer-down at `at`. Starts a drag if the grid cell under the pointer
    /// is free and a selection may start there; returns whether it did. The
    /// anchor is the start of that cell.
    pub fn begin(&mut self, at: DateTime<Utc>, index: &AvailabilityIndex, now: DateTime<Utc>) -> bool {
        if self.is_dragging() {
            return false;
        }
        let cell = self.policy.cell_at(at);
        if !self.policy.is_eligible_start(cell.start, now, self.mode) {
            return false;
        }
        if index.is_blocked(&cell) {
            return false;
        }
        self.state = SelectorState::Dragging {
            anchor: cell.start,
            far: cell.start,
        };
        true
    }

    /// Pointer-move to `at`. The far end follows the pointer cell by cell
    /// and stops before the first blocked cell between the anchor and `at`.
    /// The anchor is not re-checked. Returns whether the far end reached the
    /// pointer's cell.
    pub fn extend(&mut self, at: DateTime<Utc>, index: &AvailabilityIndex) -> bool {
        let SelectorState::Dragging { anchor, far } = self.state else {
            return false;
        };
        let target = self.policy.floor_to_grid(at);
        if far == target {
            return true;
        }
        let reached = self.last_free_cell(anchor, target, index);
        self.state = SelectorState::Dragging { anchor, far: reached };
        reached == target
    }

    /// Walk from `anchor` toward `target` one cell at a time; the start of
    /// the last free cell before a blocked one, or `target`.
    fn last_free_cell(
        &self,
        anchor: DateTime<Utc>,
        target: DateTime<Utc>,
        index: &AvailabilityIndex,
    ) -> DateTime<Utc> {
        if self.policy.grid_quantum <= Duration::zero() {
            return anchor;
        }
        let step = if target > anchor {
            self.policy.grid_quantum
        } else {
            -self.policy.grid_quantum
        };
        let mut reached = anchor;
        while reached != target {
            let next = reached + step;
            if index.is_blocked(&self.policy.cell_at(next)) {
                break;
            }
            reached = next;
        }
        reached
    }

    /// The interval the current drag would produce, before policy checks.
    pub fn preview(&self) -> Option<TimeInterval> {
        match self.state {
            SelectorState::Idle => None,
            SelectorState::Dragging { anchor, far } => Some(self.span(anchor, far)),
        }
    }

    /// Pointer-up. Returns to `Idle` and emits the selection if it passes the
    /// booking policy; otherwise the gesture is dropped silently.
    pub fn finalize(&mut self, now: DateTime<Utc>) -> Option<Selection> {
        let SelectorState::Dragging { anchor, far } = std::mem::replace(&mut self.state, SelectorState::Idle)
        else {
            return None;
        };

        let interval = self.span(anchor, far);
        if let Some(violation) = self.policy.validate(&interval, now, self.mode) {
            debug!(code = violation.code(), "selection discarded");
            return None;
        }
        Some(Selection {
            interval,
            duration_minutes: interval.duration_minutes(),
        })
    }

    /// Abort the gesture without emitting anything.
    pub fn cancel(&mut self) {
        self.state = SelectorState::Idle;
    }

    /// Span between anchor and far end, ordered so `start <= end`.
    ///
    /// A click (anchor == far) yields the default duration. A drag includes the
    /// far end's whole grid cell, then the length is rounded up to whole quanta.
    fn span(&self, anchor: DateTime<Utc>, far: DateTime<Utc>) -> TimeInterval {
        let start = anchor.min(far);
        let last = anchor.max(far);
        if start == last {
            return TimeInterval::new(start, start + self.default_duration);
        }
        let raw_end = self.policy.floor_to_grid(last) + self.policy.grid_quantum;
        let duration = self.policy.round_up_to_grid(raw_end - start);
        TimeInterval::new(start, start + duration)
    }
}
