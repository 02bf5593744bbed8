//! Per-robot availability index over a query window.
//!
//! The index is a read-only view rebuilt for every window. It collects the
//! live reservations and the (expanded) unavailability blocks of one robot and
//! answers whether a candidate interval is blocked, and by what.
//!
//! Reservations are always checked before blocks: a slot that is both reserved
//! and blacked out is reported as reserved, because reservation conflicts feed
//! different refund/cancellation flows than partner blackouts.

use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dst::DstPolicy;
use crate::error::Result;
use crate::freebusy::{self, FreeSlot};
use crate::interval::TimeInterval;
use crate::model::{AvailabilityBlock, Reservation, ScheduleSnapshot};
use crate::policy;
use crate::rejection::BlockingEntry;

/// Display state of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    Free,
    Reserved,
    Blocked,
}

/// One cell of the week-view occupancy grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyCell {
    #[serde(flatten)]
    pub interval: TimeInterval,
    pub state: CellState,
}

/// A concrete block interval inside the index window.
#[derive(Debug, Clone, PartialEq)]
struct Occurrence {
    block: usize,
    interval: TimeInterval,
}

/// Reservations and unavailability of one robot, ready for conflict checks.
#[derive(Debug, Clone)]
pub struct AvailabilityIndex {
    resource_id: String,
    window: TimeInterval,
    tz: Tz,
    dst: DstPolicy,
    /// Live reservations of this robot, sorted by `(start, id)`.
    reservations: Vec<Reservation>,
    /// Blocks of this robot, patterns already validated.
    blocks: Vec<AvailabilityBlock>,
    /// Block occurrences intersecting `window`, sorted by start.
    occurrences: Vec<Occurrence>,
}

impl AvailabilityIndex {
    /// Build the index for `resource_id` over `window`.
    ///
    /// Records for other robots and reservations in inert statuses are
    /// dropped. Every recurring block is expanded once here.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidConfiguration` if any block carries a
    /// malformed recurrence pattern.
    pub fn build(
        resource_id: &str,
        window: TimeInterval,
        reservations: &[Reservation],
        blocks: &[AvailabilityBlock],
        tz: Tz,
        dst: DstPolicy,
    ) -> Result<Self> {
        let mut live: Vec<Reservation> = reservations
            .iter()
            .filter(|r| r.resource_id == resource_id && r.status.is_live())
            .cloned()
            .collect();
        live.sort_by(|a, b| (a.interval.start, &a.id).cmp(&(b.interval.start, &b.id)));

        let own_blocks: Vec<AvailabilityBlock> = blocks
            .iter()
            .filter(|b| b.resource_id == resource_id)
            .cloned()
            .collect();
        for block in &own_blocks {
            if let Some(pattern) = &block.recurrence {
                pattern.validate()?;
            }
        }

        let mut occurrences: Vec<Occurrence> = own_blocks
            .iter()
            .enumerate()
            .flat_map(|(i, block)| {
                block
                    .occurrences_validated(&window, tz, dst)
                    .into_iter()
                    .map(move |interval| Occurrence { block: i, interval })
            })
            .collect();
        occurrences.sort_by_key(|o| (o.interval.start, o.block));

        debug!(
            resource_id,
            reservations = live.len(),
            blocks = own_blocks.len(),
            occurrences = occurrences.len(),
            "built availability index"
        );

        Ok(Self {
            resource_id: resource_id.to_string(),
            window,
            tz,
            dst,
            reservations: live,
            blocks: own_blocks,
            occurrences,
        })
    }

    /// Build from a query collaborator snapshot.
    pub fn from_snapshot(
        resource_id: &str,
        window: TimeInterval,
        snapshot: &ScheduleSnapshot,
        tz: Tz,
        dst: DstPolicy,
    ) -> Result<Self> {
        Self::build(
            resource_id,
            window,
            &snapshot.reservations,
            &snapshot.blocks,
            tz,
            dst,
        )
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn window(&self) -> &TimeInterval {
        &self.window
    }

    /// Live reservations, sorted by start.
    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    /// Block intervals inside the window with the id of their block, sorted by start.
    pub fn block_occurrences(&self) -> impl Iterator<Item = (&str, &TimeInterval)> + '_ {
        self.occurrences
            .iter()
            .map(|o| (self.blocks[o.block].id.as_str(), &o.interval))
    }

    /// First entry that overlaps `candidate`, or `None` if the slot is free.
    ///
    /// Reservations win over blocks. Within each kind the earliest-starting
    /// entry is returned. Candidates outside the index window are still
    /// answered: recurring blocks are expanded over the candidate's own days.
    pub fn blocking_entry_for(&self, candidate: &TimeInterval) -> Option<BlockingEntry> {
        if let Some(r) = self
            .reservations
            .iter()
            .find(|r| r.interval.overlaps(candidate))
        {
            return Some(BlockingEntry::Reservation {
                reservation_id: r.id.clone(),
                interval: r.interval,
            });
        }

        let (block, occurrence) = if self.window.covers(candidate) {
            self.occurrences
                .iter()
                .find(|o| o.interval.overlaps(candidate))
                .map(|o| (o.block, o.interval))?
        } else {
            self.first_occurrence_outside_window(candidate)?
        };

        let block = &self.blocks[block];
        Some(BlockingEntry::Availability {
            block_id: block.id.clone(),
            occurrence,
            reason: block.reason.clone(),
        })
    }

    pub fn is_blocked(&self, candidate: &TimeInterval) -> bool {
        self.blocking_entry_for(candidate).is_some()
    }

    fn first_occurrence_outside_window(&self, candidate: &TimeInterval) -> Option<(usize, TimeInterval)> {
        self.blocks
            .iter()
            .enumerate()
            .flat_map(|(i, block)| {
                block
                    .occurrences_validated(candidate, self.tz, self.dst)
                    .into_iter()
                    .map(move |interval| (i, interval))
            })
            .min_by_key(|(i, interval)| (interval.start, *i))
    }

    /// Merged busy periods (reservations and blocks) clipped to the window.
    pub fn busy_intervals(&self) -> Vec<TimeInterval> {
        freebusy::merge_busy(&self.all_busy(), &self.window)
    }

    /// Free gaps in the window lasting at least `min_duration_minutes`.
    pub fn free_slots(&self, min_duration_minutes: i64) -> Vec<FreeSlot> {
        freebusy::free_slots(&self.all_busy(), &self.window)
            .into_iter()
            .filter(|slot| slot.duration_minutes >= min_duration_minutes)
            .collect()
    }

    /// State of every `quantum` cell covering the window, for grid rendering.
    ///
    /// Cells are aligned to multiples of `quantum` since the Unix epoch, the
    /// same cells the selector uses, so the first cell may begin before the
    /// window start. A cell is `Reserved` if any live reservation touches it,
    /// else `Blocked` if a block occurrence does.
    pub fn occupancy(&self, quantum: Duration) -> Vec<OccupancyCell> {
        let mut cells = Vec::new();
        if quantum <= Duration::zero() {
            return cells;
        }

        let mut cursor = policy::floor_to_quantum(self.window.start, quantum);
        while cursor < self.window.end {
            let interval = TimeInterval::new(cursor, cursor + quantum);
            let state = match self.blocking_entry_for(&interval) {
                None => CellState::Free,
                Some(BlockingEntry::Reservation { .. }) => CellState::Reserved,
                Some(BlockingEntry::Availability { .. }) => CellState::Blocked,
            };
            cells.push(OccupancyCell { interval, state });
            cursor += quantum;
        }
        cells
    }

    fn all_busy(&self) -> Vec<TimeInterval> {
        self.reservations
            .iter()
            .map(|r| r.interval)
            .chain(self.occurrences.iter().map(|o| o.interval))
            .collect()
    }
}
