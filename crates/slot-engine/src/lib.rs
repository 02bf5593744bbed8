//! # slot-engine
//!
//! Time-slot scheduling and availability conflict engine for shared robots.
//!
//! Decides whether a proposed reservation interval is legal, finds what it
//! collides with (live reservations, one-time or recurring partner
//! unavailability), and expands weekly recurrence patterns into concrete
//! occurrences. The engine is pure and synchronous: the same inputs produce
//! the same answer in the browser (via `slot-engine-wasm`) and on the server.
//!
//! ## Modules
//!
//! - [`interval`]: half-open `TimeInterval` with overlap predicates
//! - [`recurrence`]: validated weekly recurrence patterns
//! - [`expander`]: pattern + canonical interval → occurrences in a window
//! - [`dst`]: DST gap/overlap resolution when re-anchoring local times
//! - [`model`]: reservations, availability blocks, snapshots
//! - [`availability`]: per-robot conflict index, busy/free views, occupancy grid
//! - [`freebusy`]: busy-period merging and free gaps
//! - [`conflict`]: reservations an availability block would collide with
//! - [`policy`]: booking-window rules and grid quantization
//! - [`selector`]: drag-selection state machine
//! - [`scheduler`]: accept/reject decisions and the authoritative re-check
//! - [`rejection`]: rejection codes and blocking entries
//! - [`clock`]: injected time source
//! - [`config`]: engine configuration
//! - [`error`]: error types

pub mod availability;
pub mod clock;
pub mod config;
pub mod conflict;
pub mod dst;
pub mod error;
pub mod expander;
pub mod freebusy;
pub mod interval;
pub mod model;
pub mod policy;
pub mod recurrence;
pub mod rejection;
pub mod scheduler;
pub mod selector;

pub use availability::{AvailabilityIndex, CellState, OccupancyCell};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use conflict::find_block_conflicts;
pub use dst::DstPolicy;
pub use error::EngineError;
pub use expander::expand;
pub use interval::TimeInterval;
pub use model::{AvailabilityBlock, Reservation, ReservationStatus, ScheduleSnapshot};
pub use policy::{BookingMode, BookingWindowPolicy, PolicyViolation};
pub use recurrence::Recurrence;
pub use rejection::{BlockingEntry, Rejection};
pub use scheduler::{Decision, ScheduleSource, Scheduler};
pub use selector::{Selection, SlotSelector};
