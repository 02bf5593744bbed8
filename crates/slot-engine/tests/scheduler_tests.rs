//! Tests for accept/reject decisions and the authoritative re-check.

use std::cell::RefCell;

use chrono::{DateTime, TimeZone, Utc};
use slot_engine::{
    AvailabilityBlock, BookingMode, Decision, EngineConfig, EngineError, FixedClock, Recurrence,
    Rejection, Reservation, ReservationStatus, ScheduleSnapshot, ScheduleSource, Scheduler,
    TimeInterval,
};

/// March `day`, 2026 at `h:m` UTC (the 2nd is a Monday).
fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, h, m, 0).unwrap()
}

fn now() -> DateTime<Utc> {
    at(2, 8, 0)
}

fn reservation(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Reservation {
    Reservation {
        id: id.to_string(),
        resource_id: "R1".to_string(),
        interval: TimeInterval::new(start, end),
        status: ReservationStatus::Confirmed,
    }
}

fn snapshot() -> ScheduleSnapshot {
    ScheduleSnapshot {
        reservations: vec![reservation("r1", at(2, 10, 0), at(2, 10, 30))],
        blocks: vec![AvailabilityBlock {
            id: "mondays".to_string(),
            resource_id: "R1".to_string(),
            interval: TimeInterval::new(at(2, 9, 0), at(2, 10, 0)),
            reason: Some("charging".to_string()),
            recurrence: Some(Recurrence::weekly([1], None).unwrap()),
        }],
    }
}

fn scheduler() -> Scheduler {
    Scheduler::new(EngineConfig::default())
}

/// A source whose data can change between calls.
struct LiveSource(RefCell<ScheduleSnapshot>);

impl ScheduleSource for LiveSource {
    fn fetch(
        &self,
        _resource_id: &str,
        _window: &TimeInterval,
    ) -> Result<ScheduleSnapshot, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0.borrow().clone())
    }
}

struct FailingSource;

impl ScheduleSource for FailingSource {
    fn fetch(
        &self,
        _resource_id: &str,
        _window: &TimeInterval,
    ) -> Result<ScheduleSnapshot, Box<dyn std::error::Error + Send + Sync>> {
        Err("table unavailable".into())
    }
}

#[test]
fn reserved_slot_is_rejected_with_reservation() {
    let candidate = TimeInterval::new(at(2, 10, 15), at(2, 10, 45));
    let decision = scheduler()
        .authorize("R1", &candidate, BookingMode::Booking, &snapshot(), &FixedClock(now()))
        .unwrap();
    assert_eq!(
        decision,
        Decision::Rejected {
            rejection: Rejection::BlockedByReservation {
                reservation_id: "r1".to_string(),
                interval: TimeInterval::new(at(2, 10, 0), at(2, 10, 30)),
            }
        }
    );
}

#[test]
fn recurring_block_rejects_following_monday_only() {
    let s = scheduler();
    let tuesday = TimeInterval::new(at(3, 9, 30), at(3, 9, 45));
    let monday = TimeInterval::new(at(9, 9, 30), at(9, 9, 45));

    let ok = s
        .authorize("R1", &tuesday, BookingMode::Booking, &snapshot(), &FixedClock(now()))
        .unwrap();
    assert!(ok.is_accepted());

    let blocked = s
        .authorize("R1", &monday, BookingMode::Booking, &snapshot(), &FixedClock(now()))
        .unwrap();
    assert_eq!(blocked.rejection().map(Rejection::code), Some("BLOCKED_BY_AVAILABILITY"));
}

#[test]
fn policy_is_checked_before_conflicts() {
    // Overlaps r1 but also starts inside the lead time: TOO_SOON wins.
    let candidate = TimeInterval::new(at(2, 8, 30), at(2, 10, 15));
    let decision = scheduler()
        .authorize("R1", &candidate, BookingMode::Booking, &snapshot(), &FixedClock(now()))
        .unwrap();
    assert_eq!(decision.rejection(), Some(&Rejection::TooSoon));
}

#[test]
fn policy_violation_needs_no_fetch() {
    let candidate = TimeInterval::new(at(2, 8, 30), at(2, 9, 30));
    let decision = scheduler()
        .authorize("R1", &candidate, BookingMode::Booking, &FailingSource, &FixedClock(now()))
        .unwrap();
    assert_eq!(decision.rejection(), Some(&Rejection::TooSoon));
}

#[test]
fn source_failure_is_an_error() {
    let candidate = TimeInterval::new(at(3, 12, 0), at(3, 13, 0));
    let err = scheduler()
        .authorize("R1", &candidate, BookingMode::Booking, &FailingSource, &FixedClock(now()))
        .unwrap_err();
    assert!(matches!(err, EngineError::Source(_)));
}

#[test]
fn server_recheck_sees_booking_confirmed_after_client_check() {
    let s = scheduler();
    let candidate = TimeInterval::new(at(3, 12, 0), at(3, 13, 0));
    let source = LiveSource(RefCell::new(snapshot()));

    // Client-side check against the snapshot it fetched earlier.
    let client_index = s
        .build_index("R1", Scheduler::query_window_for(&candidate), &source.0.borrow())
        .unwrap();
    assert!(s
        .evaluate(&candidate, BookingMode::Booking, now(), &client_index)
        .is_accepted());

    // Someone else's booking lands in between.
    source
        .0
        .borrow_mut()
        .reservations
        .push(reservation("r2", at(3, 12, 30), at(3, 14, 0)));

    let decision = s
        .authorize("R1", &candidate, BookingMode::Booking, &source, &FixedClock(now()))
        .unwrap();
    assert_eq!(decision.rejection().map(Rejection::code), Some("BLOCKED_BY_RESERVATION"));
}

#[test]
fn availability_mode_skips_lead_time_but_not_conflicts() {
    let s = scheduler();
    let soon = TimeInterval::new(at(2, 8, 15), at(2, 8, 45));
    assert!(s
        .authorize("R1", &soon, BookingMode::Availability, &snapshot(), &FixedClock(now()))
        .unwrap()
        .is_accepted());

    let over_reservation = TimeInterval::new(at(2, 10, 0), at(2, 11, 0));
    let decision = s
        .authorize("R1", &over_reservation, BookingMode::Availability, &snapshot(), &FixedClock(now()))
        .unwrap();
    assert!(decision.rejection().is_some_and(Rejection::is_conflict));
}

#[test]
fn decision_serializes_for_the_wire() {
    let json = serde_json::to_value(Decision::Rejected {
        rejection: Rejection::TooFar,
    })
    .unwrap();
    assert_eq!(
        json,
        serde_json::json!({"status": "rejected", "rejection": {"code": "TOO_FAR"}})
    );
}
