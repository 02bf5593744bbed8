use std::hint::black_box;

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use slot_engine::{
    AvailabilityBlock, BookingMode, EngineConfig, FixedClock, Recurrence, Reservation,
    ReservationStatus, ScheduleSnapshot, Scheduler, TimeInterval,
};

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap()
}

// `count` one-hour confirmed reservations with one-hour gaps.
fn reservations(count: i64) -> Vec<Reservation> {
    (0..count)
        .map(|i| {
            let start = base() + Duration::hours(2 * i);
            Reservation {
                id: format!("r{i}"),
                resource_id: "R1".to_string(),
                interval: TimeInterval::new(start, start + Duration::hours(1)),
                status: ReservationStatus::Confirmed,
            }
        })
        .collect()
}

// One recurring block per weekday, each at a different hour.
fn weekly_blocks() -> Vec<AvailabilityBlock> {
    (0u8..7)
        .map(|day| {
            let start = base() + Duration::hours(i64::from(day) + 1);
            AvailabilityBlock {
                id: format!("b{day}"),
                resource_id: "R1".to_string(),
                interval: TimeInterval::new(start, start + Duration::minutes(45)),
                reason: None,
                recurrence: Some(Recurrence::weekly([day], None).unwrap()),
            }
        })
        .collect()
}

fn benchmark_recheck(c: &mut Criterion) {
    let mut group = c.benchmark_group("authorize");
    let scheduler = Scheduler::new(EngineConfig::default());
    let clock = FixedClock(base() - Duration::days(1));
    let candidate = TimeInterval::new(
        base() + Duration::days(3) + Duration::minutes(30),
        base() + Duration::days(3) + Duration::minutes(90),
    );

    let empty = ScheduleSnapshot::default();
    group.bench_function("empty_schedule", |b| {
        b.iter(|| {
            scheduler.authorize(
                black_box("R1"),
                black_box(&candidate),
                BookingMode::Booking,
                black_box(&empty),
                &clock,
            )
        })
    });

    let busy = ScheduleSnapshot {
        reservations: reservations(200),
        blocks: weekly_blocks(),
    };
    group.bench_function("200_reservations_7_weekly_blocks", |b| {
        b.iter(|| {
            scheduler.authorize(
                black_box("R1"),
                black_box(&candidate),
                BookingMode::Booking,
                black_box(&busy),
                &clock,
            )
        })
    });
    group.finish();

    let mut group = c.benchmark_group("occupancy");
    let month = TimeInterval::new(base(), base() + Duration::days(28));
    group.bench_function("four_weeks_15_minute_grid", |b| {
        b.iter(|| {
            let index = scheduler.build_index("R1", black_box(month), &busy).unwrap();
            index.occupancy(Duration::minutes(15))
        })
    });
    group.finish();
}

criterion_group!(benches, benchmark_recheck);
criterion_main!(benches);
