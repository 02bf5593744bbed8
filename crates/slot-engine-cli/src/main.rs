//! `slotctl`: run the slot engine against a JSON schedule snapshot.
//!
//! ## Usage
//!
//! ```sh
//! # Would this reservation be accepted? (exit 0 = accepted, 2 = rejected)
//! slotctl check --snapshot robot.json --resource R1 \
//!     --start 2026-03-02T10:00:00Z --end 2026-03-02T11:00:00Z
//!
//! # Expand a weekly pattern over two weeks
//! slotctl expand --pattern '{"type":"weekly","daysOfWeek":[1,3,5]}' \
//!     --start 2026-03-02T09:00:00Z --end 2026-03-02T10:00:00Z \
//!     --from 2026-03-02T00:00:00Z --to 2026-03-16T00:00:00Z
//!
//! # Free gaps of at least an hour, and the 15-minute occupancy grid
//! slotctl free --snapshot robot.json --resource R1 --from ... --to ... --min-minutes 60
//! slotctl occupancy --snapshot robot.json --resource R1 --from ... --to ...
//! ```
//!
//! The snapshot is read from stdin when `--snapshot` is omitted. Engine
//! settings come from `--config` (see `EngineConfig`), defaulting to UTC.

use std::io::{self, Read};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use slot_engine::{
    AvailabilityIndex, BookingMode, EngineConfig, FixedClock, Recurrence, ScheduleSnapshot,
    Scheduler, SystemClock, TimeInterval,
};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Exit status for a rejected candidate.
const EXIT_REJECTED: u8 = 2;

#[derive(Parser)]
#[command(name = "slotctl", version, about = "Robot reservation slot checks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine configuration JSON file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Override the configured timezone (IANA name)
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Log at debug level to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Accept or reject a candidate reservation
    Check {
        #[command(flatten)]
        source: SnapshotArgs,
        /// Candidate start (RFC 3339)
        #[arg(long)]
        start: String,
        /// Candidate end (RFC 3339)
        #[arg(long)]
        end: String,
        #[arg(long, value_enum, default_value_t = Mode::Booking)]
        mode: Mode,
        /// Evaluate as of this instant instead of the system clock (RFC 3339)
        #[arg(long)]
        now: Option<String>,
    },
    /// Expand a recurrence pattern into occurrences
    Expand {
        /// Pattern JSON, e.g. {"type":"weekly","daysOfWeek":[1,3,5]}
        #[arg(long)]
        pattern: String,
        /// Canonical interval start (RFC 3339)
        #[arg(long)]
        start: String,
        /// Canonical interval end (RFC 3339)
        #[arg(long)]
        end: String,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// List free gaps in a window
    Free {
        #[command(flatten)]
        source: SnapshotArgs,
        #[command(flatten)]
        window: WindowArgs,
        /// Drop gaps shorter than this
        #[arg(long, default_value_t = 0)]
        min_minutes: i64,
    },
    /// Per-cell Free/Reserved/Blocked grid for a window
    Occupancy {
        #[command(flatten)]
        source: SnapshotArgs,
        #[command(flatten)]
        window: WindowArgs,
    },
}

#[derive(Args)]
struct SnapshotArgs {
    /// Snapshot JSON file (reads from stdin if omitted)
    #[arg(short, long)]
    snapshot: Option<String>,
    /// Robot id
    #[arg(short, long)]
    resource: String,
}

#[derive(Args)]
struct WindowArgs {
    /// Window start (RFC 3339)
    #[arg(long)]
    from: String,
    /// Window end (RFC 3339)
    #[arg(long)]
    to: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Booking,
    Availability,
}

impl From<Mode> for BookingMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Booking => BookingMode::Booking,
            Mode::Availability => BookingMode::Availability,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string()))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = match cli.config.as_deref() {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("Failed to load config: {}", path))?,
        None => EngineConfig::default(),
    };
    if let Some(name) = cli.timezone.as_deref() {
        config = config.with_timezone(name)?;
    }
    let scheduler = Scheduler::new(config);

    match cli.command {
        Commands::Check {
            source,
            start,
            end,
            mode,
            now,
        } => {
            let snapshot = read_snapshot(source.snapshot.as_deref())?;
            let candidate = TimeInterval::new(parse_instant(&start)?, parse_instant(&end)?);
            let decision = match now.as_deref() {
                Some(now) => scheduler.authorize(
                    &source.resource,
                    &candidate,
                    mode.into(),
                    &snapshot,
                    &FixedClock(parse_instant(now)?),
                ),
                None => scheduler.authorize(&source.resource, &candidate, mode.into(), &snapshot, &SystemClock),
            }
            .context("Failed to check candidate")?;

            print_json(&decision)?;
            if decision.is_accepted() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(EXIT_REJECTED))
            }
        }
        Commands::Expand {
            pattern,
            start,
            end,
            window,
        } => {
            let pattern = Recurrence::from_json(&pattern).context("Invalid recurrence pattern")?;
            let canonical = TimeInterval::new(parse_instant(&start)?, parse_instant(&end)?);
            let config = scheduler.config();
            let occurrences = slot_engine::expand(
                &pattern,
                &canonical,
                &window.interval()?,
                config.timezone,
                config.dst_policy,
            )?;
            print_json(&occurrences)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Free {
            source,
            window,
            min_minutes,
        } => {
            let index = build_index(&scheduler, &source, &window)?;
            print_json(&index.free_slots(min_minutes))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Occupancy { source, window } => {
            let index = build_index(&scheduler, &source, &window)?;
            let quantum = scheduler.config().policy.grid_quantum;
            print_json(&index.occupancy(quantum))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

impl WindowArgs {
    fn interval(&self) -> Result<TimeInterval> {
        let window = TimeInterval::new(parse_instant(&self.from)?, parse_instant(&self.to)?);
        anyhow::ensure!(window.is_well_formed(), "--to must be after --from");
        Ok(window)
    }
}

fn build_index(scheduler: &Scheduler, source: &SnapshotArgs, window: &WindowArgs) -> Result<AvailabilityIndex> {
    let snapshot = read_snapshot(source.snapshot.as_deref())?;
    let index = scheduler.build_index(&source.resource, window.interval()?, &snapshot)?;
    Ok(index)
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid RFC 3339 timestamp: '{}'", raw))
}

fn read_snapshot(path: Option<&str>) -> Result<ScheduleSnapshot> {
    let json = match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))?
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            buf
        }
    };
    ScheduleSnapshot::from_json(&json).context("Invalid schedule snapshot")
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
