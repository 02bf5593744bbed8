//! WASM bindings for slot-engine.
//!
//! Lets the booking UI run the exact checks the server runs. Complex values
//! cross the boundary as JSON strings in the engine's camelCase wire format:
//! configuration (`EngineConfig`, empty string for defaults), schedule
//! snapshots (`{reservations, blocks}`), decisions and blocking entries.
//! Timestamps are RFC 3339 strings.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p slot-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir packages/slot-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/slot_engine_wasm.wasm
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use slot_engine::{
    AvailabilityIndex, BookingMode, EngineConfig, FixedClock, Recurrence, ScheduleSnapshot,
    Scheduler, TimeInterval,
};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Boundary helpers. These return `String` errors so they can be unit tested
// off-wasm; the exports convert to `JsValue`.
// ---------------------------------------------------------------------------

type BindResult<T> = Result<T, String>;

fn to_js(e: String) -> JsValue {
    JsValue::from_str(&e)
}

/// Parse an RFC 3339 string, or a naive `YYYY-MM-DDTHH:MM:SS` taken as UTC.
fn parse_datetime(s: &str) -> BindResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| format!("Invalid datetime '{}': {}", s, e))
}

fn parse_interval(start: &str, end: &str) -> BindResult<TimeInterval> {
    Ok(TimeInterval::new(parse_datetime(start)?, parse_datetime(end)?))
}

fn parse_config(json: &str) -> BindResult<EngineConfig> {
    if json.trim().is_empty() {
        return Ok(EngineConfig::default());
    }
    EngineConfig::from_json_str(json).map_err(|e| e.to_string())
}

fn parse_snapshot(json: &str) -> BindResult<ScheduleSnapshot> {
    ScheduleSnapshot::from_json(json).map_err(|e| e.to_string())
}

fn parse_mode(mode: &str) -> BindResult<BookingMode> {
    match mode {
        "booking" => Ok(BookingMode::Booking),
        "availability" => Ok(BookingMode::Availability),
        other => Err(format!("Unknown mode '{}': expected booking or availability", other)),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> BindResult<String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

fn build_index(
    config: &EngineConfig,
    snapshot_json: &str,
    resource_id: &str,
    window: TimeInterval,
) -> BindResult<AvailabilityIndex> {
    let snapshot = parse_snapshot(snapshot_json)?;
    Scheduler::new(config.clone())
        .build_index(resource_id, window, &snapshot)
        .map_err(|e| e.to_string())
}

fn check_candidate_json(
    config_json: &str,
    snapshot_json: &str,
    resource_id: &str,
    start: &str,
    end: &str,
    mode: &str,
    now: &str,
) -> BindResult<String> {
    let scheduler = Scheduler::new(parse_config(config_json)?);
    let snapshot = parse_snapshot(snapshot_json)?;
    let candidate = parse_interval(start, end)?;
    let clock = FixedClock(parse_datetime(now)?);
    let decision = scheduler
        .authorize(resource_id, &candidate, parse_mode(mode)?, &snapshot, &clock)
        .map_err(|e| e.to_string())?;
    to_json(&decision)
}

fn expand_recurrence_json(
    pattern_json: &str,
    canonical_start: &str,
    canonical_end: &str,
    window_start: &str,
    window_end: &str,
    config_json: &str,
) -> BindResult<String> {
    let config = parse_config(config_json)?;
    let pattern = Recurrence::from_json(pattern_json).map_err(|e| e.to_string())?;
    let occurrences = slot_engine::expand(
        &pattern,
        &parse_interval(canonical_start, canonical_end)?,
        &parse_interval(window_start, window_end)?,
        config.timezone,
        config.dst_policy,
    )
    .map_err(|e| e.to_string())?;
    to_json(&occurrences)
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Accept or reject a candidate reservation as of `now`.
///
/// Returns a `Decision` JSON string: `{"status":"accepted","interval":{..}}`
/// or `{"status":"rejected","rejection":{"code":"TOO_SOON",..}}`.
/// `mode` is `"booking"` or `"availability"`.
#[wasm_bindgen(js_name = "checkCandidate")]
pub fn check_candidate(
    config_json: &str,
    snapshot_json: &str,
    resource_id: &str,
    start: &str,
    end: &str,
    mode: &str,
    now: &str,
) -> Result<String, JsValue> {
    check_candidate_json(config_json, snapshot_json, resource_id, start, end, mode, now).map_err(to_js)
}

/// Expand a recurrence pattern (`{"type":"weekly","daysOfWeek":[..],"endDate":..}`)
/// over a window. Returns a JSON array of `{start, end}` objects.
#[wasm_bindgen(js_name = "expandRecurrence")]
pub fn expand_recurrence(
    pattern_json: &str,
    canonical_start: &str,
    canonical_end: &str,
    window_start: &str,
    window_end: &str,
    config_json: &str,
) -> Result<String, JsValue> {
    expand_recurrence_json(
        pattern_json,
        canonical_start,
        canonical_end,
        window_start,
        window_end,
        config_json,
    )
    .map_err(to_js)
}

/// The entry blocking `[start, end)`, as JSON, or `"null"` when it is free.
/// Ignores booking policy.
#[wasm_bindgen(js_name = "blockingEntryFor")]
pub fn blocking_entry_for(
    config_json: &str,
    snapshot_json: &str,
    resource_id: &str,
    start: &str,
    end: &str,
) -> Result<String, JsValue> {
    let run = || -> BindResult<String> {
        let config = parse_config(config_json)?;
        let candidate = parse_interval(start, end)?;
        let index = build_index(&config, snapshot_json, resource_id, Scheduler::query_window_for(&candidate))?;
        to_json(&index.blocking_entry_for(&candidate))
    };
    run().map_err(to_js)
}

/// Occupancy grid (`[{start, end, state}]`, state `free|reserved|blocked`)
/// for a window, one cell per grid quantum.
#[wasm_bindgen(js_name = "occupancyGrid")]
pub fn occupancy_grid(
    config_json: &str,
    snapshot_json: &str,
    resource_id: &str,
    window_start: &str,
    window_end: &str,
) -> Result<String, JsValue> {
    let run = || -> BindResult<String> {
        let config = parse_config(config_json)?;
        let window = parse_interval(window_start, window_end)?;
        let index = build_index(&config, snapshot_json, resource_id, window)?;
        to_json(&index.occupancy(config.policy.grid_quantum))
    };
    run().map_err(to_js)
}

/// Drag-to-select over one robot's grid for a displayed window.
///
/// Wire pointer-down to `begin`, pointer-move to `extend`, and a global
/// pointer-up listener to `finalize`.
#[wasm_bindgen(js_name = "SlotSelector")]
pub struct WasmSlotSelector {
    selector: slot_engine::SlotSelector,
    index: AvailabilityIndex,
}

#[wasm_bindgen(js_class = "SlotSelector")]
impl WasmSlotSelector {
    #[wasm_bindgen(constructor)]
    pub fn new(
        config_json: &str,
        snapshot_json: &str,
        resource_id: &str,
        window_start: &str,
        window_end: &str,
        mode: &str,
    ) -> Result<WasmSlotSelector, JsValue> {
        let run = || -> BindResult<WasmSlotSelector> {
            let config = parse_config(config_json)?;
            let window = parse_interval(window_start, window_end)?;
            let index = build_index(&config, snapshot_json, resource_id, window)?;
            Ok(WasmSlotSelector {
                selector: slot_engine::SlotSelector::from_config(&config, parse_mode(mode)?),
                index,
            })
        };
        run().map_err(to_js)
    }

    pub fn begin(&mut self, at: &str, now: &str) -> Result<bool, JsValue> {
        let at = parse_datetime(at).map_err(to_js)?;
        let now = parse_datetime(now).map_err(to_js)?;
        Ok(self.selector.begin(at, &self.index, now))
    }

    pub fn extend(&mut self, at: &str) -> Result<bool, JsValue> {
        let at = parse_datetime(at).map_err(to_js)?;
        Ok(self.selector.extend(at, &self.index))
    }

    /// `{start, end, durationMinutes}` JSON, or `undefined` when the gesture
    /// was discarded.
    pub fn finalize(&mut self, now: &str) -> Result<Option<String>, JsValue> {
        let now = parse_datetime(now).map_err(to_js)?;
        self.selector
            .finalize(now)
            .map(|selection| to_json(&selection))
            .transpose()
            .map_err(to_js)
    }

    pub fn cancel(&mut self) {
        self.selector.cancel();
    }

    #[wasm_bindgen(js_name = "isDragging")]
    pub fn is_dragging(&self) -> bool {
        self.selector.is_dragging()
    }

    /// Provisional `{start, end}` of the current drag.
    pub fn preview(&self) -> Result<Option<String>, JsValue> {
        self.selector.preview().map(|interval| to_json(&interval)).transpose().map_err(to_js)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "reservations": [
            {"id":"r1","resourceId":"R1","start":"2026-03-02T10:00:00Z","end":"2026-03-02T10:30:00Z","status":"confirmed"}
        ],
        "blocks": [
            {"id":"mondays","resourceId":"R1","start":"2026-03-02T09:00:00Z","end":"2026-03-02T10:00:00Z",
             "recurrence":{"type":"weekly","daysOfWeek":[1]}}
        ]
    }"#;

    const NOW: &str = "2026-03-02T08:00:00Z";

    #[test]
    fn naive_datetime_is_utc() {
        assert_eq!(
            parse_datetime("2026-03-02T10:00:00").unwrap(),
            parse_datetime("2026-03-02T10:00:00Z").unwrap()
        );
        assert!(parse_datetime("monday").is_err());
    }

    #[test]
    fn check_candidate_reports_reservation() {
        let json = check_candidate_json(
            "",
            SNAPSHOT,
            "R1",
            "2026-03-02T10:15:00Z",
            "2026-03-02T10:45:00Z",
            "booking",
            NOW,
        )
        .unwrap();
        let decision: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(decision["status"], "rejected");
        assert_eq!(decision["rejection"]["code"], "BLOCKED_BY_RESERVATION");
    }

    #[test]
    fn check_candidate_accepts_free_slot() {
        let json = check_candidate_json(
            "",
            SNAPSHOT,
            "R1",
            "2026-03-03T09:00:00Z",
            "2026-03-03T10:00:00Z",
            "booking",
            NOW,
        )
        .unwrap();
        assert!(json.contains(r#""status":"accepted""#));
    }

    #[test]
    fn unknown_mode_is_an_error() {
        let err = check_candidate_json("", SNAPSHOT, "R1", NOW, NOW, "rental", NOW).unwrap_err();
        assert!(err.contains("rental"));
    }

    #[test]
    fn expand_recurrence_uses_config_timezone() {
        // 09:00 UTC is 18:00 in Tokyo; Monday in Tokyo is still Monday here.
        let json = expand_recurrence_json(
            r#"{"type":"weekly","daysOfWeek":[1]}"#,
            "2026-03-02T09:00:00Z",
            "2026-03-02T10:00:00Z",
            "2026-03-01T00:00:00Z",
            "2026-03-15T00:00:00Z",
            r#"{"timezone":"Asia/Tokyo"}"#,
        )
        .unwrap();
        let occurrences: Vec<TimeInterval> = serde_json::from_str(&json).unwrap();
        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences[1].start, parse_datetime("2026-03-09T09:00:00Z").unwrap());
    }

    #[test]
    fn bad_config_is_an_error() {
        assert!(parse_config(r#"{"timezone":"Nowhere/Special"}"#).is_err());
        assert_eq!(parse_config("  ").unwrap(), EngineConfig::default());
    }
}
