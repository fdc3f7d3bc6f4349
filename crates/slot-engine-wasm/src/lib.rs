//! WASM bindings for slot-engine.
//!
//! Exposes meeting scheduling and single-attendee free-slot computation to
//! JavaScript via `wasm-bindgen`. Requests and results cross the boundary as
//! JSON strings.
//!
//! The `gather` feature is off here: fetching calendars is the host's job.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p slot-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target nodejs --out-dir packages/slot-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/slot_engine_wasm.wasm
//! ```

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};
use slot_engine::{MeetingRequest, TimeInterval};
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct FreeSlotDto {
    start: String,
    end: String,
    duration_minutes: i64,
}

impl From<&TimeInterval> for FreeSlotDto {
    fn from(slot: &TimeInterval) -> Self {
        Self {
            start: slot.start().to_rfc3339(),
            end: slot.end().to_rfc3339(),
            duration_minutes: slot.duration().num_minutes(),
        }
    }
}

/// Busy interval as passed from JavaScript. Naive timestamps are accepted.
#[derive(Deserialize)]
struct BusyInput {
    start: String,
    end: String,
}

/// Parse an RFC 3339 timestamp, or a naive `YYYY-MM-DDTHH:MM:SS` taken as UTC.
fn parse_datetime(s: &str) -> Result<DateTime<FixedOffset>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc().fixed_offset())
        .map_err(|e| format!("Invalid datetime '{}': {}", s, e))
}

fn parse_busy_json(json: &str) -> Result<Vec<TimeInterval>, String> {
    let inputs: Vec<BusyInput> =
        serde_json::from_str(json).map_err(|e| format!("Invalid busy JSON: {}", e))?;

    inputs
        .into_iter()
        .map(|input| {
            let start = parse_datetime(&input.start)?;
            let end = parse_datetime(&input.end)?;
            TimeInterval::new(start, end).map_err(|e| e.to_string())
        })
        .collect()
}

fn schedule_json(request_json: &str) -> Result<String, String> {
    let request: MeetingRequest = serde_json::from_str(request_json)
        .map_err(|e| format!("Invalid meeting request JSON: {}", e))?;
    let outcome = slot_engine::schedule_meeting(&request).map_err(|e| e.to_string())?;
    serde_json::to_string(&outcome).map_err(|e| format!("Serialization error: {}", e))
}

fn free_slots_json(busy_json: &str, range_start: &str, range_end: &str) -> Result<String, String> {
    let busy = parse_busy_json(busy_json)?;
    let range = TimeInterval::new(parse_datetime(range_start)?, parse_datetime(range_end)?)
        .map_err(|e| e.to_string())?;

    let slots = slot_engine::find_free_slots(&busy, &range, None);
    let dtos: Vec<FreeSlotDto> = slots.iter().map(FreeSlotDto::from).collect();

    serde_json::to_string(&dtos).map_err(|e| format!("Serialization error: {}", e))
}

/// Schedule a meeting from a JSON `MeetingRequest`.
///
/// Returns `{"status":"scheduled","start":..,"end":..}` or
/// `{"status":"no_slot_found"}`. Invalid requests are thrown as strings.
#[wasm_bindgen(js_name = "scheduleMeeting")]
pub fn schedule_meeting(request_json: &str) -> Result<String, JsValue> {
    schedule_json(request_json).map_err(|e| JsValue::from_str(&e))
}

/// Free time for one attendee within `[range_start, range_end)`.
///
/// `busy_json` is a JSON array of `{start, end}` objects. Returns a JSON
/// array of `{start, end, duration_minutes}` objects.
#[wasm_bindgen(js_name = "findFreeSlots")]
pub fn find_free_slots(
    busy_json: &str,
    range_start: &str,
    range_end: &str,
) -> Result<String, JsValue> {
    free_slots_json(busy_json, range_start, range_end).map_err(|e| JsValue::from_str(&e))
}
