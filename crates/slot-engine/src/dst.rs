//! DST transition policies for projecting wall-clock availability.

use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Upper bound on how far a nonexistent local time is shifted. Covers every
/// real transition, including whole skipped days.
const MAX_GAP_MINUTES: i64 = 25 * 60;

/// Policy for wall-clock boundaries that fall in a DST gap
/// (e.g. 02:30 during spring forward). Ambiguous times (fall back) always
/// resolve to the earlier instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Drop the window for that day.
    Skip,
    /// Shift to the first valid time after the gap.
    #[default]
    ShiftForward,
}

/// Resolve a local wall-clock time in `zone` to an absolute instant.
///
/// Returns `None` only when the time is in a gap and the policy is `Skip`.
pub(crate) fn resolve_local<Z: TimeZone>(
    zone: &Z,
    local: NaiveDateTime,
    policy: DstPolicy,
) -> Option<DateTime<FixedOffset>> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt.fixed_offset()),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.fixed_offset()),
        LocalResult::None => match policy {
            DstPolicy::Skip => None,
            DstPolicy::ShiftForward => first_valid_after(zone, local),
        },
    }
}

fn first_valid_after<Z: TimeZone>(zone: &Z, local: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    (1..=MAX_GAP_MINUTES).find_map(|minutes| {
        let candidate = local.checked_add_signed(Duration::minutes(minutes))?;
        zone.from_local_datetime(&candidate)
            .earliest()
            .map(|dt| dt.fixed_offset())
    })
}
