//! Compute one attendee's free time from their busy intervals.
//!
//! Busy intervals are merged and clipped to the search range, the gaps between
//! them become free slots, and those slots are finally restricted to the
//! attendee's allowed (working-hour) intervals when any are supplied.

use chrono::Duration;

use crate::interval::{intersect_sorted, normalize, TimeInterval};

/// One attendee's busy intervals as received from a calendar provider:
/// unordered and possibly overlapping.
pub type BusySchedule = Vec<TimeInterval>;

/// Merge overlapping or adjacent busy periods, each widened by `buffer` on
/// both sides, then clip them to `range`.
///
/// Returns a sorted, non-overlapping list. Periods entirely outside the range
/// are discarded.
pub fn busy_periods(
    busy: &[TimeInterval],
    range: &TimeInterval,
    buffer: Duration,
) -> Vec<TimeInterval> {
    let padded: Vec<TimeInterval> = busy.iter().map(|b| b.padded(buffer)).collect();
    normalize(&padded)
        .iter()
        .filter_map(|b| b.clip(range))
        .collect()
}

/// Find free time within `range` given an attendee's busy intervals.
///
/// With `allowed = None` the whole range is the working window and the result
/// together with [`busy_periods`] partitions the range exactly. With
/// `Some(allowed)` every gap is cut down to its overlaps with the allowed
/// intervals, which may split one gap into several pieces.
pub fn find_free_slots(
    busy: &[TimeInterval],
    range: &TimeInterval,
    allowed: Option<&[TimeInterval]>,
) -> Vec<TimeInterval> {
    find_free_slots_with_buffer(busy, range, allowed, Duration::zero())
}

/// Like [`find_free_slots`], but keeps at least `buffer` of free time between
/// any busy interval and the slots around it.
pub fn find_free_slots_with_buffer(
    busy: &[TimeInterval],
    range: &TimeInterval,
    allowed: Option<&[TimeInterval]>,
    buffer: Duration,
) -> Vec<TimeInterval> {
    let merged = busy_periods(busy, range, buffer);

    let mut gaps = Vec::with_capacity(merged.len() + 1);
    let mut cursor = range.start();

    for period in &merged {
        if cursor < period.start() {
            gaps.push(TimeInterval::spanning(cursor, period.start()));
        }
        cursor = cursor.max(period.end());
    }

    // Trailing free slot after the last busy period.
    if cursor < range.end() {
        gaps.push(TimeInterval::spanning(cursor, range.end()));
    }

    match allowed {
        Some(allowed) => intersect_sorted(&gaps, &normalize(allowed), Duration::zero()),
        None => gaps,
    }
}
