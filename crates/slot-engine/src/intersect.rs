//! Combine several attendees' free time into the windows where everyone is
//! free at once, and turn those into ranges of valid meeting starts.

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::interval::{intersect_sorted, TimeInterval};

/// A closed range `[earliest, latest]` of instants at which a meeting of the
/// requested duration can begin. `earliest == latest` when the common window is
/// exactly as long as the meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRange {
    pub earliest: DateTime<FixedOffset>,
    pub latest: DateTime<FixedOffset>,
}

impl StartRange {
    pub fn contains(&self, instant: DateTime<FixedOffset>) -> bool {
        self.earliest <= instant && instant <= self.latest
    }

    pub fn span(&self) -> Duration {
        self.latest - self.earliest
    }

    /// The part of this range inside the closed window `[from, to]`.
    pub fn restrict(
        &self,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> Option<StartRange> {
        let earliest = self.earliest.max(from);
        let latest = self.latest.min(to);
        (earliest <= latest).then_some(StartRange { earliest, latest })
    }
}

/// Windows in which every attendee is free for at least `duration`.
///
/// Each inner list must be sorted by start and non-overlapping, which is what
/// [`find_free_slots`](crate::freebusy::find_free_slots) produces. The running
/// result starts as the first attendee's qualifying windows and is swept
/// against each further attendee in turn; it stops as soon as nothing is left.
/// The result does not depend on attendee order.
pub fn common_windows(free_lists: &[Vec<TimeInterval>], duration: Duration) -> Vec<TimeInterval> {
    let Some((first, rest)) = free_lists.split_first() else {
        return Vec::new();
    };

    let mut running: Vec<TimeInterval> = first
        .iter()
        .filter(|w| w.duration() >= duration)
        .copied()
        .collect();

    for (offset, next) in rest.iter().enumerate() {
        if running.is_empty() {
            break;
        }
        running = intersect_sorted(&running, next, duration);
        trace!(attendee = offset + 1, windows = running.len(), "intersected free time");
    }

    running
}

/// Ranges of valid meeting starts: each common window `[s, e)` becomes
/// `[s, e - duration]`.
pub fn valid_start_ranges(free_lists: &[Vec<TimeInterval>], duration: Duration) -> Vec<StartRange> {
    common_windows(free_lists, duration)
        .iter()
        .map(|w| StartRange {
            earliest: w.start(),
            latest: w.end() - duration,
        })
        .collect()
}
