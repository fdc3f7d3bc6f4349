//! Pick one concrete meeting slot from the valid start ranges.

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::history::{choose_start, EventCategory, HistoryTable};
use crate::intersect::StartRange;

/// How a flexible request chooses among several qualifying starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Lowest possible start; on a tie, the first range encountered.
    #[default]
    Earliest,
    /// The narrowest start range, beginning at its earliest instant. Keeps
    /// wide stretches of shared free time open. Ties go to the earlier range.
    TightestFit,
    /// The start that best matches when attendees usually meet, scored by a
    /// [`HistoryTable`].
    History,
}

/// The caller's timing preference for a meeting.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotPreference {
    pub preferred_start: DateTime<FixedOffset>,
    pub preferred_end: DateTime<FixedOffset>,
    /// When false the meeting must start exactly at `preferred_start`.
    pub flexible: bool,
    pub policy: SelectionPolicy,
    /// Scores for `SelectionPolicy::History`. The category baseline is used
    /// when absent.
    pub history: Option<HistoryTable>,
    pub category: EventCategory,
}

impl SlotPreference {
    /// A flexible preference for any start in `[start, end]`.
    pub fn within(
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        policy: SelectionPolicy,
    ) -> Self {
        Self {
            preferred_start: start,
            preferred_end: end,
            flexible: true,
            policy,
            history: None,
            category: EventCategory::default(),
        }
    }

    /// A preference for a meeting at exactly `start`.
    pub fn exactly(start: DateTime<FixedOffset>) -> Self {
        Self {
            flexible: false,
            ..Self::within(start, start, SelectionPolicy::default())
        }
    }
}

/// The chosen meeting time. `end - start` is always the requested duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingSlot {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

/// Choose a slot, or `None` when nothing satisfies the preference.
pub fn select_slot(
    ranges: &[StartRange],
    preference: &SlotPreference,
    duration: Duration,
) -> Option<MeetingSlot> {
    if ranges.is_empty() {
        return None;
    }

    let start = if preference.flexible {
        let candidates = ranges
            .iter()
            .filter_map(|r| r.restrict(preference.preferred_start, preference.preferred_end));
        match preference.policy {
            SelectionPolicy::Earliest => candidates.min_by_key(|r| r.earliest)?.earliest,
            SelectionPolicy::TightestFit => {
                candidates.min_by_key(|r| (r.span(), r.earliest))?.earliest
            }
            SelectionPolicy::History => {
                let candidates: Vec<StartRange> = candidates.collect();
                let baseline;
                let table = match &preference.history {
                    Some(table) => table,
                    None => {
                        baseline = HistoryTable::baseline(preference.category);
                        &baseline
                    }
                };
                choose_start(
                    table,
                    &candidates,
                    duration,
                    preference.category,
                    preference.preferred_start,
                )?
            }
        }
    } else {
        let wanted = preference.preferred_start;
        ranges.iter().any(|r| r.contains(wanted)).then_some(wanted)?
    };

    Some(MeetingSlot {
        start,
        end: start + duration,
    })
}
