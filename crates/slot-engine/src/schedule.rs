//! Validate a meeting request and run the full pipeline: constraint
//! projection, free-slot extraction, intersection and selection.
//!
//! [`schedule_meeting`] is pure and synchronous. Calling it twice with the
//! same request gives the same outcome.

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constraint::{project_availability, WeeklyConstraintTable};
use crate::error::{Result, ScheduleError};
use crate::freebusy::{find_free_slots_with_buffer, BusySchedule};
use crate::history::{EventCategory, HistoryTable};
use crate::intersect::{valid_start_ranges, StartRange};
use crate::interval::TimeInterval;
use crate::select::{select_slot, MeetingSlot, SelectionPolicy, SlotPreference};

/// Everything needed to pick a meeting slot for a group of attendees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingRequest {
    /// One busy schedule per attendee.
    pub attendees: Vec<BusySchedule>,
    /// Either empty, or one entry per attendee in the same order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Option<WeeklyConstraintTable>>,
    pub duration_minutes: i64,
    pub range_start: DateTime<FixedOffset>,
    pub range_end: DateTime<FixedOffset>,
    pub preferred_start: DateTime<FixedOffset>,
    pub preferred_end: DateTime<FixedOffset>,
    pub flexible: bool,
    /// Minimum free time kept around every busy interval.
    #[serde(default)]
    pub buffer_minutes: i64,
    #[serde(default)]
    pub policy: SelectionPolicy,
    /// Per-attendee history tables for `SelectionPolicy::History`. They are
    /// summed; with none given the category baseline is used.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryTable>,
    #[serde(default)]
    pub category: EventCategory,
}

impl MeetingRequest {
    /// A flexible request over `range` with no attendees yet. The preferred
    /// window defaults to the whole range.
    pub fn new(duration_minutes: i64, range: &TimeInterval) -> Self {
        Self {
            attendees: Vec::new(),
            constraints: Vec::new(),
            duration_minutes,
            range_start: range.start(),
            range_end: range.end(),
            preferred_start: range.start(),
            preferred_end: range.end(),
            flexible: true,
            buffer_minutes: 0,
            policy: SelectionPolicy::default(),
            history: Vec::new(),
            category: EventCategory::default(),
        }
    }

    /// Add an attendee, keeping the constraint list aligned with attendees.
    pub fn with_attendee(
        mut self,
        busy: BusySchedule,
        constraints: Option<WeeklyConstraintTable>,
    ) -> Self {
        if constraints.is_some() || !self.constraints.is_empty() {
            self.constraints.resize(self.attendees.len(), None);
            self.constraints.push(constraints);
        }
        self.attendees.push(busy);
        self
    }

    pub fn with_preferred(
        mut self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        flexible: bool,
    ) -> Self {
        self.preferred_start = start;
        self.preferred_end = end;
        self.flexible = flexible;
        self
    }

    /// Ask for a meeting at exactly `start`.
    pub fn at(self, start: DateTime<FixedOffset>) -> Self {
        self.with_preferred(start, start, false)
    }

    pub fn with_buffer_minutes(mut self, minutes: i64) -> Self {
        self.buffer_minutes = minutes;
        self
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Choose by history: `tables` are summed, `category` picks the baseline
    /// and the work clustering bias.
    pub fn with_history(mut self, category: EventCategory, tables: Vec<HistoryTable>) -> Self {
        self.policy = SelectionPolicy::History;
        self.category = category;
        self.history = tables;
        self
    }

    /// Check the request without scheduling anything.
    ///
    /// # Errors
    /// Returns the first validation failure found.
    pub fn validate(&self) -> Result<()> {
        validate(self).map(|_| ())
    }
}

/// Result of a scheduling attempt that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScheduleOutcome {
    Scheduled(MeetingSlot),
    /// Every stage ran, but no time suits all attendees.
    NoSlotFound,
}

impl ScheduleOutcome {
    pub fn slot(&self) -> Option<&MeetingSlot> {
        match self {
            ScheduleOutcome::Scheduled(slot) => Some(slot),
            ScheduleOutcome::NoSlotFound => None,
        }
    }
}

/// Validated, typed view of a request.
struct Plan {
    range: TimeInterval,
    duration: Duration,
    buffer: Duration,
    preference: SlotPreference,
}

fn validate(request: &MeetingRequest) -> Result<Plan> {
    if request.attendees.is_empty() {
        return Err(ScheduleError::NoAttendees);
    }
    if !request.constraints.is_empty() && request.constraints.len() != request.attendees.len() {
        return Err(ScheduleError::ConstraintCountMismatch {
            attendees: request.attendees.len(),
            tables: request.constraints.len(),
        });
    }

    let duration = Duration::try_minutes(request.duration_minutes)
        .filter(|d| *d > Duration::zero())
        .ok_or(ScheduleError::InvalidDuration(request.duration_minutes))?;
    let buffer = Duration::try_minutes(request.buffer_minutes)
        .filter(|b| *b >= Duration::zero())
        .ok_or(ScheduleError::InvalidBuffer(request.buffer_minutes))?;

    let range = TimeInterval::new(request.range_start, request.range_end).map_err(|_| {
        ScheduleError::InvalidRange {
            start: request.range_start,
            end: request.range_end,
        }
    })?;

    if request.preferred_start > request.preferred_end {
        return Err(ScheduleError::InvalidPreferredWindow {
            start: request.preferred_start,
            end: request.preferred_end,
        });
    }

    Ok(Plan {
        range,
        duration,
        buffer,
        preference: SlotPreference {
            preferred_start: request.preferred_start,
            preferred_end: request.preferred_end,
            flexible: request.flexible,
            policy: request.policy,
            history: HistoryTable::total(&request.history),
            category: request.category,
        },
    })
}

fn attendee_free_slots(request: &MeetingRequest, plan: &Plan) -> Vec<Vec<TimeInterval>> {
    request
        .attendees
        .iter()
        .enumerate()
        .map(|(index, busy)| {
            let allowed = request
                .constraints
                .get(index)
                .and_then(Option::as_ref)
                .map(|table| project_availability(table, &plan.range).allowed());
            let free = find_free_slots_with_buffer(busy, &plan.range, allowed.as_deref(), plan.buffer);
            debug!(
                attendee = index,
                busy = busy.len(),
                free = free.len(),
                constrained = allowed.is_some(),
                "extracted free time"
            );
            free
        })
        .collect()
}

/// Each attendee's free time over the request's range, after constraints and
/// buffers are applied.
///
/// # Errors
/// Returns a `ScheduleError` if the request fails validation.
pub fn free_slots_for(request: &MeetingRequest) -> Result<Vec<Vec<TimeInterval>>> {
    let plan = validate(request)?;
    Ok(attendee_free_slots(request, &plan))
}

/// Every range of instants at which the requested meeting could start.
///
/// # Errors
/// Returns a `ScheduleError` if the request fails validation.
pub fn start_ranges_for(request: &MeetingRequest) -> Result<Vec<StartRange>> {
    Ok(availability_for(request)?.start_ranges)
}

/// Per-attendee free time and the common start ranges from one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Availability {
    pub attendees: Vec<Vec<TimeInterval>>,
    pub start_ranges: Vec<StartRange>,
}

/// Validate once, then report both [`free_slots_for`] and
/// [`start_ranges_for`].
///
/// # Errors
/// Returns a `ScheduleError` if the request fails validation.
pub fn availability_for(request: &MeetingRequest) -> Result<Availability> {
    let plan = validate(request)?;
    let attendees = attendee_free_slots(request, &plan);
    let start_ranges = valid_start_ranges(&attendees, plan.duration);
    Ok(Availability {
        attendees,
        start_ranges,
    })
}

/// Pick a meeting slot for every attendee in `request`.
///
/// # Errors
/// Returns a `ScheduleError` for malformed input. Finding no common time is
/// not an error: it yields `Ok(ScheduleOutcome::NoSlotFound)`.
pub fn schedule_meeting(request: &MeetingRequest) -> Result<ScheduleOutcome> {
    let plan = validate(request)?;
    let free = attendee_free_slots(request, &plan);
    let ranges = valid_start_ranges(&free, plan.duration);
    debug!(
        attendees = request.attendees.len(),
        start_ranges = ranges.len(),
        duration_minutes = request.duration_minutes,
        "computed common start ranges"
    );

    let outcome = match select_slot(&ranges, &plan.preference, plan.duration) {
        Some(slot) => ScheduleOutcome::Scheduled(slot),
        None => ScheduleOutcome::NoSlotFound,
    };
    debug!(?outcome, "scheduling finished");
    Ok(outcome)
}
