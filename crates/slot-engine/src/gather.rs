//! Concurrent collection of attendee inputs from external collaborators.
//!
//! The engine itself never does I/O. This module fans out one fetch per
//! attendee (busy schedule and constraint table in parallel), each under its
//! own timeout, and fans back in only when every attendee succeeded. A single
//! failure or timeout aborts the whole gather, so the engine is never run on
//! partial data. Nothing is retried here.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join_all;
use thiserror::Error;
use tracing::{debug, warn};

use crate::constraint::WeeklyConstraintTable;
use crate::freebusy::BusySchedule;
use crate::interval::TimeInterval;
use crate::schedule::MeetingRequest;

/// An access token for one attendee's calendar. Never shared between
/// attendees; `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// An attendee together with the credential used to read their calendar.
#[derive(Debug, Clone)]
pub struct AttendeeHandle {
    pub id: String,
    pub credential: Credential,
}

impl AttendeeHandle {
    pub fn new(id: impl Into<String>, credential: Credential) -> Self {
        Self {
            id: id.into(),
            credential,
        }
    }
}

/// Failure reported by a collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatherError {
    #[error("No attendees to gather")]
    NoAttendees,

    #[error("Fetching data for attendee '{attendee}' failed: {source}")]
    Source {
        attendee: String,
        source: SourceError,
    },

    #[error("Fetching data for attendee '{attendee}' timed out after {timeout:?}")]
    Timeout { attendee: String, timeout: Duration },
}

/// Supplies busy intervals from a calendar provider.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn busy_intervals(
        &self,
        attendee: &AttendeeHandle,
        range: &TimeInterval,
    ) -> Result<BusySchedule, SourceError>;
}

/// Supplies stored weekly availability.
#[async_trait]
pub trait ConstraintStore: Send + Sync {
    async fn weekly_constraints(
        &self,
        attendee_id: &str,
    ) -> Result<Option<WeeklyConstraintTable>, SourceError>;
}

/// The inputs fetched for one attendee.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendeeInputs {
    pub attendee: String,
    pub busy: BusySchedule,
    pub constraints: Option<WeeklyConstraintTable>,
}

/// Inputs for every attendee, in the order the attendees were given.
#[derive(Debug, Clone, PartialEq)]
pub struct GatheredInputs {
    pub attendees: Vec<AttendeeInputs>,
}

impl GatheredInputs {
    /// Add every gathered attendee to `base`, which carries the timing
    /// parameters of the meeting.
    pub fn into_request(self, base: MeetingRequest) -> MeetingRequest {
        self.attendees
            .into_iter()
            .fold(base, |req, a| req.with_attendee(a.busy, a.constraints))
    }
}

/// Fetch busy schedules and constraint tables for all `attendees` concurrently.
///
/// # Errors
/// Returns the first `GatherError` to occur; outstanding fetches are dropped.
pub async fn gather_inputs(
    calendar: &dyn CalendarSource,
    store: &dyn ConstraintStore,
    attendees: &[AttendeeHandle],
    range: &TimeInterval,
    timeout: Duration,
) -> Result<GatheredInputs, GatherError> {
    if attendees.is_empty() {
        return Err(GatherError::NoAttendees);
    }

    let fetches = attendees
        .iter()
        .map(|attendee| fetch_attendee(calendar, store, attendee, range, timeout));
    let gathered = try_join_all(fetches).await?;

    debug!(attendees = gathered.len(), "gathered attendee inputs");
    Ok(GatheredInputs {
        attendees: gathered,
    })
}

async fn fetch_attendee(
    calendar: &dyn CalendarSource,
    store: &dyn ConstraintStore,
    attendee: &AttendeeHandle,
    range: &TimeInterval,
    timeout: Duration,
) -> Result<AttendeeInputs, GatherError> {
    let both = async {
        tokio::try_join!(
            calendar.busy_intervals(attendee, range),
            store.weekly_constraints(&attendee.id),
        )
    };

    match tokio::time::timeout(timeout, both).await {
        Ok(Ok((busy, constraints))) => Ok(AttendeeInputs {
            attendee: attendee.id.clone(),
            busy,
            constraints,
        }),
        Ok(Err(source)) => {
            warn!(attendee = %attendee.id, error = %source, "collaborator fetch failed");
            Err(GatherError::Source {
                attendee: attendee.id.clone(),
                source,
            })
        }
        Err(_) => {
            warn!(attendee = %attendee.id, ?timeout, "collaborator fetch timed out");
            Err(GatherError::Timeout {
                attendee: attendee.id.clone(),
                timeout,
            })
        }
    }
}
